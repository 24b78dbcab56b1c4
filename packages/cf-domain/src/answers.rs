//! The questionnaire answers that narrow a course search.
//!
//! Only six keys are recognized. Anything else in the incoming object is dropped by the
//! deserializer, so callers never see it.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answers {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<AnswerValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub discipline: Option<AnswerValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub degree: Option<AnswerValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub study_level: Option<AnswerValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duration: Option<AnswerValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub budget: Option<AnswerValue>,
}
impl Answers {
	/// Categorical answers in filter order, paired with the metadata field they constrain.
	pub fn categorical(&self) -> [(&'static str, Option<&AnswerValue>); 5] {
		[
			("country", self.country.as_ref()),
			("discipline", self.discipline.as_ref()),
			("degree", self.degree.as_ref()),
			("study_level", self.study_level.as_ref()),
			("duration", self.duration.as_ref()),
		]
	}
}

/// A single answer as sent by the client. Forms post strings, but any JSON value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
	Text(String),
	Number(Number),
	Flag(bool),
	/// Arrays and objects. Kept as sent so one odd answer never fails the whole request.
	Structured(Value),
}
impl AnswerValue {
	/// Empty text, zero, `false` and empty arrays or objects count as unanswered.
	pub fn is_present(&self) -> bool {
		match self {
			Self::Text(text) => !text.is_empty(),
			Self::Number(number) => number.as_f64().map(|value| value != 0.0).unwrap_or(true),
			Self::Flag(flag) => *flag,
			Self::Structured(Value::Array(items)) => !items.is_empty(),
			Self::Structured(Value::Object(fields)) => !fields.is_empty(),
			Self::Structured(Value::Null) => false,
			Self::Structured(_) => true,
		}
	}

	/// Lenient numeric reading used for the budget ceiling.
	///
	/// Text is trimmed and may group digits with single underscores (`"15_000"`). Booleans read
	/// as `1.0` and `0.0`. Other text, arrays, objects and non-finite values yield `None`.
	pub fn as_number(&self) -> Option<f64> {
		let value = match self {
			Self::Text(text) => parse_decimal(text.trim())?,
			Self::Number(number) => number.as_f64()?,
			Self::Flag(flag) => f64::from(u8::from(*flag)),
			Self::Structured(_) => return None,
		};

		value.is_finite().then_some(value)
	}
}
impl From<&str> for AnswerValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

/// Underscores are only accepted between two ASCII digits.
fn parse_decimal(text: &str) -> Option<f64> {
	if !text.contains('_') {
		return text.parse().ok();
	}

	let bytes = text.as_bytes();
	let grouped = bytes.iter().enumerate().all(|(i, byte)| {
		*byte != b'_'
			|| (i > 0
				&& bytes[i - 1].is_ascii_digit()
				&& bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
	});

	if !grouped {
		return None;
	}

	text.replace('_', "").parse().ok()
}
