use serde_json::{Map, Number, Value};

use crate::answers::{AnswerValue, Answers};

pub const COURSE_FEE_FIELD: &str = "course_fee";

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	Text(String),
	Number(Number),
	Flag(bool),
	/// An array or object answer, compared as sent.
	Structured(Value),
}
impl FilterValue {
	pub fn to_value(&self) -> Value {
		match self {
			Self::Text(text) => Value::String(text.clone()),
			Self::Number(number) => Value::Number(number.clone()),
			Self::Flag(flag) => Value::Bool(*flag),
			Self::Structured(value) => value.clone(),
		}
	}
}
impl From<&AnswerValue> for FilterValue {
	fn from(value: &AnswerValue) -> Self {
		match value {
			AnswerValue::Text(text) => Self::Text(text.clone()),
			AnswerValue::Number(number) => Self::Number(number.clone()),
			AnswerValue::Flag(flag) => Self::Flag(*flag),
			AnswerValue::Structured(value) => Self::Structured(value.clone()),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Equals(FilterValue),
	LessThan(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
	pub field: &'static str,
	pub predicate: Predicate,
}

/// Metadata constraints for one nearest-neighbor query. Clauses are conjunctive and each field
/// appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
	clauses: Vec<FilterClause>,
}
impl FilterExpression {
	pub fn from_answers(answers: &Answers) -> Self {
		let mut clauses = Vec::new();

		for (field, answer) in answers.categorical() {
			let Some(answer) = answer.filter(|answer| answer.is_present()) else {
				continue;
			};

			clauses.push(FilterClause { field, predicate: Predicate::Equals(answer.into()) });
		}

		if let Some(ceiling) = answers
			.budget
			.as_ref()
			.filter(|budget| budget.is_present())
			.and_then(AnswerValue::as_number)
		{
			clauses.push(FilterClause {
				field: COURSE_FEE_FIELD,
				predicate: Predicate::LessThan(ceiling),
			});
		}

		Self { clauses }
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn len(&self) -> usize {
		self.clauses.len()
	}

	pub fn clauses(&self) -> &[FilterClause] {
		&self.clauses
	}

	pub fn get(&self, field: &str) -> Option<&Predicate> {
		self.clauses.iter().find(|clause| clause.field == field).map(|clause| &clause.predicate)
	}

	/// Renders the expression with `$eq` / `$lt` operators, e.g.
	/// `{"country": {"$eq": "UK"}, "course_fee": {"$lt": 15000.0}}`.
	pub fn to_value(&self) -> Value {
		let mut out = Map::new();

		for clause in &self.clauses {
			let op = match &clause.predicate {
				Predicate::Equals(value) => serde_json::json!({ "$eq": value.to_value() }),
				Predicate::LessThan(ceiling) => serde_json::json!({ "$lt": ceiling }),
			};

			out.insert(clause.field.to_string(), op);
		}

		Value::Object(out)
	}
}
