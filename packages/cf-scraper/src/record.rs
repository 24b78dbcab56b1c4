use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNDERGRADUATE_MARKERS: [&str; 5] =
	["bachelor", "diploma", "certificate", "foundation", "associate"];

/// A course as returned by the upstream search API. Every field is optional and loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourseListing {
	pub institute_name: Option<Value>,
	pub course_id: Option<Value>,
	pub name: Option<Value>,
	pub discipline_name: Option<Value>,
	pub specialization_name: Option<Value>,
	pub degreelevel_name: Option<Value>,
	pub degreelevel_type: Option<Value>,
	pub coursetitle_name: Option<Value>,
	pub course_language: Option<Value>,
	pub duration: Option<Value>,
	pub course_fee: Option<Value>,
	pub currency: Option<Value>,
	pub rating: Option<Value>,
	pub course_slug: Option<Value>,
	pub institute_slug: Option<Value>,
}
impl CourseListing {
	/// `degreelevel_type` when the API provides it, otherwise inferred from the degree name.
	pub fn study_level(&self) -> String {
		if let Some(kind) = self.degreelevel_type.as_ref().and_then(Value::as_str)
			&& !kind.is_empty()
		{
			return capitalize(kind);
		}

		let degree = self
			.degreelevel_name
			.as_ref()
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_lowercase();

		if UNDERGRADUATE_MARKERS.iter().any(|marker| degree.contains(marker)) {
			"Undergraduate".to_string()
		} else {
			"Postgraduate".to_string()
		}
	}
}

/// One row of the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
	pub input_uni: String,
	pub institute_name: String,
	pub course_id: String,
	pub course_title: String,
	pub discipline: String,
	pub specialization: String,
	pub degree: String,
	pub study_level: String,
	pub course_title_short: String,
	pub language: String,
	pub duration: String,
	pub course_fee: String,
	pub currency: String,
	pub rating: String,
	pub course_slug: String,
	pub institute_slug: String,
}
impl CourseRecord {
	pub const HEADERS: [&'static str; 16] = [
		"input_uni",
		"institute_name",
		"course_id",
		"course_title",
		"discipline",
		"specialization",
		"degree",
		"study_level",
		"course_title_short",
		"language",
		"duration",
		"course_fee",
		"currency",
		"rating",
		"course_slug",
		"institute_slug",
	];

	pub fn from_listing(input_uni: &str, listing: &CourseListing) -> Self {
		Self {
			input_uni: input_uni.to_string(),
			institute_name: cell(&listing.institute_name),
			course_id: cell(&listing.course_id),
			course_title: cell(&listing.name),
			discipline: cell(&listing.discipline_name),
			specialization: cell(&listing.specialization_name),
			degree: cell(&listing.degreelevel_name),
			study_level: listing.study_level(),
			course_title_short: cell(&listing.coursetitle_name),
			language: cell(&listing.course_language),
			duration: cell(&listing.duration),
			course_fee: cell(&listing.course_fee),
			currency: cell(&listing.currency),
			rating: cell(&listing.rating),
			course_slug: cell(&listing.course_slug),
			institute_slug: cell(&listing.institute_slug),
		}
	}
}

fn cell(value: &Option<Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(text)) => text.clone(),
		Some(other) => other.to_string(),
	}
}

fn capitalize(text: &str) -> String {
	let mut chars = text.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new(),
	}
}
