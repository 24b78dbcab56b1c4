use std::time::Duration;

use qdrant_client::qdrant::{
	Condition, Filter, PointId, Query, QueryPointsBuilder, Range, ScoredPoint,
	Value as PayloadValue, point_id::PointIdOptions, value::Kind,
};
use serde_json::{Map, Number, Value};

use cf_domain::filter::{FilterClause, FilterExpression, FilterValue, Predicate};

use crate::{IndexHit, IndexQuery, Result};

pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_name: Option<String>,
}
impl QdrantIndex {
	pub fn new(cfg: &cf_config::VectorIndex) -> Result<Self> {
		let mut builder =
			qdrant_client::Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms));

		if !cfg.api_key.trim().is_empty() {
			builder = builder.api_key(cfg.api_key.trim().to_string());
		}

		let client = builder.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_name: cfg.vector_name.clone() })
	}

	pub async fn query(&self, query: &IndexQuery<'_>) -> Result<Vec<IndexHit>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(query.vector.to_vec()))
			.limit(query.top_k as u64)
			.with_payload(query.include_metadata);

		if let Some(name) = self.vector_name.as_ref() {
			search = search.using(name.clone());
		}
		if let Some(filter) = query.filter.filter(|filter| !filter.is_empty()) {
			search = search.filter(to_qdrant_filter(filter));
		}

		let response = self.client.query(search).await?;

		tracing::debug!(
			collection = %self.collection,
			hits = response.result.len(),
			"Qdrant query done."
		);

		Ok(response.result.into_iter().map(scored_point_to_hit).collect())
	}
}

pub fn to_qdrant_filter(filter: &FilterExpression) -> Filter {
	Filter::must(filter.clauses().iter().map(clause_condition))
}

fn clause_condition(clause: &FilterClause) -> Condition {
	let field = clause.field;

	match &clause.predicate {
		Predicate::Equals(FilterValue::Text(text)) => Condition::matches(field, text.clone()),
		Predicate::Equals(FilterValue::Flag(flag)) => Condition::matches(field, *flag),
		Predicate::Equals(FilterValue::Number(number)) =>
			if let Some(int) = number.as_i64() {
				Condition::matches(field, int)
			} else if let Some(value) = number.as_f64() {
				Condition::range(field, Range { gte: Some(value), lte: Some(value), ..Default::default() })
			} else {
				Condition::matches(field, number.to_string())
			},
		Predicate::Equals(FilterValue::Structured(value)) => structured_condition(field, value),
		Predicate::LessThan(ceiling) =>
			Condition::range(field, Range { lt: Some(*ceiling), ..Default::default() }),
	}
}

/// A list of strings matches any of its entries. Other shapes match their JSON text, which
/// keyword payloads never equal.
fn structured_condition(field: &str, value: &Value) -> Condition {
	let keywords: Option<Vec<String>> = value
		.as_array()
		.and_then(|items| items.iter().map(|item| item.as_str().map(str::to_string)).collect());

	match keywords {
		Some(keywords) => Condition::matches(field, keywords),
		None => Condition::matches(field, value.to_string()),
	}
}

fn scored_point_to_hit(point: ScoredPoint) -> IndexHit {
	let id = point.id.as_ref().map(point_id_to_string).unwrap_or_default();
	let metadata = point
		.payload
		.into_iter()
		.map(|(key, value)| (key, payload_value_to_json(value)))
		.collect::<Map<String, Value>>();

	IndexHit { id, score: point.score, metadata }
}

fn point_id_to_string(point_id: &PointId) -> String {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(num)) => num.to_string(),
		Some(PointIdOptions::Uuid(id)) => id.clone(),
		None => String::new(),
	}
}

fn payload_value_to_json(value: PayloadValue) -> Value {
	match value.kind {
		None | Some(Kind::NullValue(_)) => Value::Null,
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::IntegerValue(int)) => Value::from(int),
		Some(Kind::DoubleValue(double)) =>
			Number::from_f64(double).map(Value::Number).unwrap_or(Value::Null),
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.into_iter().map(payload_value_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(
			object.fields.into_iter().map(|(key, value)| (key, payload_value_to_json(value))).collect(),
		),
	}
}
