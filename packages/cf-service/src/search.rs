use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cf_domain::{answers::Answers, filter::FilterExpression};
use cf_storage::{IndexHit, IndexQuery};

use crate::{CourseSearchService, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub answers: Answers,
	#[serde(default)]
	pub top_k: Option<u32>,
}

/// One ranked course: the index identity and score with the stored metadata merged over them.
///
/// `id` and `score` stay JSON values because a metadata entry of the same name replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMatch {
	pub id: Value,
	pub score: Value,
	#[serde(flatten)]
	pub metadata: Map<String, Value>,
}
impl From<IndexHit> for CourseMatch {
	fn from(hit: IndexHit) -> Self {
		let IndexHit { id, score, mut metadata } = hit;
		let id = metadata.remove("id").unwrap_or(Value::String(id));
		let score = metadata.remove("score").unwrap_or_else(|| Value::from(score));

		Self { id, score, metadata }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub matches: Vec<CourseMatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
	Filtered,
	Unfiltered,
}
impl SearchPhase {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Filtered => "filtered",
			Self::Unfiltered => "unfiltered",
		}
	}
}

impl CourseSearchService {
	/// Embeds the query, runs the filtered lookup and, only when it comes back empty, repeats
	/// the lookup once with no filter at all. The response holds exactly one phase's matches.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let top_k = self.validate(&req)?;

		tracing::info!(query = %req.query, top_k, "Received search query.");
		tracing::info!(answers = ?req.answers, "Received search answers.");

		let vector = self.embed_query(&req.query).await?;
		let filter = FilterExpression::from_answers(&req.answers);

		tracing::info!(filter = %filter.to_value(), "Sending filtered query.");

		let hits = self.run_query(&vector, top_k, Some(&filter), SearchPhase::Filtered).await?;

		if !hits.is_empty() {
			return Ok(shape_response(hits, SearchPhase::Filtered));
		}

		tracing::warn!(
			clauses = filter.len(),
			"No matches with filters. Retrying without filters."
		);

		let hits = self.run_query(&vector, top_k, None, SearchPhase::Unfiltered).await?;

		Ok(shape_response(hits, SearchPhase::Unfiltered))
	}

	fn validate(&self, req: &SearchRequest) -> Result<u32> {
		let top_k = req.top_k.unwrap_or(self.cfg.search.default_top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}
		if top_k > self.cfg.search.max_top_k {
			return Err(Error::InvalidRequest {
				message: format!("top_k must be at most {}.", self.cfg.search.max_top_k),
			});
		}

		Ok(top_k)
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let texts = [query.to_string()];
		let mut vectors = self.providers.embedding.embed(&texts).await?;
		let Some(vector) = vectors.pop() else {
			return Err(Error::Embedding {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.is_empty() {
			return Err(Error::Embedding {
				message: "Embedding provider returned an empty vector.".to_string(),
			});
		}

		Ok(vector)
	}

	async fn run_query(
		&self,
		vector: &[f32],
		top_k: u32,
		filter: Option<&FilterExpression>,
		phase: SearchPhase,
	) -> Result<Vec<IndexHit>> {
		let query = IndexQuery { vector, top_k, filter, include_metadata: true };
		let hits = self.providers.index.query(query).await?;

		tracing::info!(phase = phase.as_str(), raw_matches = hits.len(), "Index query done.");

		Ok(hits)
	}
}

fn shape_response(hits: Vec<IndexHit>, phase: SearchPhase) -> SearchResponse {
	let matches: Vec<CourseMatch> = hits.into_iter().map(CourseMatch::from).collect();

	tracing::info!(phase = phase.as_str(), matches = matches.len(), "Matches after parsing.");

	SearchResponse { matches }
}
