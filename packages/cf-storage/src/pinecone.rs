use std::time::Duration;

use reqwest::{
	Client,
	header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, IndexHit, IndexQuery, Result};

pub const API_VERSION: &str = "2025-01";

const API_KEY_HEADER: &str = "api-key";
const API_VERSION_HEADER: &str = "x-pinecone-api-version";

/// Data-plane client for one Pinecone index.
pub struct PineconeIndex {
	http: Client,
	query_url: String,
	headers: HeaderMap,
	namespace: Option<String>,
	pub name: String,
}
impl PineconeIndex {
	pub fn new(cfg: &cf_config::VectorIndex) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let mut headers = HeaderMap::new();

		headers.insert(
			HeaderName::from_static(API_KEY_HEADER),
			HeaderValue::from_str(cfg.api_key.trim())?,
		);
		headers.insert(
			HeaderName::from_static(API_VERSION_HEADER),
			HeaderValue::from_static(API_VERSION),
		);
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(Self {
			http,
			query_url: format!("{}/query", host_url(&cfg.url)),
			headers,
			namespace: cfg.namespace.clone(),
			name: cfg.collection.clone(),
		})
	}

	pub async fn query(&self, query: &IndexQuery<'_>) -> Result<Vec<IndexHit>> {
		let body = QueryBody {
			vector: query.vector,
			top_k: query.top_k,
			include_metadata: query.include_metadata,
			include_values: false,
			namespace: self.namespace.as_deref(),
			filter: query.filter.filter(|filter| !filter.is_empty()).map(|filter| filter.to_value()),
		};
		let res =
			self.http.post(&self.query_url).headers(self.headers.clone()).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status, body });
		}

		let response: QueryResponse = res.json().await?;

		tracing::debug!(index = %self.name, hits = response.matches.len(), "Pinecone query done.");

		Ok(response
			.matches
			.into_iter()
			.map(|hit| IndexHit {
				id: hit.id,
				score: hit.score,
				metadata: hit.metadata.unwrap_or_default(),
			})
			.collect())
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
	vector: &'a [f32],
	top_k: u32,
	include_metadata: bool,
	include_values: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	namespace: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
	#[serde(default)]
	matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
	id: String,
	#[serde(default)]
	score: f32,
	#[serde(default)]
	metadata: Option<Map<String, Value>>,
}

/// Index hosts are shown without a scheme in the Pinecone console.
fn host_url(raw: &str) -> String {
	let trimmed = raw.trim().trim_end_matches('/');

	if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
		trimmed.to_string()
	} else {
		format!("https://{trimmed}")
	}
}
