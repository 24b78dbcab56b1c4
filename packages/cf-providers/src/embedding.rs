use std::time::Duration;

use reqwest::{Client, header::HeaderMap};
use serde_json::Value;

use crate::{Error, Result};

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// Built once at startup; the inner connection pool is shared by every request.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
	http: Client,
	url: String,
	headers: HeaderMap,
	model: String,
	dimensions: u32,
}
impl EmbeddingClient {
	pub fn new(cfg: &cf_config::EmbeddingProviderConfig) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			http,
			url: format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path),
			headers: crate::auth_headers(&cfg.api_key, &cfg.default_headers)?,
			model: cfg.model.clone(),
			dimensions: cfg.dimensions,
		})
	}

	pub fn model(&self) -> &str {
		&self.model
	}

	pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let body = serde_json::json!({
			"model": self.model,
			"input": texts,
			"dimensions": self.dimensions,
		});
		let res = self.http.post(&self.url).headers(self.headers.clone()).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status, body });
		}

		let json: Value = res.json().await?;
		let vectors = parse_embedding_response(json)?;

		if vectors.len() != texts.len() {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding response has {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}
		if let Some(vector) = vectors.iter().find(|vec| vec.len() != self.dimensions as usize) {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding vector has {} dimensions, expected {}.",
					vector.len(),
					self.dimensions
				),
			});
		}

		tracing::debug!(model = %self.model, count = vectors.len(), "Embeddings generated.");

		Ok(vectors)
	}
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse {
				message: "Embedding item missing embedding array.".to_string(),
			}
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
