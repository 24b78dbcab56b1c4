use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	/// Falls back to `OPENAI_API_KEY` when left empty.
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub index: VectorIndex,
}

#[derive(Debug, Deserialize)]
pub struct VectorIndex {
	/// One of "pinecone" or "qdrant".
	pub backend: String,
	/// Pinecone index host or Qdrant endpoint.
	pub url: String,
	/// Falls back to `PINECONE_API_KEY` when left empty. Optional for Qdrant.
	#[serde(default)]
	pub api_key: String,
	/// Pinecone index name or Qdrant collection.
	pub collection: String,
	/// Pinecone namespace. The default namespace is used when unset.
	pub namespace: Option<String>,
	/// Named Qdrant vector. The unnamed default vector is used when unset.
	pub vector_name: Option<String>,
	#[serde(default = "default_index_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_max_top_k")]
	pub max_top_k: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: default_top_k(), max_top_k: default_max_top_k() }
	}
}

#[derive(Debug, Deserialize)]
pub struct ScraperConfig {
	pub scraper: Scraper,
	#[serde(default)]
	pub targets: Vec<ScrapeTarget>,
}

#[derive(Debug, Deserialize)]
pub struct Scraper {
	pub base_url: String,
	#[serde(default = "default_user_agent")]
	pub user_agent: String,
	#[serde(default = "default_scraper_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_page_delay_ms")]
	pub page_delay_ms: u64,
	#[serde(default = "default_output")]
	pub output: PathBuf,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeTarget {
	/// Display name written to the `input_uni` column.
	pub name: String,
	/// Institute slug understood by the upstream API.
	pub slug: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_index_timeout_ms() -> u64 {
	10_000
}

fn default_top_k() -> u32 {
	40
}

fn default_max_top_k() -> u32 {
	10_000
}

fn default_user_agent() -> String {
	"Mozilla/5.0".to_string()
}

fn default_scraper_timeout_ms() -> u64 {
	20_000
}

fn default_page_delay_ms() -> u64 {
	100
}

fn default_output() -> PathBuf {
	PathBuf::from("courses_scraped.csv")
}
