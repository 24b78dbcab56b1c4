pub mod search;

mod error;

pub use error::{Error, Result};
pub use search::{CourseMatch, SearchPhase, SearchRequest, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use cf_config::Config;
use cf_providers::embedding::EmbeddingClient;
use cf_storage::{IndexHit, IndexQuery, pinecone::PineconeIndex, qdrant::QdrantIndex};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn query<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}

/// Process-wide clients, built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub index: Arc<dyn VectorIndex>,
}

pub struct CourseSearchService {
	pub cfg: Config,
	pub providers: Providers,
}

impl EmbeddingProvider for EmbeddingClient {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(EmbeddingClient::embed(self, texts).await?) })
	}
}

impl VectorIndex for PineconeIndex {
	fn query<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move { Ok(PineconeIndex::query(self, &query).await?) })
	}
}

impl VectorIndex for QdrantIndex {
	fn query<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move { Ok(QdrantIndex::query(self, &query).await?) })
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
		Self { embedding, index }
	}

	/// Builds the embedding client and the configured index backend.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let embedding = EmbeddingClient::new(&cfg.providers.embedding)
			.map_err(|err| Error::Startup { message: err.to_string() })?;
		let index_cfg = &cfg.storage.index;
		let index: Arc<dyn VectorIndex> = match index_cfg.backend.as_str() {
			"pinecone" => Arc::new(
				PineconeIndex::new(index_cfg)
					.map_err(|err| Error::Startup { message: err.to_string() })?,
			),
			"qdrant" => Arc::new(
				QdrantIndex::new(index_cfg)
					.map_err(|err| Error::Startup { message: err.to_string() })?,
			),
			other => {
				return Err(Error::Startup {
					message: format!("Unsupported vector index backend {other}."),
				});
			},
		};

		tracing::info!(
			model = %embedding.model(),
			backend = %index_cfg.backend,
			collection = %index_cfg.collection,
			"Search providers ready."
		);

		Ok(Self { embedding: Arc::new(embedding), index })
	}
}

impl CourseSearchService {
	pub fn new(cfg: Config) -> Result<Self> {
		let providers = Providers::from_config(&cfg)?;

		Ok(Self { cfg, providers })
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}
