pub mod pinecone;
pub mod qdrant;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use serde_json::{Map, Value};

use cf_domain::filter::FilterExpression;

/// One nearest-neighbor lookup. `filter: None` issues the query with no metadata constraint.
#[derive(Debug, Clone, Copy)]
pub struct IndexQuery<'a> {
	pub vector: &'a [f32],
	pub top_k: u32,
	pub filter: Option<&'a FilterExpression>,
	pub include_metadata: bool,
}

/// A scored vector as returned by the index, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
	pub id: String,
	pub score: f32,
	pub metadata: Map<String, Value>,
}
