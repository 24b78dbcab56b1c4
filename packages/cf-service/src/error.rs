pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Query error: {message}")]
	Query { message: String },
	#[error("Startup error: {message}")]
	Startup { message: String },
}
impl From<cf_providers::Error> for Error {
	fn from(err: cf_providers::Error) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}

impl From<cf_storage::Error> for Error {
	fn from(err: cf_storage::Error) -> Self {
		Self::Query { message: err.to_string() }
	}
}
