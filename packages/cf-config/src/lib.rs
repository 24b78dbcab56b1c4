mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Providers, ScrapeTarget, Scraper, ScraperConfig, Search,
	Service, Storage, VectorIndex,
};

use std::{collections::HashSet, env, fs, path::Path};

use serde::de::DeserializeOwned;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const INDEX_BACKENDS: [&str; 2] = ["pinecone", "qdrant"];

pub fn load(path: &Path) -> Result<Config> {
	let mut cfg: Config = read_toml(path)?;

	normalize(&mut cfg, |name| env::var(name).ok());

	validate(&cfg)?;

	Ok(cfg)
}

pub fn load_scraper(path: &Path) -> Result<ScraperConfig> {
	let cfg: ScraperConfig = read_toml(path)?;

	validate_scraper(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;

	if embedding.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_base must be non-empty.".to_string(),
		});
	}
	if embedding.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.model must be non-empty.".to_string(),
		});
	}
	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if embedding.api_key.trim().is_empty() {
		return Err(Error::MissingSecret {
			key: "providers.embedding.api_key",
			env_var: OPENAI_API_KEY_ENV,
		});
	}

	for (key, value) in &embedding.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.embedding.default_headers.{key} must be a string."),
			});
		}
	}

	let index = &cfg.storage.index;

	if !INDEX_BACKENDS.contains(&index.backend.as_str()) {
		return Err(Error::Validation {
			message: "storage.index.backend must be one of pinecone or qdrant.".to_string(),
		});
	}
	if index.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.index.url must be non-empty.".to_string(),
		});
	}
	if index.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.index.collection must be non-empty.".to_string(),
		});
	}
	if index.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.index.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if index.backend == "pinecone" && index.api_key.trim().is_empty() {
		return Err(Error::MissingSecret {
			key: "storage.index.api_key",
			env_var: PINECONE_API_KEY_ENV,
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_top_k > cfg.search.max_top_k {
		return Err(Error::Validation {
			message: "search.default_top_k must not exceed search.max_top_k.".to_string(),
		});
	}

	Ok(())
}

pub fn validate_scraper(cfg: &ScraperConfig) -> Result<()> {
	if cfg.scraper.base_url.trim().is_empty() {
		return Err(Error::Validation {
			message: "scraper.base_url must be non-empty.".to_string(),
		});
	}
	if cfg.scraper.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "scraper.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.targets.is_empty() {
		return Err(Error::Validation {
			message: "At least one [[targets]] entry is required.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for target in &cfg.targets {
		if target.name.trim().is_empty() {
			return Err(Error::Validation {
				message: "targets.name must be non-empty.".to_string(),
			});
		}
		if target.slug.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("targets.slug must be non-empty for {}.", target.name),
			});
		}
		if !seen.insert(target.slug.as_str()) {
			return Err(Error::Validation {
				message: format!("targets.slug {} is listed more than once.", target.slug),
			});
		}
	}

	Ok(())
}

/// Fills empty secrets from the environment and clears blank optional strings.
///
/// `lookup` resolves an environment variable name; [`load`] passes [`env::var`].
pub fn normalize(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
	if cfg.providers.embedding.api_key.trim().is_empty()
		&& let Some(key) = lookup(OPENAI_API_KEY_ENV)
	{
		cfg.providers.embedding.api_key = key;
	}
	if cfg.storage.index.api_key.trim().is_empty()
		&& let Some(key) = lookup(PINECONE_API_KEY_ENV)
	{
		cfg.storage.index.api_key = key;
	}
	if cfg.storage.index.namespace.as_deref().map(|ns| ns.trim().is_empty()).unwrap_or(false) {
		cfg.storage.index.namespace = None;
	}
	if cfg.storage.index.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.index.vector_name = None;
	}
}

fn read_toml<T>(path: &Path) -> Result<T>
where
	T: DeserializeOwned,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	toml::from_str(&raw).map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })
}
