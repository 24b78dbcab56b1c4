use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("{key} must be non-empty; set it in the config file or export {env_var}.")]
	MissingSecret { key: &'static str, env_var: &'static str },
	#[error("{message}")]
	Validation { message: String },
}
