#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtdError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("malformed task record at {path}:{line}: {source}")]
    MalformedStore {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
