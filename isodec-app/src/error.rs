//! 应用错误定义

use std::path::PathBuf;

use isodec_core::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("no field definition file given (use --schema or the `schema` config key)")]
    MissingSchema,
    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
    #[error("field definitions: {0}")]
    Schema(#[from] ProtocolError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Join(#[from] tokio::task::JoinError),
}
