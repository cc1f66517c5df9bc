/*
 * Error Module
 *
 * The library's error type. Setup and config loading return FlockResult;
 * ticking never fails.
 */

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlockError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type FlockResult<T> = Result<T, FlockError>;
