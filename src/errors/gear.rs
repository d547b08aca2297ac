use thiserror::Error;

use crate::errors::ArchiveError;

/// Gear-wide error type to avoid `Box<dyn Error>` in public APIs.
#[derive(Error, Debug)]
pub enum GearError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("No functional NIfTI files found in acquisition {0}")]
    NoFunctionalData(String),

    #[error("Missing EchoTime for file: {0}")]
    MissingEchoTime(String),

    #[error("Unsafe file name from data service: {0}")]
    UnsafeFileName(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),
}
