//! Error types for the inaturalist-photos CLI

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Inat(inaturalist_photos::InatError),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Inat(err) => write!(f, "iNaturalist error: {}", err),
            CliError::Json(err) => write!(f, "JSON error: {}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Inat(err) => Some(err),
            CliError::Json(err) => Some(err),
            CliError::Config(_) => None,
        }
    }
}

impl From<inaturalist_photos::InatError> for CliError {
    fn from(err: inaturalist_photos::InatError) -> Self {
        CliError::Inat(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
