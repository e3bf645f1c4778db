//! Error types for the adb-get CLI

use std::fmt;

use artdatabanken_api::ApiError;

#[derive(Debug)]
pub enum CliError {
    /// Missing API key or unusable settings
    Config(String),
    /// Arguments that do not make sense together, or nothing to do
    Usage(String),
    TaxonNameNotFound(String),
    TaxonIdNotFound(u32),
    Api(ApiError),
    Output(std::io::Error),
}

impl CliError {
    /// Process exit code, distinct per error class
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 1,
            CliError::Usage(_) => 2,
            CliError::TaxonNameNotFound(_) => 3,
            CliError::TaxonIdNotFound(_) => 4,
            CliError::Api(ApiError::Config(_)) => 1,
            CliError::Api(ApiError::Remote { .. }) => 5,
            CliError::Api(ApiError::Http(_)) => 6,
            CliError::Api(ApiError::InvalidFilter(_)) => 7,
            CliError::Api(ApiError::Json(_)) => 8,
            CliError::Output(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::TaxonNameNotFound(name) => write!(
                f,
                "No taxon with name '{}' found in the Artdatabanken species API",
                name
            ),
            CliError::TaxonIdNotFound(id) => write!(
                f,
                "No taxon with id '{}' found in the Artdatabanken species API",
                id
            ),
            CliError::Api(err) => write!(f, "{}", err),
            CliError::Output(err) => write!(f, "Output error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Api(err) => Some(err),
            CliError::Output(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CliError::Api(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Api(ApiError::Json(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Output(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
