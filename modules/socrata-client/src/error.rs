use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocrataError>;

#[derive(Debug, Error)]
pub enum SocrataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SocrataError {
    fn from(err: reqwest::Error) -> Self {
        SocrataError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SocrataError {
    fn from(err: serde_json::Error) -> Self {
        SocrataError::Parse(err.to_string())
    }
}
