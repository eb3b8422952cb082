use thiserror::Error;

pub type Result<T> = std::result::Result<T, SendGridError>;

#[derive(Debug, Error)]
pub enum SendGridError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for SendGridError {
    fn from(err: reqwest::Error) -> Self {
        SendGridError::Network(err.to_string())
    }
}
