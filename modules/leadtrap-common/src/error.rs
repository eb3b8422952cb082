use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Ledger persist failed: {0}")]
    LedgerPersist(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
