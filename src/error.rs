use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryChangeError {
    #[error("Invalid fiscal start month {0}: must be between 2 and 12")]
    InvalidFiscalStartMonth(u32),

    #[error("Invalid threshold configuration: {0}")]
    InvalidThreshold(String),

    #[error("Invalid organization directory: {0}")]
    InvalidDirectory(String),

    #[error("Invalid fiscal period {0}: months cannot be represented as calendar dates")]
    InvalidFiscalPeriod(i32),

    #[error("Roll-up mismatch at {level} '{name}' ({measure}): expected {expected}, got {actual}")]
    RollupMismatch {
        level: String,
        name: String,
        measure: String,
        expected: u64,
        actual: u64,
    },

    #[error("Collator unavailable: {0}")]
    CollatorUnavailable(String),

    #[error("Event source unavailable: {0}")]
    EventSourceUnavailable(String),

    #[error("Snapshot source unavailable: {0}")]
    SnapshotSourceUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryChangeError>;
