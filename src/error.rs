use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("receipt number is required")]
    MissingReceipt,
    #[error("profile for user '{0}' already exists")]
    DuplicateProfile(String),
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
    #[error("insufficient withdrawable balance")]
    InsufficientFunds,
    #[error("transfer source and destination must differ")]
    InvalidTransfer,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::StorageUnavailable(format!("row codec: {e}"))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}
