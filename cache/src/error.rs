use thiserror::Error;

/// Persistence failure. Never used to signal "no data": an empty series
/// is `Ok(vec![])`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}
