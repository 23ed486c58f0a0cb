use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that abort a tick before its notify phase. Per-group RPC failures
/// and send failures are handled inside the tick and never surface here.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("db: {0}")]
    Db(#[from] poolbot_store::DbError),
}
