use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rpc: {0}")]
    Status(#[from] tonic::Status),

    #[error("transport: {0}")]
    Transport(#[from] tonic::transport::Error),
}
