/// Error types shared by the knowledge-base crates.
///
/// These errors represent failures in infrastructure components (Redis, the
/// key-value persistence port). Application-specific errors are defined in the
/// server crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, degrading gracefully")]
    RedisUnavailable,

    #[error("unexpected redis reply: {0}")]
    UnexpectedReply(String),
}
