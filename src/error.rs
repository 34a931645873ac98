//! Unified error handling for the ski-tracking core.
//!
//! Mirrors the taxonomy in spec §7: every handler converts its outcome to
//! an ack envelope locally — no handler propagates an error up past the
//! connection task. `AppError` exists for internal plumbing (metrics
//! labeling, logging) between the HOT/WARM clients and the engines; it
//! never itself crosses the Gateway boundary as a serialized type.

use thiserror::Error;

/// Errors surfaced by HOT/WARM clients and the engines built on them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("validation: {0}")]
    Validation(String),

    #[error("throttled")]
    Throttled,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("hot datastore error: {0}")]
    Hot(#[from] redis::RedisError),

    #[error("warm store error: {0}")]
    Warm(#[from] sqlx::Error),

    #[error("hot datastore call timed out")]
    HotTimeout,

    #[error("warm store call timed out")]
    WarmTimeout,

    #[error("token verification failed: {0}")]
    TokenVerification(String),

    #[error("invariant violated: {0}")]
    Fatal(String),
}

impl AppError {
    /// Stable label for metrics, never containing interpolated data.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Throttled => "throttled",
            AppError::NotFound(_) => "not_found",
            AppError::Hot(_) => "hot_error",
            AppError::Warm(_) => "warm_error",
            AppError::HotTimeout => "hot_timeout",
            AppError::WarmTimeout => "warm_timeout",
            AppError::TokenVerification(_) => "token_verification",
            AppError::Fatal(_) => "fatal",
        }
    }

    /// Kinds the spec calls Transient: HOT/WARM/network failures that are
    /// internally logged at error level but surface as a plain failure
    /// ack to the caller, never closing the connection.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Hot(_) | AppError::Warm(_) | AppError::HotTimeout | AppError::WarmTimeout
        )
    }

    /// An invariant violation severe enough that the connection MAY be
    /// dropped; never automatically recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Fatal(_))
    }
}
