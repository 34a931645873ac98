//! TokenVerifier abstraction (spec §6): turns an opaque bearer token into a
//! stable user id. Identity issuance itself is out of scope; the core only
//! consumes this capability — grounded on the teacher's `HistoryProvider`
//! pattern of a swappable backend behind a trait.

mod http;
mod r#static;

pub use http::HttpTokenVerifier;
pub use r#static::StaticTokenVerifier;

use crate::config::TokenVerifierConfig;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Idempotent, no side effects (spec §6).
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;
}

pub fn build(config: &TokenVerifierConfig) -> Result<Arc<dyn TokenVerifier>, AppError> {
    match config {
        TokenVerifierConfig::Static { tokens } => Ok(Arc::new(StaticTokenVerifier::new(tokens.clone()))),
        TokenVerifierConfig::Http { url, timeout_ms } => {
            Ok(Arc::new(HttpTokenVerifier::new(url.clone(), Duration::from_millis(*timeout_ms))?))
        }
    }
}
