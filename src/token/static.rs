//! Fixed token → userId map, for tests and local development.

use super::{TokenVerifier, VerifiedIdentity};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;

pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        self.tokens
            .get(token)
            .map(|user_id| VerifiedIdentity { user_id: user_id.clone(), email: None })
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_to_its_user() {
        let verifier = StaticTokenVerifier::new(HashMap::from([("tok-1".to_string(), "u1".to_string())]));
        let identity = verifier.verify("tok-1").await.unwrap();
        assert_eq!(identity.user_id, "u1");
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        let verifier = StaticTokenVerifier::new(HashMap::new());
        assert!(matches!(verifier.verify("nope").await, Err(AppError::Unauthenticated)));
    }
}
