//! Calls an external auth endpoint over `reqwest` with a bounded timeout —
//! the production-deployment `TokenVerifier`.

use super::{TokenVerifier, VerifiedIdentity};
use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct HttpTokenVerifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(rename = "userId")]
    user_id: String,
    email: Option<String>,
}

impl HttpTokenVerifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Fatal(format!("failed to build token verifier http client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::TokenVerification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthenticated);
        }

        let body: VerifyResponse = response.json().await.map_err(|e| AppError::TokenVerification(e.to_string()))?;
        Ok(VerifiedIdentity { user_id: body.user_id, email: body.email })
    }
}
