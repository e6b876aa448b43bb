// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Intranet API client.
//!
//! The intranet uses its own token-keyed auth scheme (`Authorization: Token
//! <token_intranet>`); the credential comes from the caller's backend profile,
//! never from cookies.

use crate::error::AppError;
use serde_json::Value;

#[derive(Clone)]
pub struct IntranetClient {
    http: reqwest::Client,
    base_url: String,
}

impl IntranetClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(token: &str) -> String {
        format!("Token {}", token)
    }

    /// GET with the inbound query string passed through untouched.
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        token: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(token))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Intranet request failed: {}", e)))?;

        self.check_json(response).await
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: &Value, token: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(token))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Intranet request failed: {}", e)))?;

        self.check_json(response).await
    }

    async fn check_json(&self, response: reqwest::Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Intranet API error");

            if status.is_client_error() {
                return Err(AppError::UpstreamStatus {
                    status: status.as_u16(),
                    message: if body.is_empty() {
                        "intranet_error".to_string()
                    } else {
                        body.chars().take(200).collect()
                    },
                });
            }
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }
}
