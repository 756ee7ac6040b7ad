use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::AuthSettings;

/// Errors that can occur when talking to the identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Credentials rejected: {0}")]
    Rejected(String),

    #[error("Identity provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },
}

/// Account identity as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session issued by the provider, passed through to the caller
///
/// Sign-up against a provider that requires email confirmation returns only
/// the user; the token fields are then absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub user: IdentityUser,
}

/// GoTrue-compatible identity provider client
pub struct IdentityClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl IdentityClient {
    pub fn new(settings: &AuthSettings) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            base_url: settings.provider_url.trim_end_matches('/').to_string(),
            api_key: settings.provider_api_key.clone(),
            client,
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let body: Value = self.post_credentials(&url, email, password).await?;

        // Confirmation-required providers answer with the bare user
        if body.get("user").is_some() {
            Self::parse_session(body)
        } else {
            let user: IdentityUser = serde_json::from_value(body)
                .map_err(|e| IdentityError::ProviderError { status: 200, message: e.to_string() })?;
            Ok(Session {
                access_token: None,
                refresh_token: None,
                expires_in: None,
                token_type: None,
                user,
            })
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let body = self.post_credentials(&url, email, password).await?;
        Self::parse_session(body)
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/logout", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check(response).await.map(|_| ())
    }

    async fn post_credentials(&self, url: &str, email: &str, password: &str) -> Result<Value, IdentityError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = provider_message(&body);

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(IdentityError::Rejected(message))
            }
            _ => {
                tracing::error!("Identity provider error: {} - {}", status, body);
                Err(IdentityError::ProviderError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn parse_session(body: Value) -> Result<Session, IdentityError> {
        serde_json::from_value(body).map_err(|e| IdentityError::ProviderError {
            status: 200,
            message: format!("Unexpected session shape: {}", e),
        })
    }
}

/// Pull the human-readable message out of a provider error body
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(provider_message(body), "Invalid login credentials");
        assert_eq!(provider_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(provider_message("gateway timeout"), "gateway timeout");
    }
}
