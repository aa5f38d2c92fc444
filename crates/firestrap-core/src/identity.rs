//! Identity Toolkit API client
//!
//! Direct REST calls for Identity Platform initialization and sign-in
//! provider configuration. Authenticated with the gcloud access token.

use crate::error::{BootstrapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IDENTITY_TOOLKIT_API_BASE: &str = "https://identitytoolkit.googleapis.com";

/// Identity Platform administration calls the sequencer needs.
#[async_trait]
pub trait AuthAdmin: Send + Sync {
    /// Enable Identity Platform on the project
    async fn initialize_auth(&self, project_id: &str, access_token: &str) -> Result<()>;

    /// Turn on email/password sign-in (partial update of `signIn.email`)
    async fn enable_email_password(&self, project_id: &str, access_token: &str) -> Result<()>;
}

/// Identity Toolkit REST client
pub struct IdentityToolkit {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityToolkit {
    pub fn new() -> Self {
        Self::with_base_url(IDENTITY_TOOLKIT_API_BASE)
    }

    /// Point the client at another endpoint (emulators, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let reason = status.canonical_reason().unwrap_or("unknown status").to_string();
        let text = match response.text().await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => reason,
            Err(e) => {
                tracing::warn!("failed to read error body: {}", e);
                reason
            }
        };
        // Google APIs wrap failures as {"error": {"code", "message", "status"}}
        let body = match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(parsed) => parsed.error.message,
            Err(_) => text,
        };

        Err(BootstrapError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for IdentityToolkit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthAdmin for IdentityToolkit {
    async fn initialize_auth(&self, project_id: &str, access_token: &str) -> Result<()> {
        let url = format!(
            "{}/v2/projects/{}/identityPlatform:initializeAuth",
            self.base_url, project_id
        );

        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("X-Goog-User-Project", project_id)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        Self::check(response).await
    }

    async fn enable_email_password(&self, project_id: &str, access_token: &str) -> Result<()> {
        let url = format!("{}/admin/v2/projects/{}/config", self.base_url, project_id);

        let request_body = UpdateConfigRequest {
            name: format!("projects/{}/config", project_id),
            sign_in: SignInConfig {
                email: EmailSignIn {
                    enabled: true,
                    password_required: true,
                },
            },
        };

        tracing::debug!("PATCH {}?updateMask=signIn.email", url);

        let response = self
            .client
            .patch(&url)
            .query(&[("updateMask", "signIn.email")])
            .bearer_auth(access_token)
            .header("X-Goog-User-Project", project_id)
            .json(&request_body)
            .send()
            .await?;

        Self::check(response).await
    }
}

// ============ API Types ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateConfigRequest {
    name: String,
    sign_in: SignInConfig,
}

#[derive(Debug, Serialize)]
struct SignInConfig {
    email: EmailSignIn,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailSignIn {
    enabled: bool,
    password_required: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
