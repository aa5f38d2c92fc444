//! Run options

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Services every bootstrapped project gets
pub const REQUIRED_SERVICES: [&str; 5] = [
    "firebase.googleapis.com",
    "firestore.googleapis.com",
    "identitytoolkit.googleapis.com",
    "firebasehosting.googleapis.com",
    "cloudresourcemanager.googleapis.com",
];

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_WEB_APP_NAME: &str = "Web App";
pub const DEFAULT_ALIAS_FILE: &str = ".firebaserc";
pub const DEFAULT_CLIENT_CONFIG: &str = "public/app.js";

/// Everything one bootstrap run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapOptions {
    pub project_id: String,
    pub billing_account: String,
    /// Display name for a newly created project; defaults to the project id
    pub project_name: Option<String>,
    /// Firestore location
    pub region: String,
    pub web_app_name: String,
    pub skip_create_project: bool,
    pub skip_install: bool,
    pub skip_deploy: bool,
    pub alias_file: PathBuf,
    pub client_config: PathBuf,
    /// Services enabled in addition to [`REQUIRED_SERVICES`]
    pub extra_services: Vec<String>,
    /// `--only` targets passed to `firebase deploy`
    pub deploy_only: Option<String>,
}

impl BootstrapOptions {
    pub fn new(project_id: impl Into<String>, billing_account: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            billing_account: billing_account.into(),
            project_name: None,
            region: DEFAULT_REGION.to_string(),
            web_app_name: DEFAULT_WEB_APP_NAME.to_string(),
            skip_create_project: false,
            skip_install: false,
            skip_deploy: false,
            alias_file: PathBuf::from(DEFAULT_ALIAS_FILE),
            client_config: PathBuf::from(DEFAULT_CLIENT_CONFIG),
            extra_services: Vec::new(),
            deploy_only: None,
        }
    }

    pub fn project_display_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or(&self.project_id)
    }

    /// `https://<project>.web.app`
    pub fn hosting_url(&self) -> String {
        format!("https://{}.web.app", self.project_id)
    }

    /// The fixed services followed by any extras, without duplicates
    pub fn required_services(&self) -> Vec<String> {
        let mut services: Vec<String> = REQUIRED_SERVICES.iter().map(|s| s.to_string()).collect();
        for extra in &self.extra_services {
            let extra = extra.trim();
            if !extra.is_empty() && !services.iter().any(|s| s == extra) {
                services.push(extra.to_string());
            }
        }
        services
    }

    pub fn validate(&self) -> Result<()> {
        validate_project_id(&self.project_id)?;
        if self.billing_account.trim().is_empty() {
            return Err(BootstrapError::InvalidOptions(
                "billing account is required".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(BootstrapError::InvalidOptions(
                "region must not be empty".to_string(),
            ));
        }
        if self.web_app_name.trim().is_empty() {
            return Err(BootstrapError::InvalidOptions(
                "web app name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// GCP project ids: 6-30 chars of lowercase letters, digits and hyphens,
/// starting with a letter and not ending with a hyphen
fn validate_project_id(project_id: &str) -> Result<()> {
    let len_ok = (6..=30).contains(&project_id.len());
    let starts_ok = project_id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase());
    let chars_ok = project_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if len_ok && starts_ok && chars_ok && !project_id.ends_with('-') {
        Ok(())
    } else {
        Err(BootstrapError::InvalidOptions(format!(
            "invalid project id '{}' (6-30 lowercase letters, digits or hyphens, starting with a letter)",
            project_id
        )))
    }
}
