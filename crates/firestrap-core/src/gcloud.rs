//! gcloud CLI wrapper
//!
//! Wraps the gcloud commands used for project, billing, service and
//! Firestore provisioning.

use crate::error::{BootstrapError, Result};
use crate::runner::{CommandOutput, CommandRunner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

const DEFAULT_DATABASE_SUFFIX: &str = "/databases/(default)";

/// gcloud CLI wrapper
#[derive(Clone)]
pub struct Gcloud {
    runner: Arc<dyn CommandRunner>,
}

impl Gcloud {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run("gcloud", args).await
    }

    /// Whether the project exists and is visible to the active account
    pub async fn project_exists(&self, project_id: &str) -> Result<bool> {
        let output = self
            .run(&["projects", "describe", project_id, "--format=json"])
            .await?;
        Ok(output.success())
    }

    pub async fn create_project(&self, project_id: &str, name: &str) -> Result<CommandOutput> {
        let name_arg = format!("--name={}", name);
        self.run(&["projects", "create", project_id, name_arg.as_str()])
            .await
    }

    pub async fn set_project(&self, project_id: &str) -> Result<CommandOutput> {
        self.run(&["config", "set", "project", project_id]).await
    }

    pub async fn link_billing(
        &self,
        project_id: &str,
        billing_account: &str,
    ) -> Result<CommandOutput> {
        let account_arg = format!("--billing-account={}", billing_account);
        self.run(&["billing", "projects", "link", project_id, account_arg.as_str()])
            .await
    }

    /// Names of the services currently enabled on the project
    pub async fn list_enabled_services(&self, project_id: &str) -> Result<BTreeSet<String>> {
        let output = self
            .run(&[
                "services",
                "list",
                "--enabled",
                "--project",
                project_id,
                "--format=value(config.name)",
            ])
            .await?;

        if !output.success() {
            return Err(BootstrapError::CommandFailed {
                label: "List enabled services".to_string(),
                status: output.status_label(),
                output: output.combined(),
            });
        }

        Ok(parse_service_list(&output.stdout))
    }

    pub async fn enable_service(&self, project_id: &str, service: &str) -> Result<CommandOutput> {
        self.run(&["services", "enable", service, "--project", project_id])
            .await
    }

    pub async fn list_firestore_databases(&self, project_id: &str) -> Result<Vec<DatabaseInfo>> {
        let output = self
            .run(&[
                "firestore",
                "databases",
                "list",
                "--project",
                project_id,
                "--format=json",
            ])
            .await?;

        if !output.success() {
            return Err(BootstrapError::CommandFailed {
                label: "List Firestore databases".to_string(),
                status: output.status_label(),
                output: output.combined(),
            });
        }

        if output.stdout.trim().is_empty() || output.stdout.trim() == "[]" {
            return Ok(Vec::new());
        }

        let databases: Vec<DatabaseInfo> = serde_json::from_str(output.stdout.trim())?;
        Ok(databases)
    }

    pub async fn create_firestore_database(
        &self,
        project_id: &str,
        location: &str,
    ) -> Result<CommandOutput> {
        let location_arg = format!("--location={}", location);
        self.run(&[
            "firestore",
            "databases",
            "create",
            "--project",
            project_id,
            location_arg.as_str(),
        ])
        .await
    }

    /// OAuth access token of the active gcloud account
    pub async fn access_token(&self) -> Result<String> {
        let output = self.run(&["auth", "print-access-token"]).await?;
        if !output.success() {
            return Err(BootstrapError::CommandFailed {
                label: "Fetch access token".to_string(),
                status: output.status_label(),
                output: output.combined(),
            });
        }

        let token = output.stdout.trim().to_string();
        if token.is_empty() {
            return Err(BootstrapError::EmptyAccessToken);
        }
        Ok(token)
    }
}

/// Firestore database entry from `gcloud firestore databases list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    /// Full resource name, `projects/<id>/databases/<db>`
    pub name: String,

    #[serde(default)]
    pub location_id: Option<String>,

    #[serde(default, rename = "type")]
    pub database_type: Option<String>,
}

impl DatabaseInfo {
    pub fn is_default(&self) -> bool {
        self.name.ends_with(DEFAULT_DATABASE_SUFFIX)
    }
}

fn parse_service_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
