//! firebase CLI wrapper
//!
//! Listing commands run with `--json`; their output is parsed with
//! [`crate::json::parse_json_object`] so banner lines around the payload are
//! ignored.

use crate::error::{BootstrapError, Result};
use crate::json::{parse_json_object, result_array};
use crate::runner::{CommandOutput, CommandRunner};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// firebase CLI wrapper
#[derive(Clone)]
pub struct FirebaseCli {
    runner: Arc<dyn CommandRunner>,
}

impl FirebaseCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run("firebase", args).await
    }

    /// Run a `--json` command and parse its payload; a non-zero exit is an error
    async fn run_json(&self, label: &str, args: &[&str]) -> Result<Value> {
        let output = self.run(args).await?;
        if !output.success() {
            return Err(BootstrapError::CommandFailed {
                label: label.to_string(),
                status: output.status_label(),
                output: output.combined(),
            });
        }
        parse_json_object(&output.stdout, label)
    }

    /// Projects that already have Firebase added
    pub async fn list_projects(&self) -> Result<Vec<FirebaseProject>> {
        let value = self
            .run_json("projects:list", &["projects:list", "--json"])
            .await?;
        Ok(result_array(&value)
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    pub async fn add_firebase(&self, project_id: &str) -> Result<CommandOutput> {
        self.run(&["projects:addfirebase", project_id]).await
    }

    pub async fn list_web_apps(&self, project_id: &str) -> Result<Vec<WebAppInfo>> {
        let value = self
            .run_json(
                "apps:list",
                &["apps:list", "WEB", "--project", project_id, "--json"],
            )
            .await?;
        Ok(result_array(&value)
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    /// Create a web app. Returns the raw output so the caller decides how a
    /// failure is classified, plus the new app id when it could be parsed.
    pub async fn create_web_app(
        &self,
        project_id: &str,
        display_name: &str,
    ) -> Result<(CommandOutput, Option<String>)> {
        let output = self
            .run(&[
                "apps:create",
                "WEB",
                display_name,
                "--project",
                project_id,
                "--json",
            ])
            .await?;

        let app_id = if output.success() {
            parse_json_object(&output.stdout, "apps:create")
                .ok()
                .and_then(|v| v.get("result").and_then(|r| r.get("appId")).cloned())
                .and_then(|id| id.as_str().map(String::from))
        } else {
            None
        };

        Ok((output, app_id))
    }

    /// Raw `apps:sdkconfig` payload, still wrapped in its envelope
    pub async fn sdk_config(&self, project_id: &str, app_id: &str) -> Result<Value> {
        self.run_json(
            "apps:sdkconfig",
            &[
                "apps:sdkconfig",
                "WEB",
                app_id,
                "--project",
                project_id,
                "--json",
            ],
        )
        .await
    }

    pub async fn deploy(&self, project_id: &str, only: Option<&str>) -> Result<CommandOutput> {
        let mut args = vec!["deploy", "--project", project_id, "--non-interactive"];
        if let Some(targets) = only {
            args.push("--only");
            args.push(targets);
        }
        self.run(&args).await
    }
}

/// Entry of `firebase projects:list --json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseProject {
    pub project_id: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

/// Entry of `firebase apps:list WEB --json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppInfo {
    pub app_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub platform: Option<String>,
}

/// Pick the app named `display_name`, else the first one listed.
pub fn select_web_app<'a>(apps: &'a [WebAppInfo], display_name: &str) -> Option<&'a WebAppInfo> {
    apps.iter()
        .find(|app| app.display_name.as_deref() == Some(display_name))
        .or_else(|| apps.first())
}
