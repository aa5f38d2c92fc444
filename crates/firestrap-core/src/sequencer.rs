//! Idempotent provisioning sequencer
//!
//! Runs [`StepKind::ALL`] in order. Each step first asks the external system
//! whether its target already exists and only mutates when it does not. The
//! first error aborts the run; nothing is rolled back.

use crate::error::{BootstrapError, Result};
use crate::firebase::{FirebaseCli, select_web_app};
use crate::gcloud::Gcloud;
use crate::identity::AuthAdmin;
use crate::json::unwrap_sdk_config;
use crate::options::BootstrapOptions;
use crate::render;
use crate::runner::{CommandRunner, require_tool};
use crate::sdk_config::SdkConfig;
use crate::step::{ProgressSink, StepKind, StepOutcome, StepRecord, check_output};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

const AUTH_INIT_HINT: &str = "Identity Platform requires billing. Check that the billing account is \
     linked and active (`gcloud billing projects describe <project>`)";

/// State owned by a single run and threaded through the steps.
#[derive(Debug, Default)]
pub struct BootstrapContext {
    pub enabled_services: BTreeSet<String>,
    pub app_id: Option<String>,
    pub sdk_config: Option<SdkConfig>,
    access_token: Option<String>,
    pub records: Vec<StepRecord>,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub project_id: String,
    pub app_id: String,
    pub hosting_url: String,
    pub sdk_config: SdkConfig,
    pub enabled_services: BTreeSet<String>,
    pub steps: Vec<StepRecord>,
}

impl BootstrapResult {
    /// Number of steps that changed something
    pub fn changed(&self) -> usize {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Completed { .. }))
            .count()
    }
}

/// Drives the provisioning pipeline.
pub struct Bootstrapper {
    options: BootstrapOptions,
    runner: Arc<dyn CommandRunner>,
    gcloud: Gcloud,
    firebase: FirebaseCli,
    auth: Arc<dyn AuthAdmin>,
}

impl Bootstrapper {
    pub fn new(
        options: BootstrapOptions,
        runner: Arc<dyn CommandRunner>,
        auth: Arc<dyn AuthAdmin>,
    ) -> Self {
        Self {
            gcloud: Gcloud::new(runner.clone()),
            firebase: FirebaseCli::new(runner.clone()),
            options,
            runner,
            auth,
        }
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// Run every step. Returns on the first failure.
    pub async fn run(&self, progress: &mut dyn ProgressSink) -> Result<BootstrapResult> {
        self.options.validate()?;
        self.check_tools().await?;
        // checked before any cloud mutation
        render::check_client_config(&self.options.client_config).await?;

        let mut ctx = BootstrapContext::default();

        for step in StepKind::ALL {
            progress.step_started(step);
            let start = Instant::now();

            match self.execute(step, &mut ctx, progress).await {
                Ok(outcome) => {
                    let duration = start.elapsed();
                    progress.step_finished(step, &outcome, duration);
                    ctx.records.push(StepRecord {
                        step,
                        outcome,
                        duration,
                    });
                }
                Err(e) => {
                    tracing::error!("[{}] {}", step.label(), e);
                    progress.step_failed(step, &e);
                    return Err(e);
                }
            }
        }

        let project_id = self.options.project_id.clone();
        let app_id = ctx
            .app_id
            .ok_or_else(|| BootstrapError::MissingAppId(project_id.clone()))?;
        let sdk_config = ctx
            .sdk_config
            .ok_or_else(|| BootstrapError::JsonNotFound("apps:sdkconfig".to_string()))?;

        Ok(BootstrapResult {
            hosting_url: self.options.hosting_url(),
            project_id,
            app_id,
            sdk_config,
            enabled_services: ctx.enabled_services,
            steps: ctx.records,
        })
    }

    async fn check_tools(&self) -> Result<()> {
        let mut tools = vec!["gcloud", "firebase"];
        if !self.options.skip_install {
            tools.push("npm");
        }
        for tool in tools {
            require_tool(self.runner.as_ref(), tool).await?;
        }
        Ok(())
    }

    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut BootstrapContext,
        progress: &mut dyn ProgressSink,
    ) -> Result<StepOutcome> {
        match step {
            StepKind::EnsureProject => self.ensure_project().await,
            StepKind::SetProject => self.set_project().await,
            StepKind::LinkBilling => self.link_billing().await,
            StepKind::EnableServices => self.enable_services(ctx, progress).await,
            StepKind::AddFirebase => self.add_firebase().await,
            StepKind::EnsureWebApp => self.ensure_web_app(ctx).await,
            StepKind::EnsureFirestore => self.ensure_firestore().await,
            StepKind::InitializeAuth => self.initialize_auth(ctx).await,
            StepKind::ConfigureSignIn => self.configure_sign_in(ctx).await,
            StepKind::FetchSdkConfig => self.fetch_sdk_config(ctx).await,
            StepKind::WriteConfigFiles => self.write_config_files(ctx).await,
            StepKind::InstallDependencies => self.install_dependencies().await,
            StepKind::Deploy => self.deploy().await,
        }
    }

    async fn ensure_project(&self) -> Result<StepOutcome> {
        let step = StepKind::EnsureProject;
        let project_id = &self.options.project_id;

        if self.gcloud.project_exists(project_id).await? {
            return Ok(StepOutcome::skipped(format!(
                "project {} already exists",
                project_id
            )));
        }

        if self.options.skip_create_project {
            return Err(BootstrapError::ProjectNotFound(project_id.clone()));
        }

        tracing::info!("Creating project {}", project_id);
        let output = self
            .gcloud
            .create_project(project_id, self.options.project_display_name())
            .await?;
        if let Some(tolerated) = check_output(step, &output)? {
            return Ok(tolerated);
        }

        Ok(StepOutcome::completed(format!(
            "created project {}",
            project_id
        )))
    }

    async fn set_project(&self) -> Result<StepOutcome> {
        let output = self.gcloud.set_project(&self.options.project_id).await?;
        if let Some(tolerated) = check_output(StepKind::SetProject, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed(format!(
            "active project set to {}",
            self.options.project_id
        )))
    }

    async fn link_billing(&self) -> Result<StepOutcome> {
        let output = self
            .gcloud
            .link_billing(&self.options.project_id, &self.options.billing_account)
            .await?;
        if let Some(tolerated) = check_output(StepKind::LinkBilling, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed(format!(
            "billing account {} linked",
            self.options.billing_account
        )))
    }

    async fn enable_services(
        &self,
        ctx: &mut BootstrapContext,
        progress: &mut dyn ProgressSink,
    ) -> Result<StepOutcome> {
        let step = StepKind::EnableServices;
        let project_id = &self.options.project_id;
        let required = self.options.required_services();

        ctx.enabled_services = self.gcloud.list_enabled_services(project_id).await?;

        let mut newly_enabled = Vec::new();
        for service in &required {
            if ctx.enabled_services.contains(service) {
                tracing::debug!("{} already enabled", service);
                continue;
            }

            progress.detail(&format!("enabling {}", service));
            let output = self.gcloud.enable_service(project_id, service).await?;

            if !output.success() {
                // The enable call can fail while a concurrent or earlier
                // request is still settling; trust the listing if it agrees.
                let refreshed = self.gcloud.list_enabled_services(project_id).await?;
                if !refreshed.contains(service) {
                    return Err(BootstrapError::CommandFailed {
                        label: format!("{} ({})", step.label(), service),
                        status: output.status_label(),
                        output: output.combined(),
                    });
                }
                tracing::warn!(
                    "enable {} reported failure but the service is now enabled",
                    service
                );
                ctx.enabled_services.extend(refreshed);
            }

            ctx.enabled_services.insert(service.clone());
            newly_enabled.push(service.clone());
        }

        if newly_enabled.is_empty() {
            Ok(StepOutcome::skipped(format!(
                "all {} services already enabled",
                required.len()
            )))
        } else {
            Ok(StepOutcome::completed(format!(
                "enabled {}",
                newly_enabled.join(", ")
            )))
        }
    }

    async fn add_firebase(&self) -> Result<StepOutcome> {
        let project_id = &self.options.project_id;

        let projects = self.firebase.list_projects().await?;
        if projects.iter().any(|p| &p.project_id == project_id) {
            return Ok(StepOutcome::skipped("Firebase already added"));
        }

        tracing::info!("Adding Firebase to {}", project_id);
        let output = self.firebase.add_firebase(project_id).await?;
        if let Some(tolerated) = check_output(StepKind::AddFirebase, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed("Firebase added"))
    }

    async fn ensure_web_app(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome> {
        let project_id = &self.options.project_id;
        let display_name = &self.options.web_app_name;

        let apps = self.firebase.list_web_apps(project_id).await?;
        if let Some(app) = select_web_app(&apps, display_name) {
            if app.display_name.as_deref() != Some(display_name.as_str()) {
                tracing::warn!(
                    "no web app named '{}', using {} ({})",
                    display_name,
                    app.app_id,
                    app.display_name.as_deref().unwrap_or("unnamed")
                );
            }
            ctx.app_id = Some(app.app_id.clone());
            return Ok(StepOutcome::skipped(format!(
                "using existing web app {}",
                app.app_id
            )));
        }

        tracing::info!("Creating web app '{}'", display_name);
        let (output, created_id) = self
            .firebase
            .create_web_app(project_id, display_name)
            .await?;
        check_output(StepKind::EnsureWebApp, &output)?;

        let app_id = match created_id {
            Some(id) => id,
            None => {
                // apps:create output could not be parsed; list again
                let apps = self.firebase.list_web_apps(project_id).await?;
                select_web_app(&apps, display_name)
                    .map(|app| app.app_id.clone())
                    .ok_or_else(|| BootstrapError::MissingAppId(project_id.clone()))?
            }
        };

        ctx.app_id = Some(app_id.clone());
        Ok(StepOutcome::completed(format!("created web app {}", app_id)))
    }

    async fn ensure_firestore(&self) -> Result<StepOutcome> {
        let project_id = &self.options.project_id;

        let databases = self.gcloud.list_firestore_databases(project_id).await?;
        if databases.iter().any(|db| db.is_default()) {
            return Ok(StepOutcome::skipped("(default) database already exists"));
        }

        tracing::info!("Creating Firestore database in {}", self.options.region);
        let output = self
            .gcloud
            .create_firestore_database(project_id, &self.options.region)
            .await?;
        if let Some(tolerated) = check_output(StepKind::EnsureFirestore, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed(format!(
            "created (default) database in {}",
            self.options.region
        )))
    }

    async fn access_token(&self, ctx: &mut BootstrapContext) -> Result<String> {
        if let Some(ref token) = ctx.access_token {
            return Ok(token.clone());
        }
        let token = self.gcloud.access_token().await?;
        ctx.access_token = Some(token.clone());
        Ok(token)
    }

    async fn initialize_auth(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome> {
        let step = StepKind::InitializeAuth;
        let token = self.access_token(ctx).await?;

        match self
            .auth
            .initialize_auth(&self.options.project_id, &token)
            .await
        {
            Ok(()) => Ok(StepOutcome::completed("Identity Platform initialized")),
            Err(e) => {
                let message = e.to_string();
                if let Some(pattern) = step.allow_list().matches(&message) {
                    tracing::info!("[{}] tolerated (matched '{}'): {}", step, pattern, message);
                    return Ok(StepOutcome::Tolerated { output: message });
                }
                Err(BootstrapError::AuthInit {
                    label: step.label().to_string(),
                    message,
                    hint: AUTH_INIT_HINT.to_string(),
                })
            }
        }
    }

    async fn configure_sign_in(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome> {
        let token = self.access_token(ctx).await?;
        self.auth
            .enable_email_password(&self.options.project_id, &token)
            .await?;
        Ok(StepOutcome::completed("email/password sign-in enabled"))
    }

    async fn fetch_sdk_config(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome> {
        let project_id = &self.options.project_id;
        let app_id = ctx
            .app_id
            .clone()
            .ok_or_else(|| BootstrapError::MissingAppId(project_id.clone()))?;

        let raw = self.firebase.sdk_config(project_id, &app_id).await?;
        let config = SdkConfig::from_map(&unwrap_sdk_config(raw)?)?;

        if &config.project_id != project_id {
            tracing::warn!(
                "SDK config projectId {} differs from {}",
                config.project_id,
                project_id
            );
        }

        ctx.sdk_config = Some(config);
        Ok(StepOutcome::completed(format!(
            "SDK config fetched for {}",
            app_id
        )))
    }

    async fn write_config_files(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome> {
        let config = ctx
            .sdk_config
            .as_ref()
            .ok_or_else(|| BootstrapError::JsonNotFound("apps:sdkconfig".to_string()))?;

        render::write_outputs(
            &self.options.alias_file,
            &self.options.client_config,
            &self.options.project_id,
            config,
        )
        .await?;

        Ok(StepOutcome::completed(format!(
            "wrote {} and {}",
            self.options.alias_file.display(),
            self.options.client_config.display()
        )))
    }

    async fn install_dependencies(&self) -> Result<StepOutcome> {
        if self.options.skip_install {
            return Ok(StepOutcome::skipped("--skip-install"));
        }
        let output = self.runner.run("npm", &["install"]).await?;
        if let Some(tolerated) = check_output(StepKind::InstallDependencies, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed("npm install finished"))
    }

    async fn deploy(&self) -> Result<StepOutcome> {
        if self.options.skip_deploy {
            return Ok(StepOutcome::skipped("--skip-deploy"));
        }
        let output = self
            .firebase
            .deploy(&self.options.project_id, self.options.deploy_only.as_deref())
            .await?;
        if let Some(tolerated) = check_output(StepKind::Deploy, &output)? {
            return Ok(tolerated);
        }
        Ok(StepOutcome::completed(format!(
            "deployed to {}",
            self.options.hosting_url()
        )))
    }
}
