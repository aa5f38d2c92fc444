//! Provisioning steps, their failure allow-lists and recorded outcomes

use crate::error::{BootstrapError, Result};
use crate::runner::CommandOutput;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The fixed, ordered provisioning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    EnsureProject,
    SetProject,
    LinkBilling,
    EnableServices,
    AddFirebase,
    EnsureWebApp,
    EnsureFirestore,
    InitializeAuth,
    ConfigureSignIn,
    FetchSdkConfig,
    WriteConfigFiles,
    InstallDependencies,
    Deploy,
}

impl StepKind {
    /// Every step in execution order
    pub const ALL: [StepKind; 13] = [
        Self::EnsureProject,
        Self::SetProject,
        Self::LinkBilling,
        Self::EnableServices,
        Self::AddFirebase,
        Self::EnsureWebApp,
        Self::EnsureFirestore,
        Self::InitializeAuth,
        Self::ConfigureSignIn,
        Self::FetchSdkConfig,
        Self::WriteConfigFiles,
        Self::InstallDependencies,
        Self::Deploy,
    ];

    /// Human-readable label used in progress output and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnsureProject => "Ensure GCP project",
            Self::SetProject => "Set active project",
            Self::LinkBilling => "Link billing account",
            Self::EnableServices => "Enable service APIs",
            Self::AddFirebase => "Register Firebase project",
            Self::EnsureWebApp => "Ensure web app",
            Self::EnsureFirestore => "Ensure Firestore database",
            Self::InitializeAuth => "Initialize Identity Platform",
            Self::ConfigureSignIn => "Configure email/password sign-in",
            Self::FetchSdkConfig => "Fetch SDK config",
            Self::WriteConfigFiles => "Write config files",
            Self::InstallDependencies => "Install dependencies",
            Self::Deploy => "Deploy",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::EnsureProject => "project",
            Self::SetProject => "set-project",
            Self::LinkBilling => "billing",
            Self::EnableServices => "services",
            Self::AddFirebase => "firebase",
            Self::EnsureWebApp => "web-app",
            Self::EnsureFirestore => "firestore",
            Self::InitializeAuth => "auth-init",
            Self::ConfigureSignIn => "sign-in",
            Self::FetchSdkConfig => "sdk-config",
            Self::WriteConfigFiles => "files",
            Self::InstallDependencies => "install",
            Self::Deploy => "deploy",
        }
    }

    /// Failure text that is treated as success for this step's mutating call
    pub fn allow_list(&self) -> AllowList {
        match self {
            Self::AddFirebase => AllowList::new(["already exists"]),
            Self::InitializeAuth => AllowList::new([
                "already enabled",
                "already been enabled",
                "already initialized",
                "already exists",
            ]),
            _ => AllowList::empty(),
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive substrings that downgrade a failed call to a tolerated one.
///
/// Matching free-form error text is fragile: a tool that rewords its message
/// turns a benign rerun into a fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    patterns: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the first pattern found in `text`
    pub fn matches(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.patterns
            .iter()
            .find(|p| haystack.contains(p.as_str()))
            .map(String::as_str)
    }
}

/// How a step (or one call inside it) ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step changed external or local state
    Completed { message: String },
    /// Target state already satisfied, nothing was mutated
    Skipped { reason: String },
    /// The mutating call failed with allow-listed output
    Tolerated { output: String },
}

impl StepOutcome {
    pub fn completed(message: impl Into<String>) -> Self {
        Self::Completed {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// Outcome of one step in a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepKind,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

/// Receives progress events while the sequencer runs.
pub trait ProgressSink {
    fn step_started(&mut self, step: StepKind);

    fn step_finished(&mut self, step: StepKind, outcome: &StepOutcome, duration: Duration);

    fn step_failed(&mut self, step: StepKind, error: &BootstrapError);

    /// Extra per-step detail (e.g. which service is being enabled)
    fn detail(&mut self, _message: &str) {}
}

/// [`ProgressSink`] that discards everything.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn step_started(&mut self, _step: StepKind) {}

    fn step_finished(&mut self, _step: StepKind, _outcome: &StepOutcome, _duration: Duration) {}

    fn step_failed(&mut self, _step: StepKind, _error: &BootstrapError) {}
}

/// Classify a command result for `step`.
///
/// A zero exit yields `Ok(None)`. A non-zero exit whose output matches the
/// step's allow-list yields `Ok(Some(Tolerated))`; anything else is a
/// [`BootstrapError::CommandFailed`] carrying the label, status and output.
pub fn check_output(step: StepKind, output: &CommandOutput) -> Result<Option<StepOutcome>> {
    if output.success() {
        return Ok(None);
    }

    let text = output.combined();
    if let Some(pattern) = step.allow_list().matches(&text) {
        tracing::info!(
            "[{}] tolerated failure (matched '{}'): {}",
            step.label(),
            pattern,
            text
        );
        return Ok(Some(StepOutcome::Tolerated { output: text }));
    }

    Err(BootstrapError::CommandFailed {
        label: step.label().to_string(),
        status: output.status_label(),
        output: text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let list = AllowList::new(["Already Exists"]);
        assert_eq!(
            list.matches("ERROR: Project ALREADY EXISTS in org"),
            Some("already exists")
        );
        assert_eq!(list.matches("permission denied"), None);
        assert!(AllowList::empty().matches("already exists").is_none());
    }

    #[test]
    fn test_auth_allow_list() {
        let list = StepKind::InitializeAuth.allow_list();
        assert!(list.matches("Identity Platform has already been enabled").is_some());
        assert!(list.matches("PERMISSION_DENIED: permission denied").is_none());
    }

    #[test]
    fn test_check_output_success_and_failure() {
        assert_eq!(
            check_output(StepKind::SetProject, &CommandOutput::ok("Updated")).unwrap(),
            None
        );

        let err = check_output(
            StepKind::LinkBilling,
            &CommandOutput::failed(1, "billing account not found"),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Link billing account"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("billing account not found"));
    }

    #[test]
    fn test_check_output_tolerated() {
        let outcome = check_output(
            StepKind::AddFirebase,
            &CommandOutput::failed(1, "Error: Firebase project already exists"),
        )
        .unwrap();
        assert!(matches!(outcome, Some(StepOutcome::Tolerated { .. })));
    }

    #[test]
    fn test_step_order() {
        assert_eq!(StepKind::ALL.first(), Some(&StepKind::EnsureProject));
        assert_eq!(StepKind::ALL.last(), Some(&StepKind::Deploy));
        let ids: std::collections::HashSet<_> = StepKind::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), StepKind::ALL.len());
    }
}
