//! Bootstrap error types

use thiserror::Error;

/// Errors raised while provisioning.
///
/// Every variant is fatal: the sequencer aborts on the first error and relies
/// on a rerun to pick up where it stopped.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("{0} not found on PATH. Please install it first")]
    ToolNotFound(String),

    #[error(
        "project '{0}' does not exist and project creation is disabled (--skip-create-project)"
    )]
    ProjectNotFound(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("[{label}] command failed ({status}):\n{output}")]
    CommandFailed {
        label: String,
        status: String,
        output: String,
    },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("[{label}] {message}\nhint: {hint}")]
    AuthInit {
        label: String,
        message: String,
        hint: String,
    },

    #[error("no JSON object found in output of '{0}'")]
    JsonNotFound(String),

    #[error("SDK config field '{0}' is missing or empty")]
    MissingSdkField(&'static str),

    #[error("could not resolve a web app id for project '{0}'")]
    MissingAppId(String),

    #[error("anchor `const firebaseConfig = window.__FIREBASE_CONFIG__ || {{ ... }};` not found in {0}")]
    AnchorNotFound(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gcloud returned an empty access token")]
    EmptyAccessToken,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
