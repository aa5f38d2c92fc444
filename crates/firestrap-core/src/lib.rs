//! firestrap core
//!
//! Idempotent provisioning of a Firebase-backed web project: GCP project,
//! billing, service APIs, Firebase registration, web app, Firestore,
//! Identity Platform and the client SDK config files.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 firestrap CLI                    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │            Bootstrapper (sequencer)              │
//! │   StepKind::ALL in order, check before mutate    │
//! └───────┬─────────────────┬──────────────┬────────┘
//!         │                 │              │
//! ┌───────▼──────┐ ┌────────▼─────┐ ┌──────▼───────┐
//! │    gcloud    │ │   firebase   │ │   Identity   │
//! │   (CLI)      │ │   (CLI)      │ │  Toolkit API │
//! └───────┬──────┘ └────────┬─────┘ └──────────────┘
//!         └────────┬────────┘
//!          trait CommandRunner
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use firestrap_core::{BootstrapOptions, Bootstrapper, IdentityToolkit, NoopProgress, ProcessRunner};
//!
//! let options = BootstrapOptions::new("acme-web-1", "0000AA-111111-BBBBBB");
//! let runner = Arc::new(ProcessRunner::new().current_dir("."));
//! let bootstrapper = Bootstrapper::new(options, runner, Arc::new(IdentityToolkit::new()));
//! let result = bootstrapper.run(&mut NoopProgress).await?;
//! println!("{}", result.hosting_url);
//! ```

pub mod error;
pub mod firebase;
pub mod gcloud;
pub mod identity;
pub mod json;
pub mod options;
pub mod render;
pub mod runner;
pub mod sdk_config;
pub mod sequencer;
pub mod step;

// Re-exports
pub use error::{BootstrapError, Result};
pub use firebase::{FirebaseCli, FirebaseProject, WebAppInfo};
pub use gcloud::{DatabaseInfo, Gcloud};
pub use identity::{AuthAdmin, IdentityToolkit};
pub use options::{BootstrapOptions, REQUIRED_SERVICES};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use sdk_config::SdkConfig;
pub use sequencer::{BootstrapContext, BootstrapResult, Bootstrapper};
pub use step::{AllowList, NoopProgress, ProgressSink, StepKind, StepOutcome, StepRecord};
