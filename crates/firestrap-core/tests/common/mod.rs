#![allow(dead_code)]

use async_trait::async_trait;
use firestrap_core::error::{BootstrapError, Result};
use firestrap_core::{
    AuthAdmin, BootstrapOptions, CommandOutput, CommandRunner, ProgressSink, StepKind,
    StepOutcome,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub const PROJECT: &str = "acme-1";

pub const CLIENT_SOURCE: &str = r#"import { initializeApp } from "firebase/app";

const firebaseConfig = window.__FIREBASE_CONFIG__ || {
  apiKey: "",
  authDomain: "",
  projectId: "",
  storageBucket: "",
  messagingSenderId: "",
  appId: "",
};

export const app = initializeApp(firebaseConfig);
"#;

/// In-memory stand-in for the gcloud / firebase / npm side of the world.
#[derive(Debug, Clone)]
pub struct CloudState {
    pub project_exists: bool,
    pub enabled_services: BTreeSet<String>,
    pub firebase_added: bool,
    /// (app id, display name)
    pub web_apps: Vec<(String, String)>,
    pub default_database: bool,
    pub missing_tools: Vec<String>,
    /// enable calls that fail but still turn the service on
    pub enable_fails_but_sticks: Vec<String>,
    /// enable calls that fail for good
    pub enable_fails: Vec<String>,
    pub sdk_response: Option<String>,
    /// apps:create prints plain text instead of JSON
    pub create_prints_text: bool,
    /// apps:create reports success but the app never shows up in apps:list
    pub create_loses_app: bool,
    /// projects:list misses the project and addfirebase says it already exists
    pub addfirebase_already_exists: bool,
}

impl Default for CloudState {
    fn default() -> Self {
        Self {
            project_exists: false,
            enabled_services: BTreeSet::new(),
            firebase_added: false,
            web_apps: Vec::new(),
            default_database: false,
            missing_tools: Vec::new(),
            enable_fails_but_sticks: Vec::new(),
            enable_fails: Vec::new(),
            sdk_response: None,
            create_prints_text: false,
            create_loses_app: false,
            addfirebase_already_exists: false,
        }
    }
}

pub fn sdk_config_json(app_id: &str) -> Value {
    json!({
        "apiKey": "AIzaSy-test",
        "authDomain": format!("{}.firebaseapp.com", PROJECT),
        "projectId": PROJECT,
        "storageBucket": format!("{}.firebasestorage.app", PROJECT),
        "messagingSenderId": "1234567890",
        "appId": app_id
    })
}

pub struct FakeCloud {
    pub state: Mutex<CloudState>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    pub fn new(state: CloudState) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains(needle))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn gcloud(&self, args: &[&str]) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        match args {
            ["projects", "describe", ..] => {
                if state.project_exists {
                    CommandOutput::ok(format!(r#"{{"projectId": "{}"}}"#, PROJECT))
                } else {
                    CommandOutput::failed(
                        1,
                        "ERROR: (gcloud.projects.describe) NOT_FOUND: Project not found",
                    )
                }
            }
            ["projects", "create", ..] => {
                state.project_exists = true;
                CommandOutput::ok("Create in progress for [acme-1].")
            }
            ["config", "set", "project", _] => CommandOutput::ok("Updated property [core/project]."),
            ["billing", "projects", "link", ..] => CommandOutput::ok("billingEnabled: true"),
            ["services", "list", ..] => CommandOutput::ok(
                state
                    .enabled_services
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ["services", "enable", service, ..] => {
                let service = service.to_string();
                if state.enable_fails.contains(&service) {
                    CommandOutput::failed(1, format!("ERROR: failed to enable {}", service))
                } else if state.enable_fails_but_sticks.contains(&service) {
                    state.enabled_services.insert(service.clone());
                    CommandOutput::failed(1, "ERROR: operation in progress, try again later")
                } else {
                    state.enabled_services.insert(service);
                    CommandOutput::ok("Operation finished successfully.")
                }
            }
            ["firestore", "databases", "list", ..] => {
                if state.default_database {
                    CommandOutput::ok(format!(
                        r#"[{{"name": "projects/{}/databases/(default)", "locationId": "us-central1"}}]"#,
                        PROJECT
                    ))
                } else {
                    CommandOutput::ok("[]")
                }
            }
            ["firestore", "databases", "create", ..] => {
                state.default_database = true;
                CommandOutput::ok("Success! Selected Google Cloud Firestore Native database")
            }
            ["auth", "print-access-token"] => CommandOutput::ok("ya29.fake-token\n"),
            other => CommandOutput::failed(2, format!("unexpected gcloud call: {:?}", other)),
        }
    }

    fn firebase(&self, args: &[&str]) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        match args {
            ["projects:list", "--json"] => {
                let result: Vec<Value> = if state.firebase_added {
                    vec![json!({"projectId": PROJECT, "displayName": PROJECT})]
                } else {
                    vec![json!({"projectId": "someone-else", "displayName": "other"})]
                };
                // the CLI likes to print an update banner before the payload
                CommandOutput::ok(format!(
                    "Update available 13.0.0 → 13.1.0\n{}\n",
                    json!({"status": "success", "result": result})
                ))
            }
            ["projects:addfirebase", _] => {
                if state.addfirebase_already_exists {
                    return CommandOutput::failed(
                        1,
                        "Error: Failed to add Firebase to Google Cloud Platform project. \
                         Firebase project already exists",
                    );
                }
                state.firebase_added = true;
                CommandOutput::ok("Your Firebase project is ready!")
            }
            ["apps:list", "WEB", ..] => {
                let result: Vec<Value> = state
                    .web_apps
                    .iter()
                    .map(|(id, name)| json!({"appId": id, "displayName": name, "platform": "WEB"}))
                    .collect();
                CommandOutput::ok(json!({"status": "success", "result": result}).to_string())
            }
            ["apps:create", "WEB", name, ..] => {
                let app_id = format!("1:1234567890:web:{:04}", state.web_apps.len() + 1);
                if !state.create_loses_app {
                    state.web_apps.push((app_id.clone(), name.to_string()));
                }
                if state.create_prints_text {
                    return CommandOutput::ok(format!(
                        "Creating WEB app {}... done\nApp ID: {}",
                        name, app_id
                    ));
                }
                CommandOutput::ok(format!(
                    "Create your WEB app in project {}:\n{}",
                    PROJECT,
                    json!({"status": "success", "result": {"appId": app_id, "displayName": name}})
                ))
            }
            ["apps:sdkconfig", "WEB", app_id, ..] => match state.sdk_response {
                Some(ref raw) => CommandOutput::ok(raw.clone()),
                None => CommandOutput::ok(
                    json!({
                        "status": "success",
                        "result": {
                            "fileName": "firebase-js-config.json",
                            "sdkConfig": sdk_config_json(app_id)
                        }
                    })
                    .to_string(),
                ),
            },
            ["deploy", ..] => CommandOutput::ok("Deploy complete!"),
            other => CommandOutput::failed(2, format!("unexpected firebase call: {:?}", other)),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeCloud {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));

        let output = match program {
            "which" => {
                let tool = args.first().copied().unwrap_or_default();
                let missing = self.state.lock().unwrap().missing_tools.iter().any(|t| t == tool);
                if missing {
                    CommandOutput::failed(1, "")
                } else {
                    CommandOutput::ok(format!("/usr/bin/{}\n", tool))
                }
            }
            "gcloud" => self.gcloud(args),
            "firebase" => self.firebase(args),
            "npm" => CommandOutput::ok("added 120 packages"),
            other => CommandOutput::failed(127, format!("{}: command not found", other)),
        };
        Ok(output)
    }
}

/// Identity Toolkit stand-in
#[derive(Default)]
pub struct FakeAuth {
    pub init_error: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAuth {
    pub fn failing(message: &str) -> Self {
        Self {
            init_error: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthAdmin for FakeAuth {
    async fn initialize_auth(&self, project_id: &str, access_token: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("initializeAuth {} {}", project_id, access_token));
        match self.init_error {
            Some(ref message) => Err(BootstrapError::Api {
                status: 400,
                body: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn enable_email_password(&self, project_id: &str, access_token: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("config {} {}", project_id, access_token));
        Ok(())
    }
}

/// Records progress events as strings
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Vec<String>,
}

impl ProgressSink for RecordingProgress {
    fn step_started(&mut self, step: StepKind) {
        self.events.push(format!("start {}", step.id()));
    }

    fn step_finished(&mut self, step: StepKind, outcome: &StepOutcome, _duration: Duration) {
        let kind = match outcome {
            StepOutcome::Completed { .. } => "completed",
            StepOutcome::Skipped { .. } => "skipped",
            StepOutcome::Tolerated { .. } => "tolerated",
        };
        self.events.push(format!("{} {}", kind, step.id()));
    }

    fn step_failed(&mut self, step: StepKind, _error: &BootstrapError) {
        self.events.push(format!("failed {}", step.id()));
    }
}

/// A temporary web project with the client source in place
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let public = root.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("app.js"), CLIENT_SOURCE).unwrap();
        Self { root }
    }

    pub fn alias_file(&self) -> PathBuf {
        self.root.path().join(".firebaserc")
    }

    pub fn client_config(&self) -> PathBuf {
        self.root.path().join("public").join("app.js")
    }

    pub fn options(&self) -> BootstrapOptions {
        let mut options = BootstrapOptions::new(PROJECT, "0000AA-111111-BBBBBB");
        options.alias_file = self.alias_file();
        options.client_config = self.client_config();
        options
    }
}
