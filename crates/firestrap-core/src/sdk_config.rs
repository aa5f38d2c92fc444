//! Firebase web SDK configuration

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six fields a web client needs to talk to the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl SdkConfig {
    /// Build from the flat config map returned by `apps:sdkconfig`.
    ///
    /// Every field except `storageBucket` must be a non-empty string; a missing
    /// bucket falls back to `<projectId>.appspot.com`.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let api_key = required(map, "apiKey")?;
        let auth_domain = required(map, "authDomain")?;
        let project_id = required(map, "projectId")?;
        let messaging_sender_id = required(map, "messagingSenderId")?;
        let app_id = required(map, "appId")?;

        let storage_bucket = match optional(map, "storageBucket") {
            Some(bucket) => bucket,
            None => {
                let bucket = format!("{}.appspot.com", project_id);
                tracing::warn!("storageBucket missing from SDK config, using {}", bucket);
                bucket
            }
        };

        Ok(Self {
            api_key,
            auth_domain,
            project_id,
            storage_bucket,
            messaging_sender_id,
            app_id,
        })
    }

    /// Fields in the order they are rendered into the client config
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("apiKey", self.api_key.as_str()),
            ("authDomain", self.auth_domain.as_str()),
            ("projectId", self.project_id.as_str()),
            ("storageBucket", self.storage_bucket.as_str()),
            ("messagingSenderId", self.messaging_sender_id.as_str()),
            ("appId", self.app_id.as_str()),
        ]
    }
}

fn optional(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        // messagingSenderId has been seen as a bare number
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required(map: &Map<String, Value>, key: &'static str) -> Result<String> {
    optional(map, key).ok_or(BootstrapError::MissingSdkField(key))
}
