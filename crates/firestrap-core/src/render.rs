//! Local output artifacts: `.firebaserc` and the client config block

use crate::error::{BootstrapError, Result};
use crate::sdk_config::SdkConfig;
use regex::{NoExpand, Regex};
use serde_json::json;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

const CONFIG_BLOCK_PATTERN: &str =
    r"(?s)const\s+firebaseConfig\s*=\s*window\.__FIREBASE_CONFIG__\s*\|\|\s*\{.*?\};";

fn config_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CONFIG_BLOCK_PATTERN).expect("config block pattern is valid"))
}

/// `.firebaserc` content mapping the `default` alias to `project_id`
pub fn render_alias_file(project_id: &str) -> Result<String> {
    let value = json!({ "projects": { "default": project_id } });
    let mut rendered = serde_json::to_string_pretty(&value)?;
    rendered.push('\n');
    Ok(rendered)
}

/// The `const firebaseConfig = ...;` block for `config`.
///
/// Values are JSON-encoded, which makes them valid JavaScript string literals.
/// `}` is written as `\u007d` so no value can end the block early.
pub fn render_config_block(config: &SdkConfig) -> Result<String> {
    let mut block = String::from("const firebaseConfig = window.__FIREBASE_CONFIG__ || {\n");
    for (key, value) in config.fields() {
        let literal = serde_json::to_string(value)?.replace('}', "\\u007d");
        block.push_str(&format!("  {}: {},\n", key, literal));
    }
    block.push_str("};");
    Ok(block)
}

/// Replace the existing config block in `source` with one rendered from
/// `config`. `origin` names the file for the error message.
pub fn replace_config_block(source: &str, config: &SdkConfig, origin: &str) -> Result<String> {
    let re = config_block_regex();
    if !re.is_match(source) {
        return Err(BootstrapError::AnchorNotFound(origin.to_string()));
    }

    let block = render_config_block(config)?;
    Ok(re.replacen(source, 1, NoExpand(&block)).into_owned())
}

/// Overwrite the alias file at `path`
pub async fn write_alias_file(path: &Path, project_id: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, render_alias_file(project_id)?).await?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

async fn read_client_source(client_path: &Path) -> Result<String> {
    fs::read_to_string(client_path)
        .await
        .map_err(|source| BootstrapError::ReadFile {
            path: client_path.display().to_string(),
            source,
        })
}

/// Fail unless the client source is readable and contains the config block
pub async fn check_client_config(client_path: &Path) -> Result<()> {
    let source = read_client_source(client_path).await?;
    if !config_block_regex().is_match(&source) {
        return Err(BootstrapError::AnchorNotFound(
            client_path.display().to_string(),
        ));
    }
    Ok(())
}

/// Write both artifacts.
///
/// The client source is checked for the anchor before anything is written, so
/// a missing anchor leaves both files untouched.
pub async fn write_outputs(
    alias_path: &Path,
    client_path: &Path,
    project_id: &str,
    config: &SdkConfig,
) -> Result<()> {
    let source = read_client_source(client_path).await?;
    let updated = replace_config_block(&source, config, &client_path.display().to_string())?;

    write_alias_file(alias_path, project_id).await?;

    if updated == source {
        tracing::debug!("{} already up to date", client_path.display());
        return Ok(());
    }
    fs::write(client_path, updated).await?;
    tracing::info!("Updated firebaseConfig in {}", client_path.display());
    Ok(())
}
