pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_ENV: &str = "FIRESTRAP_CONFIG";

const CANDIDATES: [&str; 4] = [
    "firestrap.local.yaml",
    ".firestrap.local.yaml",
    "firestrap.yaml",
    ".firestrap.yaml",
];

/// 設定ファイルの内容
///
/// すべての項目は省略可能。CLIフラグと環境変数が優先される。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project_id: Option<String>,
    pub billing_account: Option<String>,
    pub project_name: Option<String>,
    pub region: Option<String>,
    pub web_app_name: Option<String>,
    pub skip_create_project: Option<bool>,
    pub skip_install: Option<bool>,
    pub skip_deploy: Option<bool>,
    pub alias_file: Option<PathBuf>,
    pub client_config: Option<PathBuf>,
    /// 必須サービスに追加で有効化するAPI
    pub extra_services: Vec<String>,
    /// `firebase deploy --only` に渡すターゲット
    pub deploy_only: Option<String>,
}

/// 読み込んだ設定とその場所
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub path: PathBuf,
    pub settings: Settings,
}

/// グローバル設定ファイルのパス (~/.config/firestrap/firestrap.yaml)
pub fn global_settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join("firestrap").join("firestrap.yaml"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 FIRESTRAP_CONFIG (直接パス指定)
/// 2. カレントディレクトリ: firestrap.local.yaml, .firestrap.local.yaml, firestrap.yaml, .firestrap.yaml
/// 3. ~/.config/firestrap/firestrap.yaml (グローバル設定)
pub fn find_settings_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. グローバル設定
    if let Ok(global) = global_settings_path() {
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

/// YAMLの設定ファイルを読み込む
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content, path)
}

fn parse_settings(content: &str, path: &Path) -> Result<Settings> {
    // 空ファイルはすべて省略と同じ扱い
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// 設定ファイルを読み込む
///
/// `explicit` が指定されていればそのファイルを読み、無ければ
/// [`find_settings_file`] で探す。見つからない場合は `Ok(None)`。
pub fn discover_settings(explicit: Option<&Path>) -> Result<Option<LoadedSettings>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_settings_file() {
            Ok(path) => path,
            Err(ConfigError::SettingsFileNotFound) => return Ok(None),
            Err(e) => return Err(e),
        },
    };

    let settings = load_settings(&path)?;
    Ok(Some(LoadedSettings { path, settings }))
}
