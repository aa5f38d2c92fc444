//! 実行計画の解決
//!
//! CLIフラグ > 環境変数 > 設定ファイル > デフォルト の順で値を決定する。

use crate::Cli;
use anyhow::Context;
use colored::Colorize;
use firestrap_config::{LoadedSettings, Settings};
use firestrap_core::BootstrapOptions;
use firestrap_core::options::{DEFAULT_ALIAS_FILE, DEFAULT_CLIENT_CONFIG};
use std::path::PathBuf;

/// 解決済みの実行計画
#[derive(Debug)]
pub struct Plan {
    pub root: PathBuf,
    pub options: BootstrapOptions,
    pub settings_path: Option<PathBuf>,
}

pub fn resolve(cli: &Cli, loaded: Option<LoadedSettings>) -> anyhow::Result<Plan> {
    let (settings_path, settings) = match loaded {
        Some(loaded) => (Some(loaded.path), loaded.settings),
        None => (None, Settings::default()),
    };

    let project_id = cli.project_id.clone().or(settings.project_id).context(
        "プロジェクトIDが指定されていません (--project-id, FIRESTRAP_PROJECT_ID または設定ファイルの project_id)",
    )?;
    let billing_account = cli
        .billing_account
        .clone()
        .or(settings.billing_account)
        .context(
            "請求先アカウントが指定されていません (--billing-account, FIRESTRAP_BILLING_ACCOUNT または設定ファイルの billing_account)",
        )?;

    let mut options = BootstrapOptions::new(project_id, billing_account);
    options.project_name = cli.project_name.clone().or(settings.project_name);
    if let Some(region) = cli.region.clone().or(settings.region) {
        options.region = region;
    }
    if let Some(name) = cli.web_app_name.clone().or(settings.web_app_name) {
        options.web_app_name = name;
    }

    options.skip_create_project =
        cli.skip_create_project || settings.skip_create_project.unwrap_or(false);
    options.skip_install = cli.skip_install || settings.skip_install.unwrap_or(false);
    options.skip_deploy = cli.skip_deploy || settings.skip_deploy.unwrap_or(false);

    // 相対パスは --root 基準
    let root = cli.root.clone();
    let alias_file = cli
        .alias_file
        .clone()
        .or(settings.alias_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ALIAS_FILE));
    let client_config = cli
        .client_config
        .clone()
        .or(settings.client_config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_CONFIG));
    options.alias_file = root.join(alias_file);
    options.client_config = root.join(client_config);

    options.extra_services = settings.extra_services;
    options.deploy_only = cli.only.clone().or(settings.deploy_only);

    options.validate()?;

    Ok(Plan {
        root,
        options,
        settings_path,
    })
}

fn flag(value: bool) -> String {
    if value {
        "yes".yellow().to_string()
    } else {
        "no".to_string()
    }
}

impl Plan {
    /// 実行前に解決済みの値を表示
    pub fn print(&self) {
        let options = &self.options;

        println!("{}", "firestrap セットアップ計画".bold());
        if let Some(ref path) = self.settings_path {
            println!("  Settings:        {}", path.display().to_string().dimmed());
        }
        println!("  Project ID:      {}", options.project_id.cyan());
        println!("  Project name:    {}", options.project_display_name());
        println!("  Billing account: {}", options.billing_account);
        println!("  Region:          {}", options.region);
        println!("  Web app name:    {}", options.web_app_name);
        println!("  Services:        {}", options.required_services().join(", "));
        println!("  Alias file:      {}", options.alias_file.display());
        println!("  Client config:   {}", options.client_config.display());
        println!("  Create project:  {}", flag(!options.skip_create_project));
        println!("  Skip install:    {}", flag(options.skip_install));
        println!("  Skip deploy:     {}", flag(options.skip_deploy));
        if let Some(ref only) = options.deploy_only {
            println!("  Deploy only:     {}", only);
        }
        println!();
    }
}
