mod plan;
mod progress;

use clap::Parser;
use colored::Colorize;
use firestrap_core::{Bootstrapper, IdentityToolkit, ProcessRunner};
use progress::SetupLogger;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "firestrap", version)]
#[command(
    about = "Firebase / Google Cloud のWebプロジェクトを冪等にセットアップする",
    long_about = None
)]
struct Cli {
    /// GCPプロジェクトID (6〜30文字、小文字・数字・ハイフン)
    #[arg(long, env = "FIRESTRAP_PROJECT_ID")]
    project_id: Option<String>,

    /// リンクする請求先アカウントID
    #[arg(long, env = "FIRESTRAP_BILLING_ACCOUNT")]
    billing_account: Option<String>,

    /// 新規作成時のプロジェクト表示名（省略時はプロジェクトID）
    #[arg(long, env = "FIRESTRAP_PROJECT_NAME")]
    project_name: Option<String>,

    /// Firestoreのロケーション（デフォルト: us-central1）
    #[arg(long, env = "FIRESTRAP_REGION")]
    region: Option<String>,

    /// Webアプリの表示名（デフォルト: Web App）
    #[arg(long, env = "FIRESTRAP_WEB_APP_NAME")]
    web_app_name: Option<String>,

    /// プロジェクトを作成しない（既存プロジェクトが必須）
    #[arg(long, env = "FIRESTRAP_SKIP_CREATE_PROJECT")]
    skip_create_project: bool,

    /// npm install を実行しない
    #[arg(long, env = "FIRESTRAP_SKIP_INSTALL")]
    skip_install: bool,

    /// firebase deploy を実行しない
    #[arg(long, env = "FIRESTRAP_SKIP_DEPLOY")]
    skip_deploy: bool,

    /// firebase deploy --only に渡すターゲット（例: hosting）
    #[arg(long, env = "FIRESTRAP_DEPLOY_ONLY")]
    only: Option<String>,

    /// Webプロジェクトのルートディレクトリ
    #[arg(long, env = "FIRESTRAP_ROOT", default_value = ".")]
    root: PathBuf,

    /// .firebaserc の出力先（ルートからの相対パス）
    #[arg(long, env = "FIRESTRAP_ALIAS_FILE")]
    alias_file: Option<PathBuf>,

    /// firebaseConfig を書き換えるJSファイル（ルートからの相対パス）
    #[arg(long, env = "FIRESTRAP_CLIENT_CONFIG")]
    client_config: Option<PathBuf>,

    /// 設定ファイルのパス（省略時は自動検索）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ログを詳細に出力 (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 通常の出力はstdout、ログはstderr
    init_tracing(cli.verbose);

    let settings = match firestrap_config::discover_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(ref loaded) = settings {
        tracing::info!("Loaded settings from {}", loaded.path.display());
    }

    let plan = match plan::resolve(&cli, settings) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    plan.print();

    let runner = Arc::new(ProcessRunner::new().current_dir(&plan.root));
    let bootstrapper = Bootstrapper::new(plan.options, runner, Arc::new(IdentityToolkit::new()));

    let mut logger = SetupLogger::new();
    let result = bootstrapper.run(&mut logger).await;
    logger.print_summary(&bootstrapper.options().project_id);

    match result {
        Ok(result) => {
            println!();
            println!("{}", "✓ セットアップが完了しました".green().bold());
            println!("  Project ID:  {}", result.project_id.cyan());
            println!("  App ID:      {}", result.app_id.cyan());
            println!("  Hosting URL: {}", result.hosting_url.cyan().underline());
            println!(
                "  変更したステップ: {}/{}",
                result.changed(),
                result.steps.len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!(
                "{}",
                "修正後に再実行してください（完了済みのステップはスキップされます）".dimmed()
            );
            std::process::exit(1);
        }
    }
}
