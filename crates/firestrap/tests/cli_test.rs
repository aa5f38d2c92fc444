#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// 環境変数や設定ファイルの影響を受けないコマンドを作成
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("firestrap").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("FIRESTRAP_CONFIG")
        .env_remove("FIRESTRAP_PROJECT_ID")
        .env_remove("FIRESTRAP_BILLING_ACCOUNT");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("firestrap").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("冪等にセットアップ"))
        .stdout(predicate::str::contains("--project-id"))
        .stdout(predicate::str::contains("--billing-account"))
        .stdout(predicate::str::contains("--skip-create-project"))
        .stdout(predicate::str::contains("--skip-install"))
        .stdout(predicate::str::contains("--skip-deploy"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("firestrap").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("firestrap"));
}

/// プロジェクトIDが無い場合はエラーになることを確認
#[test]
fn test_missing_project_id() {
    let dir = tempfile::tempdir().unwrap();
    isolated(&dir)
        .arg("--billing-account")
        .arg("0000AA-111111-BBBBBB")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project-id"));
}

/// 不正なプロジェクトIDは外部コマンドを実行する前に拒否される
#[test]
fn test_invalid_project_id() {
    let dir = tempfile::tempdir().unwrap();
    isolated(&dir)
        .args(["--project-id", "Bad_Project", "--billing-account", "0000AA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid project id"));
}

/// 設定ファイルの値が使われることを確認
#[test]
fn test_settings_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("firestrap.yaml"),
        "project_id: Not_Valid\nbilling_account: 0000AA\n",
    )
    .unwrap();

    // 設定ファイルのproject_idが検証されて失敗する
    isolated(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not_Valid"));
}

/// 壊れた設定ファイルはエラーになることを確認
#[test]
fn test_broken_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.yaml");
    std::fs::write(&config, "region: [unclosed").unwrap();

    isolated(&dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("custom.yaml"));
}
