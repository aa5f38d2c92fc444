use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: firestrap.local.yaml, .firestrap.local.yaml, firestrap.yaml, .firestrap.yaml\n\
        - ~/.config/firestrap/firestrap.yaml\n\
        または FIRESTRAP_CONFIG 環境変数で直接指定できます"
    )]
    SettingsFileNotFound,

    #[error("設定ファイルの解析に失敗しました ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
