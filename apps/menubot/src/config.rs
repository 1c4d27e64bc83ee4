//! # MenuBot 設定
//!
//! 環境変数から配信バッチの設定を読み込む。
//!
//! ## 設計方針
//!
//! - **メール設定は遅延検証**: SMTP ホストと送信元アドレスの欠落は
//!   「送信を行うモード」でだけ致命的となる。取得・レンダリング・
//!   ファイル出力はメール設定なしでも成功できるため、
//!   [`EmailConfig::from_env`] はディスパッチ直前に呼ぶ
//! - **単一キャンパス固定**: ロケーション ID と時間帯 ID は
//!   この運用では定数（必要なら環境変数で上書き可能）

use std::{env, time::Duration};

use menubot_domain::menu::MealPeriod;
use thiserror::Error;

/// 上流 API のデフォルトベース URL
const DEFAULT_API_BASE_URL: &str = "https://api.dineoncampus.ca/v1";

/// 単一キャンパスのロケーション ID（固定）
const DEFAULT_LOCATION_ID: &str = "586d05e4ee596f6e6c04b528";

/// API が要求するプラットフォームフラグ（web は 0）
const PLATFORM: u32 = 0;

/// 各時間帯の上流 ID（ロケーション固有の固定値）
const BREAKFAST_PERIOD_ID: &str = "64e4d8c1a5f2e60d2c1b9a01";
const LUNCH_PERIOD_ID: &str = "64e4d8c1a5f2e60d2c1b9a02";
const DINNER_PERIOD_ID: &str = "64e4d8c1a5f2e60d2c1b9a03";

/// 退会リンクのデフォルトベース URL
///
/// 送信を行わないモードでもフッター生成には URL が必要になるため、
/// メール設定なしで使えるようここに置く。
pub const DEFAULT_UNSUBSCRIBE_BASE_URL: &str = "https://menubot.example.com";

/// 正規時間帯キーに対応する上流の時間帯 ID を返す
pub fn upstream_period_id(meal: MealPeriod) -> &'static str {
    match meal {
        MealPeriod::Breakfast => BREAKFAST_PERIOD_ID,
        MealPeriod::Lunch => LUNCH_PERIOD_ID,
        MealPeriod::Dinner => DINNER_PERIOD_ID,
    }
}

/// 設定エラー
///
/// 取得エラー（`InfraError`）とは別系統。メール設定の欠落は
/// 送信を伴うモードでのみ致命的になる。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値を解釈できない
    #[error("環境変数 {0} の値が不正です: {1}")]
    Invalid(&'static str, String),
}

/// アプリケーション全体の設定（メール設定を除く）
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL 接続 URL（DB を使わないモードでは未設定でよい）
    database_url: Option<String>,
    /// 上流 API 設定
    pub api: ApiConfig,
}

/// 上流 API の設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// ベース URL（末尾スラッシュなし）
    pub base_url: String,
    /// ロケーション ID
    pub location_id: String,
    /// プラットフォームフラグ
    pub platform: u32,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `DATABASE_URL` の欠落はここでは失敗にしない。DB に触れる
    /// モードが [`Self::database_url`] を呼んだ時点で検証される。
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok(),
            api: ApiConfig {
                base_url: env::var("MENUBOT_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
                location_id: env::var("MENUBOT_LOCATION_ID")
                    .unwrap_or_else(|_| DEFAULT_LOCATION_ID.to_string()),
                platform: PLATFORM,
            },
        }
    }

    /// PostgreSQL 接続 URL を取得する
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// SMTP 経由で送信
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// メール配信の設定
///
/// 送信を伴うモードでのみ必要。`from_env` はその場で検証し、
/// 欠落は [`ConfigError`] として取得エラーと区別して報告される。
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// 送信バックエンド
    pub backend: MailBackend,
    /// SMTP ホスト
    pub smtp_host: String,
    /// SMTP ポート
    pub smtp_port: u16,
    /// 送信元メールアドレス
    pub sender: String,
    /// SMTP 認証情報（不要なら `None`）
    pub credentials: Option<(String, String)>,
    /// STARTTLS を使うか
    pub use_tls: bool,
    /// 退会リンクのベース URL
    pub unsubscribe_base_url: String,
    /// 宛先間の送信間隔（上流スロットリング対策）
    pub send_delay: Duration,
}

impl EmailConfig {
    /// 環境変数からメール設定を読み込む
    ///
    /// # エラー
    ///
    /// `MENUBOT_SMTP_HOST` / `MENUBOT_EMAIL_SENDER` の欠落は
    /// [`ConfigError::Missing`]。数値・真偽値の解釈失敗は
    /// [`ConfigError::Invalid`]。
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_backend(
            &env::var("MENUBOT_MAIL_BACKEND").unwrap_or_else(|_| "smtp".to_string()),
        )?;

        let username = env::var("MENUBOT_SMTP_USER").ok();
        let password = env::var("MENUBOT_SMTP_PASSWORD").ok();

        Ok(Self {
            backend,
            smtp_host: env::var("MENUBOT_SMTP_HOST")
                .map_err(|_| ConfigError::Missing("MENUBOT_SMTP_HOST"))?,
            smtp_port: parse_port(
                "MENUBOT_SMTP_PORT",
                &env::var("MENUBOT_SMTP_PORT").unwrap_or_else(|_| "587".to_string()),
            )?,
            sender: env::var("MENUBOT_EMAIL_SENDER")
                .map_err(|_| ConfigError::Missing("MENUBOT_EMAIL_SENDER"))?,
            credentials: username.zip(password),
            use_tls: parse_bool(
                &env::var("MENUBOT_SMTP_USE_TLS").unwrap_or_else(|_| "true".to_string()),
            ),
            unsubscribe_base_url: env::var("MENUBOT_UNSUBSCRIBE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_UNSUBSCRIBE_BASE_URL.to_string()),
            send_delay: Duration::from_millis(parse_millis(
                "MENUBOT_SEND_DELAY_MS",
                &env::var("MENUBOT_SEND_DELAY_MS").unwrap_or_else(|_| "1000".to_string()),
            )?),
        })
    }
}

fn parse_backend(raw: &str) -> Result<MailBackend, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "smtp" => Ok(MailBackend::Smtp),
        "noop" => Ok(MailBackend::Noop),
        other => Err(ConfigError::Invalid(
            "MENUBOT_MAIL_BACKEND",
            other.to_string(),
        )),
    }
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(name, raw.to_string()))
}

fn parse_millis(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(name, raw.to_string()))
}

/// 真偽値の寛容な解釈（`false` / `0` / `no` 以外は真）
fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no"
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn 各時間帯に固有の上流idが割り当てられている() {
        let ids: Vec<&str> = MealPeriod::ALL.into_iter().map(upstream_period_id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| !id.is_empty()));
        // 3 つとも異なる
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[rstest]
    #[case("smtp", MailBackend::Smtp)]
    #[case("SMTP", MailBackend::Smtp)]
    #[case(" noop ", MailBackend::Noop)]
    fn バックエンド指定は大文字小文字と空白を無視して解釈される(
        #[case] raw: &str,
        #[case] expected: MailBackend,
    ) {
        assert_eq!(parse_backend(raw).unwrap(), expected);
    }

    #[test]
    fn 未知のバックエンド指定はエラーになる() {
        assert!(parse_backend("carrier-pigeon").is_err());
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    #[case("0", false)]
    #[case("no", false)]
    #[case("yes", true)]
    #[case("", true)]
    fn use_tlsの解釈はfalse系のみ偽になる(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_bool(raw), expected);
    }

    #[test]
    fn database_urlが未設定ならアクセス時にmissingエラーになる() {
        let config = AppConfig {
            database_url: None,
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                location_id: DEFAULT_LOCATION_ID.to_string(),
                platform: PLATFORM,
            },
        };
        assert!(matches!(
            config.database_url().unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        ));
    }

    #[test]
    fn ポートの解釈失敗はinvalidエラーになる() {
        let err = parse_port("MENUBOT_SMTP_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("MENUBOT_SMTP_PORT", _)));
    }
}
