//! # MenuBot 配信バッチ
//!
//! 食堂の日次メニューを取得・整形し、購読者へメール配信する
//! コマンドラインバッチ。cron 等から 1 日 1 回起動される想定。
//!
//! ## 実行モード
//!
//! | モード | 指定 | 動作 |
//! |--------|------|------|
//! | 日次配信 | （フラグなし） | 取得 → レンダリング → キャッシュ → 全購読者へ送信 |
//! | 単発再送 | `--one-off ADDR` | キャッシュ済み HTML を 1 宛先へ再送（再取得しない） |
//! | ドライラン | `--no-send` | 送信だけ Noop に差し替え（キャッシュは書く） |
//! | 生 JSON 確認 | `--raw` | 検証済み生レスポンスを整形出力して終了 |
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DATABASE_URL` | DB を使うモードのみ | PostgreSQL 接続 URL |
//! | `MENUBOT_API_BASE_URL` | No | 上流 API のベース URL |
//! | `MENUBOT_LOCATION_ID` | No | 取得対象のロケーション ID |
//! | `MENUBOT_MAIL_BACKEND` | No | `smtp`（デフォルト）または `noop` |
//! | `MENUBOT_SMTP_HOST` | 送信時 | SMTP サーバーホスト |
//! | `MENUBOT_SMTP_PORT` | No | SMTP ポート（デフォルト: 587） |
//! | `MENUBOT_SMTP_USER` / `MENUBOT_SMTP_PASSWORD` | No | SMTP 認証情報 |
//! | `MENUBOT_SMTP_USE_TLS` | No | STARTTLS を使うか（デフォルト: true） |
//! | `MENUBOT_EMAIL_SENDER` | 送信時 | 送信元メールアドレス |
//! | `MENUBOT_UNSUBSCRIBE_BASE_URL` | No | 退会リンクのベース URL |
//! | `MENUBOT_SEND_DELAY_MS` | No | 宛先間の送信間隔（デフォルト: 1000） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 日次配信
//! cargo run -p menubot
//!
//! # 過去日の本文をファイルで確認（送信なし）
//! cargo run -p menubot -- --date 2024-01-01 --output menu.html --no-send
//!
//! # 配信漏れの 1 宛先へ再送
//! cargo run -p menubot -- --one-off user@example.com
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use menubot::{
    config::{AppConfig, DEFAULT_UNSUBSCRIBE_BASE_URL, EmailConfig, MailBackend},
    dispatch::{DispatchService, OneOffOutcome},
    fetch::fetch_all_periods,
    render::MenuRenderer,
};
use menubot_domain::menu::{MealPeriod, parse::parse_period};
use menubot_infra::{
    db,
    menu_api::DineApiClient,
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    repository::{PostgresMenuCacheRepository, PostgresSubscriberRepository},
};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 食堂の日次メニューを購読者へメール配信する
#[derive(Debug, Parser)]
#[command(name = "menubot", version, about)]
struct Cli {
    /// キャッシュ済み HTML を指定アドレスへ 1 通だけ再送する
    #[arg(long, value_name = "EMAIL")]
    one_off: Option<String>,

    /// 対象日（YYYY-MM-DD。省略時は今日）
    #[arg(long, value_name = "DATE")]
    date: Option<NaiveDate>,

    /// レンダリング済み HTML（--raw 時は生 JSON）を書き出すパス
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// 検証済み生レスポンスを整形出力して終了する（DB・送信なし）
    #[arg(long)]
    raw: bool,

    /// 送信を行わない（取得・レンダリング・キャッシュは行う）
    #[arg(long)]
    no_send: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menubot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::info!(%date, "MenuBot 配信バッチを開始");

    // 単発再送はキャッシュだけで完結する（取得・レンダリングなし）
    if let Some(recipient) = &cli.one_off {
        return run_one_off(&config, date, recipient, cli.no_send).await;
    }

    run_daily(&config, &cli, date).await
}

/// 日次配信モード
///
/// 取得はパイプラインの先頭で行い、失敗したらキャッシュも送信も
/// 行わずに中断する（前日分のキャッシュ行は無傷で残る）。
async fn run_daily(config: &AppConfig, cli: &Cli, date: NaiveDate) -> anyhow::Result<()> {
    let http = DineApiClient::default_http_client().context("HTTP クライアントの構築に失敗")?;
    let api = Arc::new(DineApiClient::new(
        http,
        config.api.base_url.clone(),
        config.api.location_id.clone(),
        config.api.platform,
    ));

    let raw_periods = fetch_all_periods(api, date)
        .await
        .context("時間帯メニューの取得に失敗")?;

    // 生 JSON 確認モードはここで終了（正規化もキャッシュもしない）
    if cli.raw {
        // 正規キー順の決定的な出力にする
        let mut ordered = serde_json::Map::new();
        for meal in MealPeriod::ALL {
            if let Some(raw) = raw_periods.get(&meal) {
                ordered.insert(meal.key().to_string(), raw.clone());
            }
        }
        let pretty = serde_json::to_string_pretty(&serde_json::Value::Object(ordered))
            .context("生 JSON の整形に失敗")?;
        match &cli.output {
            Some(path) => {
                std::fs::write(path, &pretty)
                    .with_context(|| format!("生 JSON の書き出しに失敗: {}", path.display()))?;
                tracing::info!(path = %path.display(), "生 JSON を書き出し");
            }
            None => println!("{pretty}"),
        }
        return Ok(());
    }

    let periods = raw_periods
        .iter()
        .map(|(meal, raw)| (*meal, parse_period(raw)))
        .collect();

    let renderer = MenuRenderer::new().context("テンプレートの初期化に失敗")?;
    let date_label = date.format("%Y-%m-%d").to_string();
    let html = renderer
        .render_html(&periods, &date_label)
        .context("HTML のレンダリングに失敗")?;
    let text = renderer.render_text(&periods);

    if let Some(path) = &cli.output {
        std::fs::write(path, &html)
            .with_context(|| format!("HTML の書き出しに失敗: {}", path.display()))?;
        tracing::info!(path = %path.display(), "レンダリング済み HTML を書き出し");
    }

    let pool = connect_database(config).await?;
    let dispatch = build_dispatch_service(&pool, cli.no_send)?;

    let report = dispatch
        .deliver_daily(date, &html, &text)
        .await
        .context("日次配信に失敗")?;

    tracing::info!(
        sent = report.sent.len(),
        failed = report.failed.len(),
        "日次配信を完了"
    );
    if report.all_failed() {
        anyhow::bail!("全 {} 宛先への送信に失敗しました", report.failed.len());
    }

    Ok(())
}

/// 単発再送モード
///
/// `--no-send` と組み合わせると、キャッシュ行の有無だけを
/// 確認するドライランになる。
async fn run_one_off(
    config: &AppConfig,
    date: NaiveDate,
    recipient: &str,
    no_send: bool,
) -> anyhow::Result<()> {
    let pool = connect_database(config).await?;
    let dispatch = build_dispatch_service(&pool, no_send)?;

    match dispatch
        .resend_cached(date, recipient)
        .await
        .context("単発再送に失敗")?
    {
        OneOffOutcome::Sent => {
            tracing::info!(to = recipient, %date, "単発再送を完了");
        }
        OneOffOutcome::NoCachedHtml => {
            tracing::info!(%date, "この日付のキャッシュが無いため送信しませんでした");
        }
    }

    Ok(())
}

/// データベースに接続し、マイグレーションを適用する
async fn connect_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = db::create_pool(config.database_url()?)
        .await
        .context("データベース接続に失敗")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗")?;
    tracing::info!("データベースに接続しました");
    Ok(pool)
}

/// リポジトリと送信バックエンドを束ねて配信サービスを構築する
///
/// `--no-send` 時はメール設定を読まず Noop 送信に差し替える。
fn build_dispatch_service(pool: &PgPool, no_send: bool) -> anyhow::Result<DispatchService> {
    let cache = Arc::new(PostgresMenuCacheRepository::new(pool.clone()));
    let subscribers = Arc::new(PostgresSubscriberRepository::new(pool.clone()));

    let (sender, unsubscribe_base_url, send_delay): (Arc<dyn NotificationSender>, String, Duration) =
        if no_send {
            tracing::info!("--no-send: 送信は Noop バックエンドに差し替え");
            (
                Arc::new(NoopNotificationSender),
                DEFAULT_UNSUBSCRIBE_BASE_URL.to_string(),
                Duration::ZERO,
            )
        } else {
            let email = EmailConfig::from_env().context("メール設定の読み込みに失敗")?;
            let sender: Arc<dyn NotificationSender> = match email.backend {
                MailBackend::Smtp => Arc::new(
                    SmtpNotificationSender::new(
                        &email.smtp_host,
                        email.smtp_port,
                        email.use_tls,
                        email.credentials.clone(),
                        email.sender.clone(),
                    )
                    .context("SMTP 送信の初期化に失敗")?,
                ),
                MailBackend::Noop => Arc::new(NoopNotificationSender),
            };
            (sender, email.unsubscribe_base_url, email.send_delay)
        };

    Ok(DispatchService::new(
        cache,
        subscribers,
        sender,
        unsubscribe_base_url,
        send_delay,
    ))
}
