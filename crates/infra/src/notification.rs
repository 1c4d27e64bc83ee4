//! # メール送信
//!
//! 配信メールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`NotificationSender`] trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・開発）、Noop（送信スキップ・テスト用）
//! - **1 接続で逐次送信**: 宛先ごとに接続を張り直さない。送信間隔の
//!   制御（レート制限対策）は呼び出し側のディスパッチ層が担う

mod noop;
mod smtp;

use async_trait::async_trait;
use menubot_domain::notification::{EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use smtp::SmtpNotificationSender;

/// メール送信トレイト
///
/// text/plain と text/html の 2 部構成メッセージを 1 通送信する。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
