//! # 通知
//!
//! メール配信に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **レンダリングと送信の分離**: 本文の生成はアプリケーション層の
//!   レンダラが行い、送信はインフラ層の `NotificationSender` が担う。
//!   その境界を流れるのが [`EmailMessage`]
//! - **宛先ごとの独立性**: 1 通の失敗は他の宛先の送信に影響しない
//!   （バッチ結果の集約はディスパッチ側の責務）

use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),
}

/// メールメッセージ
///
/// レンダラの出力。text/plain と text/html の 2 部構成で
/// `NotificationSender` に渡される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to: String,
    /// 件名
    pub subject: String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}
