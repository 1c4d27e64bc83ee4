//! Noop 送信実装
//!
//! メールを実際には送信せず、送信されるはずだった内容の要約を
//! ログに残す。`--no-send` 実行や SMTP を持たない環境向け。

use async_trait::async_trait;
use menubot_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// 何も送信しない NotificationSender
///
/// 常に成功を返すため、配信レポート上はすべて「送信済み」になる。
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            html_bytes = email.html_body.len(),
            text_bytes = email.text_body.len(),
            "noop バックエンド: 送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn 常に成功を返す() {
        let sender = NoopNotificationSender;
        let email = EmailMessage {
            to: "anyone@example.com".to_string(),
            subject: "本日のメニュー".to_string(),
            html_body: "<table></table>".to_string(),
            text_body: "Breakfast".to_string(),
        };

        assert!(sender.send_email(&email).await.is_ok());
    }
}
