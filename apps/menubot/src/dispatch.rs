//! # 配信サービス
//!
//! レンダリング済み本文のキャッシュ書き込みと、購読者への
//! 宛先別パーソナライズ送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **キャッシュが先、送信が後**: その日の HTML はまず冪等に
//!   upsert する。送信がすべて失敗してもキャッシュ行は壊れない
//!   （単発再送の原資になる）
//! - **continue-on-error**: 1 宛先の送信失敗でバッチを止めない。
//!   宛先ごとの成否は [`DispatchReport`] に集約し、
//!   「購読者ゼロ」「全滅」「一部失敗」を呼び出し側が区別できる
//! - **逐次送信**: 宛先間に固定のディレイを挟んで順に送る。
//!   送信は意図的に並列化しない（上流 SMTP のスロットリング対策）

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use menubot_domain::notification::{EmailMessage, NotificationError};
use menubot_infra::{
    InfraError,
    notification::NotificationSender,
    repository::{MenuCacheRepository, SubscriberRepository},
};
use thiserror::Error;

/// 配信エラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// キャッシュ・購読者の読み書きに失敗
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// メール送信に失敗（単発再送のみ。日次配信では宛先ごとに集約される）
    #[error(transparent)]
    Send(#[from] NotificationError),
}

/// 日次配信のバッチ結果
///
/// 宛先ごとの成否を集約する。例外による制御フローは使わない。
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// 送信に成功した宛先
    pub sent: Vec<String>,
    /// 送信に失敗した宛先とエラー内容
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    /// 送信を試みた宛先数
    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }

    /// 購読者が存在したのに 1 通も送れなかったか
    pub fn all_failed(&self) -> bool {
        self.sent.is_empty() && !self.failed.is_empty()
    }
}

/// 単発再送の結果
///
/// キャッシュ行が無い場合は「情報として通知する非エラー」であり、
/// プロセスは成功終了する。
#[derive(Debug, PartialEq, Eq)]
pub enum OneOffOutcome {
    /// キャッシュ済み HTML を送信した
    Sent,
    /// その日付のキャッシュ行が無く、送信をスキップした
    NoCachedHtml,
}

/// 配信サービス
///
/// 依存はすべて trait 経由で注入する。レンダラには依存しない
/// （本文は引数で受け取る）。
pub struct DispatchService {
    cache: Arc<dyn MenuCacheRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    sender: Arc<dyn NotificationSender>,
    unsubscribe_base_url: String,
    send_delay: Duration,
}

impl DispatchService {
    pub fn new(
        cache: Arc<dyn MenuCacheRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
        sender: Arc<dyn NotificationSender>,
        unsubscribe_base_url: String,
        send_delay: Duration,
    ) -> Self {
        Self {
            cache,
            subscribers,
            sender,
            unsubscribe_base_url,
            send_delay,
        }
    }

    /// 日次配信を実行する
    ///
    /// 1. `(日付, HTML)` を冪等に upsert
    /// 2. active な購読者を取得
    /// 3. 宛先ごとに退会フッターを差し込んで送信（間隔を空けて逐次）
    ///
    /// 個々の送信失敗はエラーにせず [`DispatchReport`] に集約する。
    pub async fn deliver_daily(
        &self,
        date: NaiveDate,
        html: &str,
        text: &str,
    ) -> Result<DispatchReport, DispatchError> {
        self.cache.upsert(date, html).await?;
        tracing::info!(%date, "レンダリング済み HTML をキャッシュに保存");

        let subscribers = self.subscribers.list_active().await?;
        if subscribers.is_empty() {
            tracing::info!(%date, "配信対象の購読者が存在しないため送信をスキップ");
            return Ok(DispatchReport::default());
        }

        let subject = subject_for(date);
        let mut report = DispatchReport::default();

        for (i, subscriber) in subscribers.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.send_delay).await;
            }

            let unsubscribe_url = format!(
                "{}/unsubscribe?token={}",
                self.unsubscribe_base_url,
                urlencoding::encode(&subscriber.token)
            );
            let message = EmailMessage {
                to: subscriber.email.to_string(),
                subject: subject.clone(),
                html_body: personalize_html(html, &unsubscribe_url),
                text_body: text.to_string(),
            };

            match self.sender.send_email(&message).await {
                Ok(()) => {
                    tracing::info!(to = %subscriber.email, %date, "配信メールを送信");
                    report.sent.push(subscriber.email.to_string());
                }
                Err(e) => {
                    tracing::error!(to = %subscriber.email, %date, error = %e, "配信メールの送信に失敗（続行）");
                    report.failed.push((subscriber.email.to_string(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// キャッシュ済み HTML を 1 宛先へ再送する
    ///
    /// 再取得・再レンダリングは行わない。キャッシュ行が無ければ
    /// 送信せず [`OneOffOutcome::NoCachedHtml`] を返す（非エラー）。
    pub async fn resend_cached(
        &self,
        date: NaiveDate,
        to: &str,
    ) -> Result<OneOffOutcome, DispatchError> {
        let Some(html) = self.cache.find_html(date).await? else {
            tracing::info!(%date, "キャッシュ済み HTML が無いため単発再送をスキップ");
            return Ok(OneOffOutcome::NoCachedHtml);
        };

        let message = EmailMessage {
            to: to.to_string(),
            subject: subject_for(date),
            html_body: html,
            text_body: "本日のメニューは HTML 表示でご確認ください。".to_string(),
        };
        self.sender.send_email(&message).await?;
        tracing::info!(%to, %date, "キャッシュ済み HTML を単発再送");

        Ok(OneOffOutcome::Sent)
    }
}

/// 配信メールの件名
fn subject_for(date: NaiveDate) -> String {
    format!("【食堂メニュー】{} の献立", date.format("%Y-%m-%d"))
}

/// 宛先別の退会フッターを HTML に差し込む
///
/// 最後の `</table>` 閉じタグの直前にフッター行を挿入する。
/// 閉じタグが見つからない場合は末尾に追記する。
fn personalize_html(html: &str, unsubscribe_url: &str) -> String {
    let footer = format!(
        "<tr><td style=\"padding:16px 24px;font-size:11px;color:#aaaaaa;\">配信停止は<a href=\"{unsubscribe_url}\" style=\"color:#aaaaaa;\">こちら</a>から。</td></tr>"
    );

    match html.rfind("</table>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + footer.len());
            out.push_str(&html[..idx]);
            out.push_str(&footer);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{footer}"),
    }
}

#[cfg(test)]
mod tests {
    use menubot_domain::subscriber::{EmailAddress, Subscriber};
    use menubot_infra::mock::{
        MockMenuCacheRepository,
        MockNotificationSender,
        MockSubscriberRepository,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn subscriber(email: &str, token: &str) -> Subscriber {
        Subscriber {
            email: EmailAddress::new(email).unwrap(),
            token: token.to_string(),
            active: true,
        }
    }

    struct Fixture {
        cache: MockMenuCacheRepository,
        subscribers: MockSubscriberRepository,
        sender: MockNotificationSender,
        service: DispatchService,
    }

    fn fixture() -> Fixture {
        let cache = MockMenuCacheRepository::new();
        let subscribers = MockSubscriberRepository::new();
        let sender = MockNotificationSender::new();
        let service = DispatchService::new(
            Arc::new(cache.clone()),
            Arc::new(subscribers.clone()),
            Arc::new(sender.clone()),
            "https://menubot.example.com".to_string(),
            Duration::ZERO,
        );
        Fixture {
            cache,
            subscribers,
            sender,
            service,
        }
    }

    const HTML: &str = "<table><tr><td>menu</td></tr></table>";

    #[tokio::test]
    async fn キャッシュのupsertは冪等で2回目は置き換えになる() {
        let f = fixture();

        f.service.deliver_daily(date(), "A", "text").await.unwrap();
        f.service.deliver_daily(date(), "B", "text").await.unwrap();

        assert_eq!(f.cache.row_count(), 1);
        assert_eq!(f.cache.cached(date()).as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn 購読者ゼロなら送信せず空のレポートを返す() {
        let f = fixture();

        let report = f.service.deliver_daily(date(), HTML, "text").await.unwrap();

        assert_eq!(report.attempted(), 0);
        assert!(!report.all_failed());
        assert!(f.sender.sent_emails().is_empty());
        // キャッシュは購読者の有無に関係なく書かれる
        assert_eq!(f.cache.cached(date()).as_deref(), Some(HTML));
    }

    #[tokio::test]
    async fn 宛先ごとに退会フッターがパーソナライズされる() {
        let f = fixture();
        f.subscribers.add_subscriber(subscriber("a@example.com", "tok-a"));
        f.subscribers.add_subscriber(subscriber("b@example.com", "tok b/2"));

        let report = f.service.deliver_daily(date(), HTML, "text").await.unwrap();
        assert_eq!(report.sent.len(), 2);

        let sent = f.sender.sent_emails();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].html_body.contains("unsubscribe?token=tok-a"));
        // トークンは URL エンコードされる
        assert!(sent[1].html_body.contains("unsubscribe?token=tok%20b%2F2"));
        // テキスト本文は全宛先で共通
        assert_eq!(sent[0].text_body, sent[1].text_body);
    }

    #[tokio::test]
    async fn 送信失敗しても残りの宛先への配信は続行される() {
        let f = fixture();
        f.subscribers.add_subscriber(subscriber("a@example.com", "t1"));
        f.subscribers.add_subscriber(subscriber("b@example.com", "t2"));
        f.subscribers.add_subscriber(subscriber("c@example.com", "t3"));
        f.sender.fail_recipient("b@example.com");

        let report = f.service.deliver_daily(date(), HTML, "text").await.unwrap();

        assert_eq!(report.sent, vec!["a@example.com", "c@example.com"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b@example.com");
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn 全宛先失敗でもキャッシュ行は書き込み済みのまま残る() {
        let f = fixture();
        f.subscribers.add_subscriber(subscriber("a@example.com", "t1"));
        f.sender.fail_recipient("a@example.com");

        let report = f.service.deliver_daily(date(), HTML, "text").await.unwrap();

        assert!(report.all_failed());
        assert_eq!(f.cache.cached(date()).as_deref(), Some(HTML));
    }

    #[tokio::test]
    async fn キャッシュが無い日付の単発再送は送信せず情報結果を返す() {
        let f = fixture();

        let outcome = f
            .service
            .resend_cached(date(), "one@example.com")
            .await
            .unwrap();

        assert_eq!(outcome, OneOffOutcome::NoCachedHtml);
        assert!(f.sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn 単発再送はキャッシュ済みhtmlをそのまま1宛先へ送る() {
        let f = fixture();
        f.cache.upsert(date(), HTML).await.unwrap();

        let outcome = f
            .service
            .resend_cached(date(), "one@example.com")
            .await
            .unwrap();

        assert_eq!(outcome, OneOffOutcome::Sent);
        let sent = f.sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "one@example.com");
        // 再レンダリングもフッター差し込みもしない
        assert_eq!(sent[0].html_body, HTML);
    }

    #[tokio::test]
    async fn 単発再送はnoopバックエンドでもドライランとして成立する() {
        use menubot_infra::notification::NoopNotificationSender;

        let cache = MockMenuCacheRepository::new();
        cache.upsert(date(), HTML).await.unwrap();
        let service = DispatchService::new(
            Arc::new(cache),
            Arc::new(MockSubscriberRepository::new()),
            Arc::new(NoopNotificationSender),
            "https://menubot.example.com".to_string(),
            Duration::ZERO,
        );

        let outcome = service
            .resend_cached(date(), "one@example.com")
            .await
            .unwrap();
        assert_eq!(outcome, OneOffOutcome::Sent);
    }

    #[test]
    fn フッターは最後のtable閉じタグの直前に差し込まれる() {
        let html = "<table><tr><td><table></table></td></tr></table>";
        let out = personalize_html(html, "https://x/unsubscribe?token=t");

        assert!(out.ends_with("</td></tr></table>"));
        let footer_pos = out.find("配信停止").unwrap();
        let last_close = out.rfind("</table>").unwrap();
        assert!(footer_pos < last_close);
        // 内側の </table> より後ろにある
        let inner_close = out.find("</table>").unwrap();
        assert!(footer_pos > inner_close);
    }

    #[test]
    fn table閉じタグが無いhtmlには末尾にフッターを追記する() {
        let out = personalize_html("<p>menu</p>", "https://x/unsubscribe?token=t");
        assert!(out.starts_with("<p>menu</p>"));
        assert!(out.contains("配信停止"));
    }
}
