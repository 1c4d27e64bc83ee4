//! # テスト用モック実装
//!
//! アプリケーション層のテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! menubot-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use menubot_domain::{
    notification::{EmailMessage, NotificationError},
    subscriber::Subscriber,
};
use serde_json::{Value, json};

use crate::{
    error::InfraError,
    menu_api::MenuApi,
    notification::NotificationSender,
    repository::{MenuCacheRepository, SubscriberRepository},
};

// ===== MockMenuApi =====

/// インメモリの MenuApi 実装
///
/// 時間帯 ID ごとに返すペイロードを登録する。`fail_period` で
/// 特定の時間帯の取得を API エラーにできる（fail-fast の検証用）。
#[derive(Clone, Default)]
pub struct MockMenuApi {
    menu_payload: Arc<Mutex<Option<Value>>>,
    period_payloads: Arc<Mutex<HashMap<String, Value>>>,
    failing_periods: Arc<Mutex<HashSet<String>>>,
}

impl MockMenuApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全時間帯メニューのペイロードを登録する
    pub fn set_menu(&self, payload: Value) {
        *self.menu_payload.lock().unwrap() = Some(payload);
    }

    /// 指定時間帯 ID のペイロードを登録する
    pub fn set_period(&self, period_id: &str, payload: Value) {
        self.period_payloads
            .lock()
            .unwrap()
            .insert(period_id.to_string(), payload);
    }

    /// 指定時間帯 ID の取得を API エラーにする
    pub fn fail_period(&self, period_id: &str) {
        self.failing_periods
            .lock()
            .unwrap()
            .insert(period_id.to_string());
    }
}

#[async_trait]
impl MenuApi for MockMenuApi {
    async fn fetch_periods(&self, _date: NaiveDate) -> Result<Value, InfraError> {
        Ok(self
            .menu_payload
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| json!({ "status": "success" })))
    }

    async fn fetch_period(&self, period_id: &str, _date: NaiveDate) -> Result<Value, InfraError> {
        if self.failing_periods.lock().unwrap().contains(period_id) {
            return Err(InfraError::api(503, "mock: period unavailable"));
        }
        Ok(self
            .period_payloads
            .lock()
            .unwrap()
            .get(period_id)
            .cloned()
            .unwrap_or_else(|| json!({ "status": "success" })))
    }
}

// ===== MockMenuCacheRepository =====

/// インメモリの MenuCacheRepository 実装
///
/// 本物と同じ upsert 意味論（日付キーで置き換え）を持つ。
#[derive(Clone, Default)]
pub struct MockMenuCacheRepository {
    rows: Arc<Mutex<HashMap<NaiveDate, String>>>,
}

impl MockMenuCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定日のキャッシュ内容を覗く（検証用）
    pub fn cached(&self, date: NaiveDate) -> Option<String> {
        self.rows.lock().unwrap().get(&date).cloned()
    }

    /// 保持している行数（検証用）
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl MenuCacheRepository for MockMenuCacheRepository {
    async fn upsert(&self, date: NaiveDate, html: &str) -> Result<(), InfraError> {
        self.rows.lock().unwrap().insert(date, html.to_string());
        Ok(())
    }

    async fn find_html(&self, date: NaiveDate) -> Result<Option<String>, InfraError> {
        Ok(self.rows.lock().unwrap().get(&date).cloned())
    }
}

// ===== MockSubscriberRepository =====

/// インメモリの SubscriberRepository 実装
#[derive(Clone, Default)]
pub struct MockSubscriberRepository {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl MockSubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(&self, subscriber: Subscriber) {
        self.subscribers.lock().unwrap().push(subscriber);
    }
}

#[async_trait]
impl SubscriberRepository for MockSubscriberRepository {
    async fn list_active(&self) -> Result<Vec<Subscriber>, InfraError> {
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect())
    }
}

// ===== MockNotificationSender =====

/// インメモリの NotificationSender 実装
///
/// 送信されたメッセージを記録する。`fail_recipient` で特定宛先の
/// 送信を失敗させられる（continue-on-error の検証用）。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing_recipients: Arc<Mutex<HashSet<String>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定宛先への送信を失敗させる
    pub fn fail_recipient(&self, to: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(to.to_string());
    }

    /// 送信済みメッセージを取得する（検証用）
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.failing_recipients.lock().unwrap().contains(&email.to) {
            return Err(NotificationError::SendFailed(format!(
                "mock: {} への送信失敗",
                email.to
            )));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn mockキャッシュのupsertは同一日付で置き換える() {
        let repo = MockMenuCacheRepository::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        repo.upsert(date, "A").await.unwrap();
        repo.upsert(date, "B").await.unwrap();

        assert_eq!(repo.row_count(), 1);
        assert_eq!(repo.find_html(date).await.unwrap().as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn 全時間帯エンドポイントの応答はparse_menuで正規化できる() {
        use menubot_domain::menu::parse::parse_menu;

        let api = MockMenuApi::new();
        api.set_menu(json!({
            "status": "success",
            "menu": {
                "date": "2024-01-01",
                "periods": [
                    { "name": "Lunch", "sort_order": 1, "categories": [] },
                    { "name": "Breakfast", "sort_order": 0, "categories": [] }
                ]
            }
        }));

        let raw = api
            .fetch_periods(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .await
            .unwrap();
        let menu = parse_menu(&raw);

        assert_eq!(menu.date, "2024-01-01");
        assert_eq!(menu.periods[0].name, "Breakfast");
        assert_eq!(menu.periods[1].name, "Lunch");
    }

    #[tokio::test]
    async fn mock購読者リポジトリはactiveのみ返す() {
        use menubot_domain::subscriber::EmailAddress;

        let repo = MockSubscriberRepository::new();
        repo.add_subscriber(Subscriber {
            email: EmailAddress::new("active@example.com").unwrap(),
            token: "tok-1".to_string(),
            active: true,
        });
        repo.add_subscriber(Subscriber {
            email: EmailAddress::new("inactive@example.com").unwrap(),
            token: "tok-2".to_string(),
            active: false,
        });

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email.as_str(), "active@example.com");
    }
}
