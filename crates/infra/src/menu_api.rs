//! # 上流メニュー API クライアント
//!
//! 食堂メニュー API（Dine On Campus 互換）から指定日・指定時間帯の
//! 生 JSON を取得する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MenuApi`] trait で取得を抽象化し、
//!   テストではモックに差し替える
//! - **検証は転送層で完結**: HTTP 200・`application/json`・
//!   本文 `status == "success"` の 3 条件をここで検証し、
//!   満たさなければ [`InfraError::Api`] を返す。正規化パーサには
//!   成功レスポンスしか渡らない
//! - **リトライなし**: 配信失敗は隠さず可視化する（設計判断）

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::error::InfraError;

/// 成功レスポンスの `status` フィールドが持つべき値
const STATUS_SUCCESS: &str = "success";

/// 上流 API への HTTP タイムアウト
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// メニュー取得トレイト
///
/// 返り値は検証済みの生 JSON。正規化はドメイン層
/// （`menubot_domain::menu::parse`）の責務であり、ここでは行わない。
#[async_trait]
pub trait MenuApi: Send + Sync {
    /// 指定日の全時間帯メニューを取得する
    ///
    /// `GET /location/{locationId}/periods?platform={n}&date=YYYY-MM-DD`
    async fn fetch_periods(&self, date: NaiveDate) -> Result<Value, InfraError>;

    /// 指定日・指定時間帯のメニューを取得する
    ///
    /// `GET /location/{locationId}/periods/{periodId}?platform={n}&date=YYYY-MM-DD`
    async fn fetch_period(&self, period_id: &str, date: NaiveDate) -> Result<Value, InfraError>;
}

/// Dine API 実装の MenuApi
///
/// `reqwest::Client` は外部から注入する（接続プールの共有と
/// テスト容易性のため）。
#[derive(Debug, Clone)]
pub struct DineApiClient {
    http: reqwest::Client,
    base_url: String,
    location_id: String,
    platform: u32,
}

impl DineApiClient {
    /// 新しいクライアントインスタンスを作成
    ///
    /// # 引数
    ///
    /// - `http`: 共有する reqwest クライアント
    /// - `base_url`: API のベース URL（末尾スラッシュなし）
    /// - `location_id`: キャンパスのロケーション ID
    /// - `platform`: API が要求するプラットフォームフラグ（web は 0）
    pub fn new(http: reqwest::Client, base_url: String, location_id: String, platform: u32) -> Self {
        Self {
            http,
            base_url,
            location_id,
            platform,
        }
    }

    /// MenuBot 標準設定の reqwest クライアントを構築する
    pub fn default_http_client() -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("MenuBot/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    /// GET を発行し、成功条件を検証した JSON を返す
    async fn request(&self, url: String, date: NaiveDate) -> Result<Value, InfraError> {
        tracing::info!(%url, %date, "上流メニュー API へ GET");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .query(&[
                ("platform", self.platform.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .map_err(InfraError::Transport)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(InfraError::Transport)?;

        validate_response(status, &content_type, &body).inspect_err(|e| {
            tracing::error!(%url, status, %content_type, error = %e, "上流 API が成功条件を満たさない応答を返した");
        })
    }
}

/// 応答の成功条件を検証し、検証済みの生 JSON を返す
///
/// 成功条件は次の 3 つをすべて満たすこと:
///
/// 1. HTTP ステータスがちょうど 200（204 等の他の 2xx は不成功）
/// 2. Content-Type が `application/json` を含む
/// 3. JSON 本文のトップレベル `status` フィールドが `"success"`
fn validate_response(status: u16, content_type: &str, body: &str) -> Result<Value, InfraError> {
    if status != 200 || !content_type.contains("application/json") {
        return Err(InfraError::api(status, body));
    }

    let data: Value = serde_json::from_str(body).map_err(|_| InfraError::api(status, body))?;

    if data.get("status").and_then(Value::as_str) != Some(STATUS_SUCCESS) {
        return Err(InfraError::api(status, body));
    }

    Ok(data)
}

#[async_trait]
impl MenuApi for DineApiClient {
    async fn fetch_periods(&self, date: NaiveDate) -> Result<Value, InfraError> {
        let url = format!("{}/location/{}/periods", self.base_url, self.location_id);
        self.request(url, date).await
    }

    async fn fetch_period(&self, period_id: &str, date: NaiveDate) -> Result<Value, InfraError> {
        let url = format!(
            "{}/location/{}/periods/{}",
            self.base_url, self.location_id, period_id
        );
        self.request(url, date).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SUCCESS_BODY: &str = r#"{ "status": "success", "menu": {} }"#;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DineApiClient>();
        assert_send_sync::<Box<dyn MenuApi>>();
    }

    #[test]
    fn 成功条件を満たす応答は生jsonとして返される() {
        let data = validate_response(200, "application/json; charset=utf-8", SUCCESS_BODY)
            .unwrap();
        assert_eq!(data["status"], "success");
    }

    #[test]
    fn ステータス200以外は2xxでもapiエラーになる() {
        // 204 No Content は JSON Content-Type でも不成功
        let err = validate_response(204, "application/json", SUCCESS_BODY).unwrap_err();
        assert!(matches!(err, InfraError::Api { status: 204, .. }));
    }

    #[test]
    fn jsonでないcontent_typeはapiエラーになる() {
        let err = validate_response(200, "text/html", SUCCESS_BODY).unwrap_err();
        assert!(matches!(err, InfraError::Api { status: 200, .. }));
    }

    #[test]
    fn 本文のstatusフィールドがsuccessでなければapiエラーになる() {
        let body = r#"{ "status": "error", "message": "location not found" }"#;
        let err = validate_response(200, "application/json", body).unwrap_err();
        match err {
            InfraError::Api { status, body } => {
                assert_eq!(status, 200);
                assert!(body.contains("location not found"));
            }
            other => panic!("API エラーになるべき: {other:?}"),
        }
    }
}
