//! # インフラ層エラー定義
//!
//! 上流 API・データベース・メール送信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **API エラーの一本化**: ネットワーク断・非 200・Content-Type 不正・
//!   `status` フィールド不成功は、いずれも当該実行を中断させる
//!   致命的エラーとして扱う。リトライは設計上存在しない
//!   （配信失敗は隠さず可視化する）
//! - **本文の切り詰め**: API エラーに添えるレスポンス本文はログ肥大を
//!   避けるため先頭 200 文字に切り詰める

use thiserror::Error;

/// API エラーに保持するレスポンス本文の最大長
const BODY_SNIPPET_LEN: usize = 200;

/// インフラ層で発生するエラー
#[derive(Debug, Error)]
pub enum InfraError {
    /// 上流 API の応答が成功条件を満たさない
    ///
    /// 非 200 ステータス、`application/json` でない Content-Type、
    /// または JSON 本文の `status` フィールドが成功を示さない場合。
    #[error("API エラー: status={status} body={body}")]
    Api {
        /// HTTP ステータスコード
        status: u16,
        /// レスポンス本文の先頭断片（最大 200 文字）
        body: String,
    },

    /// 上流 API へのリクエスト自体が失敗
    ///
    /// 名前解決失敗、接続断、タイムアウトなど。
    #[error("API リクエスト失敗: {0}")]
    Transport(#[source] reqwest::Error),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] sqlx::Error),

    /// 予期しないエラー
    ///
    /// タスクの join 失敗など、上記に分類できないもの。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    /// 本文を切り詰めて API エラーを生成する
    pub fn api(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            body: truncate_body(body),
        }
    }
}

/// レスポンス本文を UTF-8 境界を保って切り詰める
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_SNIPPET_LEN {
        body.to_string()
    } else {
        body.chars().take(BODY_SNIPPET_LEN).collect()
    }
}
