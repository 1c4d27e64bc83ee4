//! # SubscriberRepository
//!
//! 配信先購読者の読み出しを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **配信対象のみ返す**: `active = TRUE` の行だけを読む。
//!   退会済み購読者の扱いはクエリの外に漏らさない
//! - **不正行は配信を止めない**: メールアドレスとして解釈できない
//!   行は警告ログを残してスキップする（バッチ全体は続行）

use async_trait::async_trait;
use menubot_domain::subscriber::{EmailAddress, Subscriber};
use sqlx::PgPool;

use crate::error::InfraError;

/// 購読者リポジトリトレイト
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// 配信対象（active）の購読者一覧を取得する
    ///
    /// 結果はメールアドレス昇順。購読者が 0 件なら空の Vec を返す。
    async fn list_active(&self) -> Result<Vec<Subscriber>, InfraError>;
}

/// PostgreSQL 実装の SubscriberRepository
#[derive(Debug, Clone)]
pub struct PostgresSubscriberRepository {
    pool: PgPool,
}

impl PostgresSubscriberRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_active(&self) -> Result<Vec<Subscriber>, InfraError> {
        let rows: Vec<(String, String, bool)> = sqlx::query_as(
            r#"
            SELECT email, token, active
            FROM subscribers
            WHERE active = TRUE
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let subscribers = rows
            .into_iter()
            .filter_map(|(email, token, active)| match EmailAddress::new(&email) {
                Ok(email) => Some(Subscriber {
                    email,
                    token,
                    active,
                }),
                Err(e) => {
                    tracing::warn!(%email, error = %e, "不正なメールアドレスの購読者行をスキップ");
                    None
                }
            })
            .collect();

        Ok(subscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresSubscriberRepository>();
        assert_send_sync::<Box<dyn SubscriberRepository>>();
    }
}
