//! # MenuCacheRepository
//!
//! レンダリング済みメール HTML の日付キーキャッシュを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **日付で一意**: `menu_date` が一意キー。同日の再レンダリングは
//!   既存行を置き換える（重複行は生まれない）
//! - **HTML のみ保持**: 正規ツリーは保存しない。単発再送はこの
//!   キャッシュから HTML を読み、再取得・再レンダリングを行わない

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::InfraError;

/// メニュー HTML キャッシュリポジトリトレイト
#[async_trait]
pub trait MenuCacheRepository: Send + Sync {
    /// 指定日のレンダリング済み HTML を upsert する
    ///
    /// 同じ日付への 2 回目以降の呼び出しは既存の HTML を置き換える。
    async fn upsert(&self, date: NaiveDate, html: &str) -> Result<(), InfraError>;

    /// 指定日のキャッシュ済み HTML を取得する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(html))`: キャッシュ行が存在する場合
    /// - `Ok(None)`: その日付の行がない場合
    async fn find_html(&self, date: NaiveDate) -> Result<Option<String>, InfraError>;
}

/// PostgreSQL 実装の MenuCacheRepository
#[derive(Debug, Clone)]
pub struct PostgresMenuCacheRepository {
    pool: PgPool,
}

impl PostgresMenuCacheRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuCacheRepository for PostgresMenuCacheRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn upsert(&self, date: NaiveDate, html: &str) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO menu_email_cache (menu_date, html, rendered_at)
            VALUES ($1, $2, now())
            ON CONFLICT (menu_date)
            DO UPDATE SET html = EXCLUDED.html, rendered_at = now()
            "#,
        )
        .bind(date)
        .bind(html)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_html(&self, date: NaiveDate) -> Result<Option<String>, InfraError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT html FROM menu_email_cache WHERE menu_date = $1")
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(html,)| html))
    }
}
