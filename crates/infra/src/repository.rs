//! # リポジトリ実装
//!
//! 永続化層の trait とその PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **trait + 実装の分離**: アプリケーション層は trait にのみ依存し、
//!   テストでは `mock` モジュールのインメモリ実装に差し替える
//! - **冪等な upsert**: レンダリング済み HTML のキャッシュは日付を
//!   一意キーとした insert-or-replace で、同日の再実行で重複しない

pub mod menu_cache_repository;
pub mod subscriber_repository;

pub use menu_cache_repository::{MenuCacheRepository, PostgresMenuCacheRepository};
pub use subscriber_repository::{PostgresSubscriberRepository, SubscriberRepository};
