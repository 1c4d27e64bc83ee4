//! # MenuBot インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **上流 API クライアント**: 食堂メニュー API からの生 JSON 取得
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **リポジトリ実装**: レンダリング済み HTML キャッシュと購読者の永続化
//! - **メール送信**: SMTP（lettre）/ Noop の送信バックエンド
//!
//! ## 依存関係
//!
//! ```text
//! apps/menubot → infra → domain
//! ```
//!
//! インフラ層は `domain` にのみ依存する。ドメイン層は
//! インフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`menu_api`] - 上流メニュー API クライアント
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`repository`] - リポジトリ実装
//! - [`notification`] - メール送信実装
//! - [`error`] - インフラ層エラー定義

pub mod db;
pub mod error;
pub mod menu_api;
pub mod notification;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
