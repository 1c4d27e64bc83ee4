//! # MenuBot ドメイン層
//!
//! 食堂メニュー配信のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは外部システム（API・DB・SMTP）に一切依存しない。
//! 上流 API の生 JSON（`serde_json::Value`）を正規化した
//! 「正規ツリー」（[`menu::Menu`] / [`menu::Period`] /
//! [`menu::Category`] / [`menu::MenuItem`]）がドメインの中心となる。
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps/menubot → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`menu`] - 正規メニューツリーと多形 JSON の正規化パーサ
//! - [`subscriber`] - 購読者と値オブジェクト
//! - [`notification`] - メールメッセージと通知エラー
//! - [`error`] - ドメイン層エラー

pub mod error;
pub mod menu;
pub mod notification;
pub mod subscriber;

pub use error::DomainError;
