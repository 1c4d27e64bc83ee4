//! # MenuBot アプリケーション層
//!
//! 日次の食堂メニュー配信バッチを構成するモジュール群。
//!
//! ## パイプライン
//!
//! ```text
//! fetch（全時間帯を並行取得、fail-fast）
//!   → parse（menubot-domain の寛容な正規化）
//!   → render（HTML / プレーンテキストの決定的生成）
//!   → dispatch（キャッシュ upsert → 宛先別パーソナライズ送信）
//! ```
//!
//! 各段の依存は trait で注入されるため、バイナリの `main` が
//! 具象実装（Dine API クライアント、Postgres、SMTP）を束ねる。

pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod render;
