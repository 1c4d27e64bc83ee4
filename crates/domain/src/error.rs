//! # ドメイン層エラー定義
//!
//! ビジネスルール違反を表現するエラー型。
//! メニュー正規化（[`crate::menu::parse`]）は寛容パースのため
//! エラーを返さない。ここで扱うのは値オブジェクトの検証エラーのみ。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// 値オブジェクトのバリデーション失敗
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
