//! # 購読者
//!
//! 配信先の購読者と、そのメールアドレス値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: メールアドレスは生の `String` ではなく
//!   [`EmailAddress`] として持ち、生成時に検証する
//! - **配信対象の絞り込み**: `active` が真の購読者だけが
//!   配信対象となる（絞り込みはリポジトリ側で行う）

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// メールアドレス（値オブジェクト）
///
/// # 不変条件
///
/// - 空でない
/// - `@` を 1 つ以上含む
///
/// 厳密な RFC 検証は行わない。宛先の妥当性は最終的に SMTP 側が
/// 判定するため、ここでは明らかな不正だけを弾く。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// 検証付きでメールアドレスを生成する
    ///
    /// # エラー
    ///
    /// 空文字列、または `@` を含まない場合は
    /// [`DomainError::Validation`] を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスが空です".to_string(),
            ));
        }
        if !trimmed.contains('@') {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 購読者
///
/// `token` は退会リンクの生成に使う不透明文字列。
/// 購読者ごとに一意で、メール本文以外には露出しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    /// 配信先メールアドレス
    pub email: EmailAddress,
    /// 退会 URL 用トークン
    pub token: String,
    /// 配信対象かどうか
    pub active: bool,
}
