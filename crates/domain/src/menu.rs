//! # 正規メニューツリー
//!
//! 上流 API の不揃いな JSON を正規化した後のメニュー構造を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Menu`] | 一日分のメニュー | 日付と提供時間帯の列 |
//! | [`Period`] | 提供時間帯 | 朝食・昼食・夕食など、カテゴリを含む |
//! | [`Category`] | カテゴリ | 時間帯内の品目グループ（例: "Grill"） |
//! | [`MenuItem`] | 品目 | 表示名と任意の説明文 |
//! | [`MealPeriod`] | 正規時間帯キー | この運用で扱う 3 つの固定キー |
//!
//! ## 設計方針
//!
//! - **不変**: ツリーはパース時に一度だけ構築され、以後変更しない
//! - **順序保存**: 品目・カテゴリは上流の出現順を保持する。
//!   唯一の例外は [`Menu::periods`] で、`sort_order` 昇順に
//!   安定ソートされる
//! - **空名の品目は存在しない**: 名前が空の品目はパース段階で
//!   破棄され、正規ツリーには決して入らない

pub mod parse;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// メニューの品目
///
/// `name` は非空が保証される（空名はパース時に破棄される）。
/// 同名の品目が重複していても、上流の出現順のまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// 表示名（非空）
    pub name: String,
    /// 説明文（任意）
    pub description: Option<String>,
}

/// 品目のカテゴリ
///
/// 品目が 0 件のカテゴリも正規ツリーには保持される
/// （描画時に初めて除外される）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// 上流の識別子（欠落しうる）
    pub id: Option<String>,
    /// 表示ラベル（空の場合は描画時に "Miscellaneous" を補う）
    pub name: String,
    /// 品目列（上流の出現順）
    pub items: Vec<MenuItem>,
}

impl Category {
    /// 描画対象となる品目が 1 件以上あるか
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

/// 提供時間帯
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// 上流の識別子（欠落しうる）
    pub id: Option<String>,
    /// 表示ラベル（例: "Breakfast"）
    pub name: String,
    /// 並び順（欠落時は 0）
    pub sort_order: i64,
    /// カテゴリ列（上流の出現順）
    pub categories: Vec<Category>,
}

/// 一日分のメニュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// ISO-8601 形式の日付文字列
    pub date: String,
    /// 時間帯列（`sort_order` 昇順に安定ソート済み）
    pub periods: Vec<Period>,
}

/// 正規時間帯キー
///
/// この運用で配信対象とする 3 つの時間帯。上流の時間帯 ID との
/// 対応はアプリケーション設定（単一キャンパス固定）で束縛する。
/// 配信メール内の表示順は常に 朝食 → 昼食 → 夕食。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum MealPeriod {
    /// 朝食
    Breakfast,
    /// 昼食
    Lunch,
    /// 夕食
    Dinner,
}

impl MealPeriod {
    /// 配信メールでの固定表示順
    pub const ALL: [MealPeriod; 3] = [
        MealPeriod::Breakfast,
        MealPeriod::Lunch,
        MealPeriod::Dinner,
    ];

    /// 正規キー（snake_case）
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// 時間帯名が空だったときの描画用フォールバック
    /// （正規キーをタイトルケース化したもの）
    pub fn fallback_title(self) -> &'static str {
        match self {
            MealPeriod::Breakfast => "Breakfast",
            MealPeriod::Lunch => "Lunch",
            MealPeriod::Dinner => "Dinner",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn meal_periodの正規キーはsnake_caseで往復変換できる() {
        assert_eq!(MealPeriod::Breakfast.key(), "breakfast");
        assert_eq!(MealPeriod::Lunch.key(), "lunch");
        assert_eq!(MealPeriod::Dinner.key(), "dinner");

        assert_eq!(
            MealPeriod::from_str("breakfast").unwrap(),
            MealPeriod::Breakfast
        );
        assert_eq!(MealPeriod::from_str("dinner").unwrap(), MealPeriod::Dinner);
    }

    #[test]
    fn allの順序は朝食_昼食_夕食で固定されている() {
        assert_eq!(
            MealPeriod::ALL,
            [
                MealPeriod::Breakfast,
                MealPeriod::Lunch,
                MealPeriod::Dinner
            ]
        );
    }

    #[test]
    fn fallback_titleはタイトルケースの正規キーを返す() {
        assert_eq!(MealPeriod::Breakfast.fallback_title(), "Breakfast");
        assert_eq!(MealPeriod::Lunch.fallback_title(), "Lunch");
        assert_eq!(MealPeriod::Dinner.fallback_title(), "Dinner");
    }

    #[test]
    fn has_itemsは品目の有無を返す() {
        let empty = Category {
            id: None,
            name: "Grill".to_string(),
            items: vec![],
        };
        assert!(!empty.has_items());

        let filled = Category {
            items: vec![MenuItem {
                name: "Pancakes".to_string(),
                description: None,
            }],
            ..empty
        };
        assert!(filled.has_items());
    }
}
