//! # メールレンダラ
//!
//! 正規ツリー（時間帯マップ）から配信メールの HTML 本文と
//! プレーンテキスト本文を生成する。
//!
//! ## 設計方針
//!
//! - **純粋関数**: 同じ入力からは常にバイト単位で同一の出力を返す。
//!   ネットワーク・ストレージへの副作用はない（冪等キャッシュの前提）
//! - **ビューモデルの一元化**: 描画時デフォルトの補完
//!   （空カテゴリ名 → "Miscellaneous"、空時間帯名 → 正規キーの
//!   タイトルケース）と表示対象の絞り込みは [`build_view`] で一度だけ
//!   行い、HTML・テキストの双方が同じビューを描画する。
//!   正規ツリー自体は書き換えない
//! - **エスケープはテンプレートエンジンに委ねる**: tera は `.html`
//!   テンプレートで全変数を自動エスケープする。上流由来の文字列が
//!   生マークアップとして出力されることはない

use std::collections::HashMap;

use menubot_domain::menu::{MealPeriod, Period};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

/// 空のカテゴリ名に対する描画時デフォルト
const DEFAULT_CATEGORY_NAME: &str = "Miscellaneous";

/// レンダリングエラー
#[derive(Debug, Error)]
pub enum RenderError {
    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    Template(#[from] tera::Error),
}

/// 描画用ビューモデル（時間帯）
///
/// 描画対象の絞り込みとデフォルト補完が済んだ状態。
/// `categories` が空の時間帯は「詳細なし」のプレースホルダ行になる。
#[derive(Debug, Clone, Serialize)]
pub struct PeriodView {
    title: String,
    categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
struct CategoryView {
    name: String,
    items: Vec<ItemView>,
}

#[derive(Debug, Clone, Serialize)]
struct ItemView {
    name: String,
    description: Option<String>,
}

/// メールレンダラ
///
/// テンプレートは `include_str!` でバイナリに埋め込まれる。
pub struct MenuRenderer {
    engine: Tera,
}

impl MenuRenderer {
    /// 新しいレンダラインスタンスを作成
    pub fn new() -> Result<Self, RenderError> {
        let mut engine = Tera::default();
        engine.add_raw_template("menu.html", include_str!("../templates/menu.html"))?;
        Ok(Self { engine })
    }

    /// HTML 本文をレンダリングする
    ///
    /// 時間帯マップに存在するキーだけが 朝食 → 昼食 → 夕食 の
    /// 固定順でブロックになる。欠けているキーは空ブロックではなく
    /// 「何も出力しない」。
    pub fn render_html(
        &self,
        periods: &HashMap<MealPeriod, Period>,
        date: &str,
    ) -> Result<String, RenderError> {
        let view = build_view(periods);
        let mut context = Context::new();
        context.insert("date", date);
        context.insert("periods", &view);
        Ok(self.engine.render("menu.html", &context)?)
    }

    /// プレーンテキスト本文をレンダリングする
    ///
    /// 形式: 時間帯タイトル行、続けてカテゴリごとに
    /// `  <カテゴリ>: <品目, 品目, ...>`。品目のないカテゴリは出力せず、
    /// 時間帯の間は空行で区切る。全体の前後空白はトリムする。
    /// 日付は本文に含めない（件名側で示す）。
    pub fn render_text(&self, periods: &HashMap<MealPeriod, Period>) -> String {
        let view = build_view(periods);
        let mut out = String::new();

        for period in &view {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&period.title);
            out.push('\n');
            for category in &period.categories {
                let names: Vec<&str> = category.items.iter().map(|i| i.name.as_str()).collect();
                out.push_str(&format!("  {}: {}\n", category.name, names.join(", ")));
            }
        }

        out.trim().to_string()
    }
}

/// 時間帯マップから描画用ビューモデルを構築する
///
/// - 固定順 朝食 → 昼食 → 夕食。マップに無いキーはビューに現れない
/// - 品目 0 件のカテゴリはビューから外す（空名の品目は
///   パース段階で既に破棄されている）
/// - 描画時デフォルトをここで補完する（正規ツリーは不変のまま）
fn build_view(periods: &HashMap<MealPeriod, Period>) -> Vec<PeriodView> {
    MealPeriod::ALL
        .into_iter()
        .filter_map(|meal| periods.get(&meal).map(|period| (meal, period)))
        .map(|(meal, period)| {
            let title = if period.name.trim().is_empty() {
                meal.fallback_title().to_string()
            } else {
                period.name.clone()
            };

            let categories = period
                .categories
                .iter()
                .filter(|category| category.has_items())
                .map(|category| {
                    let items = category
                        .items
                        .iter()
                        .map(|item| ItemView {
                            name: item.name.clone(),
                            description: item.description.clone(),
                        })
                        .collect();

                    let name = if category.name.trim().is_empty() {
                        DEFAULT_CATEGORY_NAME.to_string()
                    } else {
                        category.name.clone()
                    };
                    CategoryView { name, items }
                })
                .collect();

            PeriodView { title, categories }
        })
        .collect()
}
