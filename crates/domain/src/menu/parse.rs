//! # メニュー JSON 正規化パーサ
//!
//! 上流 API のレスポンスは同じ論理データでもエンドポイントごとに
//! ラッパー形状が異なる。このモジュールはその多形 JSON を
//! [`Menu`] / [`Period`] の正規ツリーへ寛容に変換する。
//!
//! ## 設計方針
//!
//! - **寛容パース**: 任意フィールドの欠落・`null`・型違いは
//!   すべて中立なデフォルトへ吸収し、決してエラーにしない。
//!   エラーになるのは上流取得（インフラ層）だけである
//! - **形状プローブの明示的な優先順位**: 単一時間帯の抽出は
//!   [`resolve_period_object`] に列挙した順序付きプローブで行う。
//!   優先順位はそれ自体が仕様であり、テストで固定する
//! - **リスト矯正の一元化**: 「リストのはずのフィールド」の読み取りは
//!   すべて [`coerce_list`] を通す。スカラー・単一オブジェクトは
//!   1 要素列に、`null` は空列になる

use serde_json::Value;

use super::{Category, Menu, MenuItem, Period};

/// 上流 JSON を一日分の [`Menu`] に正規化する
///
/// ルートの `menu.date` / `menu.periods` を読み、各時間帯へ
/// [`parse_period`] と同一の抽出規則を適用したのち、
/// `sort_order` 昇順に**安定**ソートする（同順位は出現順を保つ）。
/// 他の列と同様、`periods` 中の falsy な要素はスキップされ、
/// 空の時間帯として実体化されることはない。
pub fn parse_menu(data: &Value) -> Menu {
    let menu = object_or_empty(data.get("menu"));
    let date = string_field(menu, "date");

    let mut periods: Vec<Period> = coerce_list(menu.get("periods"))
        .into_iter()
        .filter(|p| is_truthy(p))
        .map(extract_period)
        .collect();
    periods.sort_by_key(|p| p.sort_order);

    Menu { date, periods }
}

/// 上流 JSON を単一の [`Period`] に正規化する
///
/// ラッパー形状は保証されないため、[`resolve_period_object`] で
/// 実効的な時間帯オブジェクトを特定してから抽出する。
pub fn parse_period(data: &Value) -> Period {
    match resolve_period_object(data) {
        Some(obj) => extract_period(obj),
        None => Period {
            id: None,
            name: String::new(),
            sort_order: 0,
            categories: Vec::new(),
        },
    }
}

/// 実効的な時間帯オブジェクトを特定する
///
/// 既知のラッパー形状を固定の優先順位でプローブする:
///
/// 1. トップレベルの `period` キー（`{"period": {...}}`）
/// 2. `menu.periods` リストの先頭要素（`{"menu": {"periods": [...]}}`）
/// 3. ペイロード自体が時間帯に見える場合（`categories` キーを持つ）
/// 4. いずれも該当しなければ `None`（空の時間帯として扱う）
///
/// 各プローブは「該当」か「非該当」を返すだけで副作用を持たない。
/// 優先順位の変更は異なるエンドポイント間の互換性を壊すため、
/// この並びはテストで固定されている。
fn resolve_period_object(data: &Value) -> Option<&Value> {
    probe_period_key(data)
        .or_else(|| probe_menu_periods(data))
        .or_else(|| probe_bare_categories(data))
}

/// プローブ 1: トップレベルの `period` キー
fn probe_period_key(data: &Value) -> Option<&Value> {
    data.get("period").filter(|v| v.is_object() && is_truthy(v))
}

/// プローブ 2: `menu.periods` リストの先頭要素
fn probe_menu_periods(data: &Value) -> Option<&Value> {
    let periods = data.get("menu")?.get("periods").filter(|v| is_truthy(v))?;
    coerce_list(Some(periods)).into_iter().next()
}

/// プローブ 3: ペイロード自体が `categories` キーを持つ
fn probe_bare_categories(data: &Value) -> Option<&Value> {
    data.get("categories")
        .filter(|v| is_truthy(v))
        .map(|_| data)
}

/// 時間帯オブジェクトから [`Period`] を抽出する
///
/// [`parse_menu`] と [`parse_period`] の双方がこの関数を通るため、
/// ラッパー形状に関わらず抽出規則は一つしか存在しない。
fn extract_period(obj: &Value) -> Period {
    let categories = coerce_list(obj.get("categories"))
        .into_iter()
        .filter(|c| is_truthy(c))
        .map(extract_category)
        .collect();

    Period {
        id: id_field(obj, "id"),
        name: string_field(obj, "name"),
        sort_order: sort_order_field(obj),
        categories,
    }
}

fn extract_category(obj: &Value) -> Category {
    let items = coerce_list(obj.get("items"))
        .into_iter()
        .filter(|i| is_truthy(i))
        .filter_map(extract_item)
        .collect();

    Category {
        id: id_field(obj, "id"),
        name: string_field(obj, "name"),
        items,
    }
}

/// 品目を抽出する
///
/// 名前は `name` を優先し、空なら代替キー `item` へフォールバック。
/// どちらも空白のみ・欠落なら品目そのものを破棄する
/// （空名の品目は正規ツリーに決して入らない）。
fn extract_item(obj: &Value) -> Option<MenuItem> {
    let name = non_blank(string_field(obj, "name"))
        .or_else(|| non_blank(string_field(obj, "item")))?;

    Some(MenuItem {
        name,
        description: non_blank(string_field(obj, "description")),
    })
}

// ===== フィールド読み取りヘルパー =====

/// リスト型フィールドの唯一の矯正規則
///
/// - `None` / `null` → 空列
/// - 配列 → その要素列
/// - スカラー・単一オブジェクト → 1 要素列
fn coerce_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// オブジェクトでなければ空オブジェクト相当として扱う
fn object_or_empty(value: Option<&Value>) -> &Value {
    static EMPTY: Value = Value::Null;
    match value {
        Some(v) if v.is_object() => v,
        _ => &EMPTY,
    }
}

/// 文字列フィールド（欠落・型違いは空文字列）
fn string_field(obj: &Value, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// 識別子フィールド（欠落・空は `None`、数値 ID は文字列へ）
fn id_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// `sort_order` フィールド（欠落・解釈不能は 0）
///
/// 上流は数値のほか数値文字列を返すことがあるため、どちらも受ける。
fn sort_order_field(obj: &Value) -> i64 {
    match obj.get("sort_order") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// 空白のみの文字列を `None` に落とす
fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Python の truthiness に相当する判定
///
/// 上流実装が falsy な要素（`null`・空オブジェクト・空文字列）を
/// スキップしていた挙動をそのまま保つ。
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
