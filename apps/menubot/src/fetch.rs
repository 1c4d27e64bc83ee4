//! # 時間帯の並行取得
//!
//! 朝食・昼食・夕食の 3 時間帯を独立した tokio タスクで並行取得する。
//!
//! ## 設計方針
//!
//! - **fail-fast**: 最初の API エラーでその日の処理全体を中断する。
//!   取得に失敗した時間帯を黙って空扱いにして配信することはない
//!   （欠けたメニューを成功として送るより、失敗を可視化する）
//! - **キー集合は固定**: タスクの完了順は不定だが、キーは常に
//!   ちょうど 3 つ。結果は完了順に収集する
//! - **残タスクの扱い**: 最初の失敗で `JoinSet` ごとドロップされ、
//!   実行中の兄弟タスクは破棄される

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use menubot_domain::menu::MealPeriod;
use menubot_infra::{InfraError, menu_api::MenuApi};
use serde_json::Value;
use tokio::task::JoinSet;

use crate::config::upstream_period_id;

/// 3 時間帯の生 JSON を並行取得する
///
/// # 戻り値
///
/// 成功時は `MealPeriod` をキーとした検証済み生 JSON のマップ
/// （常に 3 エントリ）。いずれかの取得が失敗すると最初のエラーを
/// そのまま返す。
pub async fn fetch_all_periods(
    api: Arc<dyn MenuApi>,
    date: NaiveDate,
) -> Result<HashMap<MealPeriod, Value>, InfraError> {
    let mut tasks = JoinSet::new();
    for meal in MealPeriod::ALL {
        let api = Arc::clone(&api);
        tasks.spawn(async move {
            let raw = api.fetch_period(upstream_period_id(meal), date).await?;
            Ok::<_, InfraError>((meal, raw))
        });
    }

    let mut results = HashMap::with_capacity(MealPeriod::ALL.len());
    while let Some(joined) = tasks.join_next().await {
        let (meal, raw) = joined
            .map_err(|e| InfraError::Unexpected(format!("取得タスクの join に失敗: {e}")))??;
        tracing::debug!(meal = meal.key(), "時間帯メニューを取得");
        results.insert(meal, raw);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use menubot_infra::mock::MockMenuApi;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn 三時間帯すべての生jsonが収集される() {
        let api = MockMenuApi::new();
        for meal in MealPeriod::ALL {
            api.set_period(
                upstream_period_id(meal),
                json!({ "status": "success", "period": { "name": meal.key(), "categories": [{}] } }),
            );
        }

        let results = fetch_all_periods(Arc::new(api), date()).await.unwrap();

        assert_eq!(results.len(), 3);
        for meal in MealPeriod::ALL {
            let raw = &results[&meal];
            assert_eq!(raw["period"]["name"], json!(meal.key()));
        }
    }

    #[tokio::test]
    async fn 一つの時間帯の取得失敗で全体が中断される() {
        let api = MockMenuApi::new();
        api.fail_period(upstream_period_id(MealPeriod::Lunch));

        let result = fetch_all_periods(Arc::new(api), date()).await;

        match result {
            Err(InfraError::Api { status, .. }) => assert_eq!(status, 503),
            other => panic!("API エラーになるべき: {other:?}"),
        }
    }
}
