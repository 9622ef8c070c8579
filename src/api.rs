use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::models::{FilteredTable, OutputRecord};
use crate::query;

pub fn router(table: Arc<FilteredTable>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/data", get(get_data))
        .with_state(table)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}

/// Last `category` pair wins; an absent parameter reads as the empty label.
fn category_param(pairs: &[(String, String)]) -> &str {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == "category")
        .map(|(_, value)| value.as_str())
        .unwrap_or_default()
}

// Raw pairs so that repeated or unexpected keys can never reject the request.
async fn get_data(
    State(table): State<Arc<FilteredTable>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<Vec<OutputRecord>> {
    let category = category_param(&pairs);
    let records = query::select(&table, category);
    debug!(
        category = %category,
        sub_group = ?query::subgroup_for(category),
        rows = records.len(),
        "served data query"
    );
    Json(records)
}
