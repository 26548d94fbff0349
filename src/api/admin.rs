use super::AppState;
use crate::auth::gate::authorize;
use crate::auth::models::{Claims, Role};
use crate::error::ApiResult;
use crate::stats;
use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

/// Store-wide dashboard - GET /api/admin/stats
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Admin)?;

    let total_books = state.books.count_books()?;
    let orders = state.orders.list_all()?;

    Ok(Json(json!({
        "success": true,
        "stats": stats::admin_stats(total_books, &orders),
    })))
}
