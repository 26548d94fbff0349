//! Wishlist endpoints
//!
//! Every buyer or seller account keeps its own list of saved books. Each
//! write answers with the full list so a client toggle can re-render from it.

use super::{parse_id, AppState};
use crate::auth::gate::{current_account, BOOK_NOT_FOUND};
use crate::auth::models::Claims;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

const NOT_IN_WISHLIST: &str = "Book is not in your wishlist";

/// GET /api/wishlist
pub async fn list_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    let user = current_account(&state.users, &claims)?;
    wishlist_body(&state, &user.id)
}

/// POST /api/wishlist/:bookId
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(book_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = current_account(&state.users, &claims)?;
    let book_id = parse_id(&book_id, BOOK_NOT_FOUND)?;

    if !state.wishlist.add(&user.id, &book_id)? {
        return Err(ApiError::NotFound(BOOK_NOT_FOUND.to_string()));
    }
    wishlist_body(&state, &user.id)
}

/// DELETE /api/wishlist/:bookId
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(book_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = current_account(&state.users, &claims)?;
    let book_id = parse_id(&book_id, NOT_IN_WISHLIST)?;

    if !state.wishlist.remove(&user.id, &book_id)? {
        return Err(ApiError::NotFound(NOT_IN_WISHLIST.to_string()));
    }
    wishlist_body(&state, &user.id)
}

fn wishlist_body(state: &AppState, user: &Uuid) -> ApiResult<Json<Value>> {
    let books = state.wishlist.list(user)?;
    Ok(Json(json!({
        "success": true,
        "count": books.len(),
        "books": books,
    })))
}
