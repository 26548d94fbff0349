//! Catalog endpoints
//!
//! Public browsing plus the seller-scoped routes under `/api/books/seller`.
//! Seller writes go through the role gate: approval first, then existence,
//! then ownership.

use super::{parse_id, AppState};
use crate::auth::gate::{approved_seller, authorize, authorize_book, catalog_writer, BOOK_NOT_FOUND};
use crate::auth::models::{Claims, Role};
use crate::error::{ApiError, ApiResult};
use crate::models::{BookStatus, CreateBookRequest, RecordSaleRequest, UpdateBookRequest};
use crate::stats;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

/// GET /api/books
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let books = state.books.list_active()?;
    Ok(Json(json!({
        "success": true,
        "count": books.len(),
        "books": books,
    })))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let book = state
        .books
        .get_book(&id)?
        .filter(|b| b.status != BookStatus::Deleted)
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;

    Ok(Json(json!({ "success": true, "book": book })))
}

/// GET /api/books/seller
pub async fn seller_books(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Seller)?;
    let seller = claims.account_id().ok_or(ApiError::Unauthenticated)?;

    let books = state.books.list_by_seller(&seller, false)?;
    Ok(Json(json!({
        "success": true,
        "count": books.len(),
        "books": books,
    })))
}

/// POST /api/books/seller/create
pub async fn create_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let seller = approved_seller(&state.users, &claims)?;
    let Json(body) = payload?;

    let seller_name = seller
        .business_name
        .clone()
        .unwrap_or_else(|| seller.name.clone());
    let book = body.into_book(seller.id, seller_name);
    ApiError::check(book.validate())?;

    state.books.create_book(&book)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Book created successfully",
            "book": book,
        })),
    ))
}

/// PUT /api/books/seller/:id
pub async fn update_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let writer = catalog_writer(&state.users, &claims)?;
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let mut book = authorize_book(&writer, state.books.get_book(&id)?)?;

    let Json(body) = payload?;
    ApiError::check(body.apply_to(&mut book))?;

    // Deleted concurrently
    if !state.books.update_details(&book)? {
        return Err(ApiError::NotFound(BOOK_NOT_FOUND.to_string()));
    }
    info!("📝 Book updated: {}", book.id);

    Ok(Json(json!({
        "success": true,
        "message": "Book updated successfully",
        "book": book,
    })))
}

/// DELETE /api/books/seller/:id
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let writer = catalog_writer(&state.users, &claims)?;
    let id = parse_id(&id, BOOK_NOT_FOUND)?;
    let book = authorize_book(&writer, state.books.get_book(&id)?)?;

    if !state.books.mark_deleted(&book.id)? {
        return Err(ApiError::NotFound(BOOK_NOT_FOUND.to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Book deleted successfully",
    })))
}

/// GET /api/books/seller/stats
pub async fn seller_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Seller)?;
    let seller = claims.account_id().ok_or(ApiError::Unauthenticated)?;

    // Soft-deleted books keep their sales history
    let books = state.books.list_by_seller(&seller, true)?;
    let orders = state.orders.list_for_seller(&seller)?;

    Ok(Json(json!({
        "success": true,
        "stats": stats::seller_stats(&books, &orders),
    })))
}

/// POST /api/books/seller/:id/sale
pub async fn record_sale(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<RecordSaleRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let writer = catalog_writer(&state.users, &claims)?;
    let id = parse_id(&id, BOOK_NOT_FOUND)?;

    let Json(body) = payload?;
    ApiError::check(body.validate())?;

    let book = authorize_book(&writer, state.books.get_book(&id)?)?;
    let updated = state
        .books
        .record_sale(
            &book.id,
            &writer.owner_for(&book),
            body.quantity,
            body.revenue,
            body.rating,
        )?
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;

    Ok(Json(json!({ "success": true, "book": updated })))
}
