//! Order endpoints
//!
//! Buyers see only their own orders; another buyer's order is reported as
//! missing. Status only ever moves out of `pending`.

use super::{parse_id, AppState};
use crate::auth::gate::{authorize, current_account};
use crate::auth::models::{Claims, Role};
use crate::error::{ApiError, ApiResult};
use crate::models::{BookStatus, CreateOrderRequest, Order, OrderItem, OrderStatus};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

const ORDER_NOT_FOUND: &str = "Order not found";

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if claims.role == Role::Admin {
        return Err(ApiError::Forbidden("Admins cannot place orders".to_string()));
    }
    let buyer = current_account(&state.users, &claims)?;
    let Json(body) = payload?;

    if body.items.is_empty() {
        return Err(ApiError::validation("items", "An order needs at least one item"));
    }

    let mut items = Vec::with_capacity(body.items.len());
    for requested in &body.items {
        if requested.quantity < 1 {
            return Err(ApiError::validation("items", "Item quantity must be at least 1"));
        }
        let book = state
            .books
            .get_book(&requested.book_id)?
            .filter(|b| b.status == BookStatus::Active)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Book {} is not available", requested.book_id))
            })?;

        items.push(OrderItem {
            book_id: book.id,
            title: book.title,
            unit_price: book.price,
            quantity: requested.quantity,
        });
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        email: buyer.email,
        total_amount: items
            .iter()
            .map(|item| item.unit_price * item.quantity as f64)
            .sum(),
        items,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    ApiError::check(order.validate())?;

    state.orders.create_order(&order)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "order": order })),
    ))
}

/// GET /api/orders (admin)
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Admin)?;
    let orders = state.orders.list_all()?;
    Ok(Json(json!({
        "success": true,
        "count": orders.len(),
        "orders": orders,
    })))
}

/// GET /api/orders/mine
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    let buyer = current_account(&state.users, &claims)?;
    let orders = state.orders.list_by_email(&buyer.email)?;
    Ok(Json(json!({
        "success": true,
        "count": orders.len(),
        "orders": orders,
    })))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = visible_order(&state, &claims, &id)?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// PATCH /api/orders/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = visible_order(&state, &claims, &id)?;
    let order = move_order(&state, order, OrderStatus::Cancelled)?;

    Ok(Json(json!({
        "success": true,
        "message": "Order cancelled",
        "order": order,
    })))
}

/// PATCH /api/orders/:id/complete (admin)
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Admin)?;
    let order = visible_order(&state, &claims, &id)?;
    let order = move_order(&state, order, OrderStatus::Completed)?;

    Ok(Json(json!({
        "success": true,
        "message": "Order completed",
        "order": order,
    })))
}

/// Load an order the caller may see. Admin sees all; everyone else only
/// orders placed under their own email.
fn visible_order(state: &AppState, claims: &Claims, raw_id: &str) -> ApiResult<Order> {
    let id = parse_id(raw_id, ORDER_NOT_FOUND)?;
    let order = state
        .orders
        .get_order(&id)?
        .ok_or_else(|| ApiError::NotFound(ORDER_NOT_FOUND.to_string()))?;

    if claims.role == Role::Admin {
        return Ok(order);
    }

    let caller = current_account(&state.users, claims)?;
    if caller.email != order.email {
        return Err(ApiError::NotFound(ORDER_NOT_FOUND.to_string()));
    }
    Ok(order)
}

fn move_order(state: &AppState, order: Order, to: OrderStatus) -> ApiResult<Order> {
    let refused = || {
        ApiError::BadRequest(format!(
            "Order is {} and can no longer be {}",
            order.status.as_str(),
            to.as_str()
        ))
    };

    if !order.status.can_transition_to(to) {
        return Err(refused());
    }
    // Another request may have moved it since it was loaded
    if !state.orders.transition(&order.id, order.status, to)? {
        return Err(refused());
    }

    state
        .orders
        .get_order(&order.id)?
        .ok_or_else(|| ApiError::NotFound(ORDER_NOT_FOUND.to_string()))
}
