use axum::{
    middleware,
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{admin, books, orders, wishlist};
use crate::auth::{api as auth_api, auth_middleware, password::PasswordHasher, JwtHandler};
use crate::config::AppConfig;
use crate::middleware::request_logging;
use crate::store::{BookStore, Database, OrderStore, UserStore, WishlistStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub books: BookStore,
    pub orders: OrderStore,
    pub wishlist: WishlistStore,
    pub jwt: Arc<JwtHandler>,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            users: UserStore::new(db.clone(), PasswordHasher::new(config.bcrypt_cost)),
            books: BookStore::new(db.clone()),
            orders: OrderStore::new(db.clone()),
            wishlist: WishlistStore::new(db),
            jwt: Arc::new(JwtHandler::from_config(config)),
        }
    }
}

/// Open the database, seed the admin account and wire the stores.
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let db = Database::open(&config.database_path)?;
    let state = AppState::new(db, config);
    state
        .users
        .ensure_default_admin(&config.admin_username, &config.admin_password)?;
    Ok(state)
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/seller/register", post(auth_api::register_seller))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/admin", post(auth_api::admin_login))
        .route("/api/books", get(books::list_books))
        .route("/api/books/:id", get(books::get_book));

    // Every path here is distinct from the public ones above
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me).put(auth_api::update_me))
        .route("/api/auth/users", get(auth_api::list_users))
        .route("/api/auth/seller/:id/approve", patch(auth_api::approve_seller))
        .route("/api/auth/seller/:id/rate", post(auth_api::rate_seller))
        .route("/api/books/seller", get(books::seller_books))
        .route("/api/books/seller/create", post(books::create_book))
        .route("/api/books/seller/stats", get(books::seller_stats))
        .route(
            "/api/books/seller/:id",
            put(books::update_book).delete(books::delete_book),
        )
        .route("/api/books/seller/:id/sale", post(books::record_sale))
        .route("/api/orders", post(orders::create_order).get(orders::list_orders))
        .route("/api/orders/mine", get(orders::my_orders))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/cancel", patch(orders::cancel_order))
        .route("/api/orders/:id/complete", patch(orders::complete_order))
        .route("/api/wishlist", get(wishlist::list_wishlist))
        .route(
            "/api/wishlist/:id",
            post(wishlist::add_to_wishlist).delete(wishlist::remove_from_wishlist),
        )
        .route("/api/admin/stats", get(admin::dashboard_stats))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
