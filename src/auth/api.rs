//! Authentication API Endpoints
//! Mission: Registration, login and account management

use crate::api::{blocking, parse_id, AppState};
use crate::auth::{
    gate::{authorize, current_account},
    models::{
        AdminLoginRequest, AdminLoginResponse, AdminSummary, AuthResponse, Claims, LoginRequest,
        NewUser, RateSellerRequest, RegisterRequest, RegisterSellerRequest, Role,
        UpdateProfileRequest, MIN_PASSWORD_LEN,
    },
};
use crate::error::{ApiError, ApiResult, INVALID_CREDENTIALS};
use crate::models::{is_valid_rating, Violation};
use crate::store::is_constraint_violation;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

const INVALID_ADMIN_CREDENTIALS: &str = "Invalid username or password";
const SELLER_NOT_FOUND: &str = "Seller not found";
const USER_EXISTS: &str = "User already exists";

/// Buyer registration - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(body) = payload?;
    register_account(state, body.into_new_user()).await
}

/// Seller registration - POST /api/auth/seller/register
pub async fn register_seller(
    State(state): State<AppState>,
    payload: Result<Json<RegisterSellerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(body) = payload?;
    register_account(state, body.into_new_user()).await
}

async fn register_account(
    state: AppState,
    new_user: NewUser,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    ApiError::check(new_user.validate())?;

    if state.users.get_user_by_email(&new_user.email)?.is_some() {
        return Err(ApiError::BadRequest(USER_EXISTS.to_string()));
    }

    // A concurrent registration can still win the race to the UNIQUE index
    let users = state.users.clone();
    let user = blocking(move || match users.create_user(&new_user) {
        Ok(user) => Ok(Some(user)),
        Err(e) if is_constraint_violation(&e) => Ok(None),
        Err(e) => Err(e),
    })
    .await?
    .ok_or_else(|| ApiError::BadRequest(USER_EXISTS.to_string()))?;
    let (token, expires_in) = state.jwt.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            expires_in,
            user,
        }),
    ))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(body) = payload?;
    info!("🔐 Login attempt: {}", body.email.trim());

    let users = state.users.clone();
    let email = body.email.clone();
    let user = blocking(move || users.verify_credentials(&email, &body.password))
        .await?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt: {}", body.email.trim());
            ApiError::InvalidCredentials(INVALID_CREDENTIALS)
        })?;

    let (token, expires_in) = state.jwt.generate_token(&user)?;

    info!("✅ Login successful: {} ({})", user.email, user.role.as_str());

    Ok(Json(AuthResponse {
        success: true,
        token,
        expires_in,
        user,
    }))
}

/// Admin login - POST /api/auth/admin
///
/// The stored admin password is compared as entered; see DESIGN.md.
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> ApiResult<Json<AdminLoginResponse>> {
    let Json(body) = payload?;

    let admin = state
        .users
        .verify_admin(&body.username, &body.password)?
        .ok_or_else(|| {
            warn!("❌ Failed admin login attempt: {}", body.username.trim());
            ApiError::InvalidCredentials(INVALID_ADMIN_CREDENTIALS)
        })?;

    let (token, _) = state.jwt.generate_admin_token(&admin)?;
    info!("✅ Admin login successful: {}", admin.username);

    Ok(Json(AdminLoginResponse {
        success: true,
        message: "Admin login successful".to_string(),
        token,
        user: AdminSummary {
            username: admin.username,
            role: Role::Admin,
        },
    }))
}

/// Current account - GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    if claims.role == Role::Admin {
        let admin = AdminSummary {
            username: claims.username.unwrap_or_default(),
            role: Role::Admin,
        };
        return Ok(Json(json!({ "success": true, "user": admin })));
    }

    let user = current_account(&state.users, &claims)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Update own profile - PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let user = current_account(&state.users, &claims)?;

    let mut violations = Vec::new();
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        violations.push(Violation::new("name", "Name cannot be empty"));
    }
    if body
        .password
        .as_deref()
        .is_some_and(|p| p.chars().count() < MIN_PASSWORD_LEN)
    {
        violations.push(Violation::new(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    ApiError::check(violations)?;

    let users = state.users.clone();
    let name = body.name.map(|n| n.trim().to_string());
    let updated = blocking(move || {
        users.update_profile(&user.id, name.as_deref(), body.password.as_deref())
    })
    .await?
    .ok_or(ApiError::Unauthenticated)?;

    info!("✏️  Profile updated: {}", updated.email);
    Ok(Json(json!({ "success": true, "user": updated })))
}

/// Approve a seller - PATCH /api/auth/seller/:id/approve (admin)
pub async fn approve_seller(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Admin)?;
    let id = parse_id(&id, SELLER_NOT_FOUND)?;

    let seller = state
        .users
        .approve_seller(&id)?
        .ok_or_else(|| ApiError::NotFound(SELLER_NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Seller approved",
        "user": seller,
    })))
}

/// Rate a seller - POST /api/auth/seller/:id/rate
pub async fn rate_seller(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<RateSellerRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let id = parse_id(&id, SELLER_NOT_FOUND)?;

    if !is_valid_rating(body.rating) {
        return Err(ApiError::validation("rating", "Rating must be between 0 and 5"));
    }
    if claims.account_id() == Some(id) {
        return Err(ApiError::BadRequest("You cannot rate yourself".to_string()));
    }

    let seller = state
        .users
        .rate_seller(&id, body.rating)?
        .ok_or_else(|| ApiError::NotFound(SELLER_NOT_FOUND.to_string()))?;

    info!(
        "⭐ Seller {} rated {} ({:.2} over {})",
        seller.id, body.rating, seller.ratings, seller.total_ratings
    );
    Ok(Json(json!({ "success": true, "user": seller })))
}

/// List all accounts - GET /api/auth/users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Value>> {
    authorize(&claims, Role::Admin)?;
    let users = state.users.list_users()?;

    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}
