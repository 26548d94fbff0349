//! Authentication Models
//! Mission: Define account, credential and token data structures

use crate::models::Violation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Account roles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User, // Buyer: browse, order, rate sellers
    #[serde(rename = "seller")]
    Seller, // Catalog owner, gated by approval
    #[serde(rename = "admin")]
    Admin, // Approves sellers, sees everything
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "seller" => Some(Role::Seller),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// User or seller account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    pub is_approved: bool,
    pub ratings: f64,
    pub total_ratings: i64,
    pub books: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn is_approved_seller(&self) -> bool {
        self.role == Role::Seller && self.is_approved
    }
}

/// Account data before the password is hashed and the row is written
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(Violation::new("name", "Please enter your name"));
        }
        if self.email.trim().is_empty() {
            violations.push(Violation::new("email", "Please enter your email"));
        } else if !is_plausible_email(&self.email) {
            violations.push(Violation::new("email", "Please enter a valid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            violations.push(Violation::new(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if self.role == Role::Admin {
            violations.push(Violation::new("role", "Admin accounts cannot be registered"));
        }

        // Business details are required iff the account is a seller
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        match self.role {
            Role::Seller => {
                if blank(&self.business_name) {
                    violations.push(Violation::new("businessName", "Business name is required for sellers"));
                }
                if blank(&self.business_address) {
                    violations.push(Violation::new(
                        "businessAddress",
                        "Business address is required for sellers",
                    ));
                }
            }
            _ => {
                if !blank(&self.business_name) || !blank(&self.business_address) {
                    violations.push(Violation::new(
                        "businessName",
                        "Business details are only accepted for seller accounts",
                    ));
                }
            }
        }

        violations
    }
}

/// Trim and lowercase; every email comparison goes through here.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Administrator account (separate credential table)
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub id: Uuid,
    pub username: String,
    pub password: String, // stored as entered, see DESIGN.md
    pub created_at: String,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: String, // account id
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>, // admin tokens only
    pub exp: usize, // expiration timestamp
}

impl Claims {
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

/// Buyer registration body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
            role: Role::User,
            business_name: None,
            business_address: None,
        }
    }
}

/// Seller registration body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSellerRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub business_name: Option<String>,
    pub business_address: Option<String>,
}

impl RegisterSellerRequest {
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
            role: Role::Seller,
            business_name: self.business_name.map(|s| s.trim().to_string()),
            business_address: self.business_address.map(|s| s.trim().to_string()),
        }
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin login request body
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile update body; omitted fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Seller rating body
#[derive(Debug, Deserialize)]
pub struct RateSellerRequest {
    pub rating: f64,
}

/// Register / login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub user: User,
}

/// Admin login response
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: AdminSummary,
}

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub username: String,
    pub role: Role,
}
