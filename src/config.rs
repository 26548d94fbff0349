//! Application configuration
//!
//! Loaded once at startup and handed to constructors. Nothing below reads
//! the environment after `AppConfig::from_env` returns.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Immutable process-wide configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub token_expiration_hours: i64,
    pub admin_token_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_path: "bookstore.db".to_string(),
            jwt_secret: "dev-secret-change-in-production-minimum-32-characters".to_string(),
            token_expiration_hours: 24,
            admin_token_expiration_hours: 1,
            bcrypt_cost: 12,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(v) => v.parse().context("Invalid PORT")?,
            Err(_) => defaults.port,
        };

        let database_path = resolve_data_path(env::var("DATABASE_PATH").ok(), &defaults.database_path);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let token_expiration_hours = env::var("JWT_EXPIRES_IN_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(defaults.token_expiration_hours);

        let admin_token_expiration_hours = env::var("ADMIN_TOKEN_EXPIRES_IN_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(defaults.admin_token_expiration_hours);

        // bcrypt accepts 4..=31
        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| (4..=31).contains(v))
            .unwrap_or(defaults.bcrypt_cost);

        let admin_username = env::var("ADMIN_USERNAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.admin_username);
        let admin_password = env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.admin_password);

        Ok(Self {
            port,
            database_path,
            jwt_secret,
            token_expiration_hours,
            admin_token_expiration_hours,
            bcrypt_cost,
            admin_username,
            admin_password,
        })
    }
}

fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default_filename.to_string());

    if raw == ":memory:" {
        return raw;
    }

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    // Relative paths resolve against the crate root, not the caller's cwd.
    base.join(p).to_string_lossy().to_string()
}

/// Load `.env` from the usual search path and from the crate root.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_resolves_against_manifest() {
        let path = resolve_data_path(Some("data/shop.db".to_string()), "bookstore.db");
        assert!(path.starts_with(env!("CARGO_MANIFEST_DIR")));
        assert!(path.ends_with("shop.db"));
    }

    #[test]
    fn test_blank_path_falls_back_to_default() {
        let path = resolve_data_path(Some("   ".to_string()), "bookstore.db");
        assert!(path.ends_with("bookstore.db"));
    }

    #[test]
    fn test_memory_path_kept_verbatim() {
        assert_eq!(resolve_data_path(Some(":memory:".to_string()), "x.db"), ":memory:");
    }
}
