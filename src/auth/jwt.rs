//! JWT Token Handler
//! Mission: Generate and validate JWT tokens securely

use crate::auth::models::{AdminAccount, Claims, Role, User};
use crate::config::AppConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Token verification failure. Deliberately carries no detail: malformed,
/// expired and forged tokens all look the same to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    expiration_hours: i64,
    admin_expiration_hours: i64,
}

impl JwtHandler {
    pub fn new(secret: String, expiration_hours: i64, admin_expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
            admin_expiration_hours,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.token_expiration_hours,
            config.admin_token_expiration_hours,
        )
    }

    /// Generate a token for a buyer or seller account
    pub fn generate_token(&self, user: &User) -> Result<(String, usize)> {
        debug!(
            "Generating JWT for {} ({}), expires in {}h",
            user.email,
            user.role.as_str(),
            self.expiration_hours
        );
        self.issue(user.id.to_string(), user.role, None, self.expiration_hours)
    }

    /// Generate a token for an administrator; embeds the username
    pub fn generate_admin_token(&self, admin: &AdminAccount) -> Result<(String, usize)> {
        debug!(
            "Generating admin JWT for {}, expires in {}h",
            admin.username, self.admin_expiration_hours
        );
        self.issue(
            admin.id.to_string(),
            Role::Admin,
            Some(admin.username.clone()),
            self.admin_expiration_hours,
        )
    }

    fn issue(
        &self,
        id: String,
        role: Role,
        username: Option<String>,
        hours: i64,
    ) -> Result<(String, usize)> {
        let expiration = Utc::now()
            .checked_add_signed(chrono::Duration::hours(hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = (hours * 3600) as usize;

        let claims = Claims {
            id,
            role,
            username,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, InvalidToken> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("Rejected JWT: {}", e);
            InvalidToken
        })?;

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn handler(secret: &str) -> JwtHandler {
        JwtHandler::new(secret.to_string(), 24, 1)
    }

    fn create_test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Seller,
            business_name: Some("Acme Books".to_string()),
            business_address: Some("1 Main St".to_string()),
            is_approved: false,
            ratings: 0.0,
            total_ratings: 0,
            books: vec![],
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = handler("test-secret-key-12345");
        let user = create_test_user();

        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 24 * 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.id, user.id.to_string());
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.username, None);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_token_payload_fields() {
        let handler = handler("test-secret-key-12345");
        let user = create_test_user();
        let (token, _) = handler.generate_token(&user).unwrap();

        let payload = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret("test-secret-key-12345".as_bytes()),
            &Validation::default(),
        )
        .unwrap()
        .claims;

        assert_eq!(payload["id"], user.id.to_string());
        assert_eq!(payload["role"], "seller");
        assert!(payload["exp"].is_u64());
        assert!(payload.get("sub").is_none());
    }

    #[test]
    fn test_admin_token_embeds_username() {
        let handler = handler("test-secret-key-12345");
        let admin = AdminAccount {
            id: Uuid::new_v4(),
            username: "root".to_string(),
            password: "pw".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let (token, expires_in) = handler.generate_admin_token(&admin).unwrap();
        assert_eq!(expires_in, 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.username.as_deref(), Some("root"));
    }

    #[test]
    fn test_failures_are_indistinguishable() {
        let handler1 = handler("secret1");
        let handler2 = handler("secret2");
        let (token, _) = handler1.generate_token(&create_test_user()).unwrap();

        let expired_claims = Claims {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            username: None,
            exp: (Utc::now().timestamp() - 3600) as usize,
        };
        let expired = encode(
            &Header::default(),
            &expired_claims,
            &EncodingKey::from_secret("secret1".as_bytes()),
        )
        .unwrap();

        assert_eq!(handler1.validate_token("invalid.token.here"), Err(InvalidToken));
        assert_eq!(handler2.validate_token(&token), Err(InvalidToken));
        assert_eq!(handler1.validate_token(&expired), Err(InvalidToken));
    }
}
