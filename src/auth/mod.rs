//! Authentication Module
//! Mission: Password hashing, JWT issuance, request authentication and role gating

pub mod api;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
