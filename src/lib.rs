//! Bookstore Backend Library
//!
//! REST service for a bookstore: accounts with JWT auth, a seller-owned
//! catalog gated by admin approval, orders, and dashboard statistics.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod stats;
pub mod store;
