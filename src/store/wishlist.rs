//! Wishlist storage
//! Mission: Per-account saved books

use super::books::query_books;
use super::{now_timestamp, Database};
use crate::models::Book;
use anyhow::{Context, Result};
use rusqlite::params;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct WishlistStore {
    db: Database,
}

impl WishlistStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Save an active book. Returns false when the book is missing or not
    /// active; saving the same book twice is a no-op.
    pub fn add(&self, user: &Uuid, book: &Uuid) -> Result<bool> {
        let conn = self.db.conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO wishlist (user_id, book_id, created_at)
                 SELECT ?1, id, ?3 FROM books WHERE id = ?2 AND status = 'active'",
                params![user.to_string(), book.to_string(), now_timestamp()],
            )
            .context("Failed to add to wishlist")?;

        if inserted > 0 {
            debug!("💖 Wishlist add: {} saved {}", user, book);
            return Ok(true);
        }

        let present: bool = conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM wishlist w JOIN books b ON b.id = w.book_id
                 WHERE w.user_id = ?1 AND w.book_id = ?2 AND b.status = 'active')",
                params![user.to_string(), book.to_string()],
                |row| row.get(0),
            )
            .context("Failed to check wishlist")?;
        Ok(present)
    }

    pub fn remove(&self, user: &Uuid, book: &Uuid) -> Result<bool> {
        let conn = self.db.conn();
        let removed = conn
            .execute(
                "DELETE FROM wishlist WHERE user_id = ?1 AND book_id = ?2",
                params![user.to_string(), book.to_string()],
            )
            .context("Failed to remove from wishlist")?;
        Ok(removed > 0)
    }

    /// Saved books that are still listed, most recently saved first
    pub fn list(&self, user: &Uuid) -> Result<Vec<Book>> {
        let conn = self.db.conn();
        query_books(
            &conn,
            "status = 'active' AND id IN (SELECT book_id FROM wishlist WHERE user_id = ?1)
             ORDER BY (SELECT created_at FROM wishlist WHERE user_id = ?1 AND book_id = books.id) DESC",
            params![user.to_string()],
        )
    }
}
