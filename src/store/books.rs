//! Catalog storage
//! Mission: Books, seller ownership and sale counters

use super::{column_datetime, column_enum, column_uuid, now_timestamp, timestamp, Database};
use crate::models::{Book, BookStatus, RatingAggregate};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

const BOOK_COLUMNS: &str = "id, title, author, description, category, price, old_price, stock,
     image_url, status, seller_id, seller_name, rating_average, rating_count, sold_count,
     revenue, created_at, updated_at, trending";

/// Book storage on the shared database
#[derive(Clone)]
pub struct BookStore {
    db: Database,
}

impl BookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_book(&self, book: &Book) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO books (id, title, author, description, category, price, old_price,
                 stock, image_url, status, seller_id, seller_name, rating_average, rating_count,
                 sold_count, revenue, created_at, updated_at, trending)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                 ?19)",
            params![
                book.id.to_string(),
                book.title,
                book.author,
                book.description,
                book.category,
                book.price,
                book.old_price,
                book.stock,
                book.image_url,
                book.status.as_str(),
                book.seller.to_string(),
                book.seller_name,
                book.rating.average,
                book.rating.count,
                book.sold_count,
                book.revenue,
                timestamp(book.created_at),
                timestamp(book.updated_at),
                book.trending,
            ],
        )
        .context("Failed to insert book")?;

        info!("📚 Book created: {} by seller {}", book.title, book.seller);
        Ok(())
    }

    pub fn get_book(&self, id: &Uuid) -> Result<Option<Book>> {
        let conn = self.db.conn();
        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![id.to_string()],
            book_from_row,
        )
        .optional()
        .context("Failed to load book")
    }

    /// Public catalog: active books, newest first
    pub fn list_active(&self) -> Result<Vec<Book>> {
        let conn = self.db.conn();
        query_books(
            &conn,
            "status = 'active' ORDER BY created_at DESC, rowid DESC",
            params![],
        )
    }

    /// A seller's books in creation order
    pub fn list_by_seller(&self, seller: &Uuid, include_deleted: bool) -> Result<Vec<Book>> {
        let conn = self.db.conn();
        let predicate = if include_deleted {
            "seller_id = ?1 ORDER BY created_at, rowid"
        } else {
            "seller_id = ?1 AND status != 'deleted' ORDER BY created_at, rowid"
        };
        query_books(&conn, predicate, params![seller.to_string()])
    }

    /// Write back the editable fields. Counters, rating and owner are never touched here.
    pub fn update_details(&self, book: &Book) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                "UPDATE books SET title = ?2, author = ?3, description = ?4, category = ?5,
                     price = ?6, old_price = ?7, stock = ?8, image_url = ?9, status = ?10,
                     updated_at = ?11, trending = ?12
                 WHERE id = ?1 AND status != 'deleted'",
                params![
                    book.id.to_string(),
                    book.title,
                    book.author,
                    book.description,
                    book.category,
                    book.price,
                    book.old_price,
                    book.stock,
                    book.image_url,
                    book.status.as_str(),
                    timestamp(book.updated_at),
                    book.trending,
                ],
            )
            .context("Failed to update book")?;
        Ok(changed > 0)
    }

    /// Soft delete; the row stays for order history and seller stats.
    pub fn mark_deleted(&self, id: &Uuid) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                "UPDATE books SET status = 'deleted', updated_at = ?2
                 WHERE id = ?1 AND status != 'deleted'",
                params![id.to_string(), now_timestamp()],
            )
            .context("Failed to delete book")?;

        if changed > 0 {
            info!("🗑️  Book deleted: {}", id);
        }
        Ok(changed > 0)
    }

    /// Add a sale to the book's counters and optionally fold in a rating.
    ///
    /// One UPDATE computes every new value from the pre-update row, and the
    /// `seller_id` predicate makes the ownership check part of the same
    /// statement. `None` means no such book for this seller.
    pub fn record_sale(
        &self,
        book_id: &Uuid,
        seller_id: &Uuid,
        quantity: i64,
        revenue: f64,
        rating: Option<f64>,
    ) -> Result<Option<Book>> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                "UPDATE books SET
                     sold_count = sold_count + ?3,
                     revenue = revenue + ?4,
                     rating_average = CASE WHEN ?5 IS NULL THEN rating_average
                         ELSE (rating_average * rating_count + ?5) / (rating_count + 1) END,
                     rating_count = CASE WHEN ?5 IS NULL THEN rating_count
                         ELSE rating_count + 1 END,
                     updated_at = ?6
                 WHERE id = ?1 AND seller_id = ?2 AND status != 'deleted'",
                params![
                    book_id.to_string(),
                    seller_id.to_string(),
                    quantity,
                    revenue,
                    rating,
                    now_timestamp(),
                ],
            )
            .context("Failed to record sale")?;

        if changed == 0 {
            return Ok(None);
        }

        info!(
            "💰 Sale recorded: book {} qty {} revenue {:.2}",
            book_id, quantity, revenue
        );

        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![book_id.to_string()],
            book_from_row,
        )
        .optional()
        .context("Failed to reload book")
    }

    /// Books not soft-deleted
    pub fn count_books(&self) -> Result<i64> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM books WHERE status != 'deleted'",
            [],
            |row| row.get(0),
        )
        .context("Failed to count books")
    }
}

pub(super) fn query_books(conn: &Connection, predicate: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Book>> {
    let sql = format!("SELECT {} FROM books WHERE {}", BOOK_COLUMNS, predicate);
    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map(args, book_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load books")?;
    Ok(books)
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: column_uuid(row, 0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        price: row.get(5)?,
        old_price: row.get(6)?,
        stock: row.get(7)?,
        image_url: row.get(8)?,
        status: column_enum(row, 9, BookStatus::from_str)?,
        seller: column_uuid(row, 10)?,
        seller_name: row.get(11)?,
        rating: RatingAggregate {
            average: row.get(12)?,
            count: row.get(13)?,
        },
        sold_count: row.get(14)?,
        revenue: row.get(15)?,
        created_at: column_datetime(row, 16)?,
        updated_at: column_datetime(row, 17)?,
        trending: row.get(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateBookRequest;
    use crate::store::test_support::{create_seller, create_test_db, user_store};

    fn new_book(seller: Uuid, title: &str) -> Book {
        CreateBookRequest {
            title: title.to_string(),
            author: "Author".to_string(),
            description: "Description".to_string(),
            category: "fiction".to_string(),
            price: 10.0,
            old_price: None,
            stock: 5,
            image_url: "/uploads/cover.jpg".to_string(),
            trending: false,
        }
        .into_book(seller, "Acme Books".to_string())
    }

    fn setup() -> (BookStore, Uuid, tempfile::NamedTempFile) {
        let (db, temp) = create_test_db();
        let users = user_store(&db);
        let seller = create_seller(&users, "seller@example.com", true);
        (BookStore::new(db), seller.id, temp)
    }

    #[test]
    fn test_create_and_get_book() {
        let (store, seller, _temp) = setup();
        let book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();

        let loaded = store.get_book(&book.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Dune");
        assert_eq!(loaded.seller, seller);
        assert_eq!(loaded.status, BookStatus::Active);
        assert!(!loaded.trending);
        assert_eq!(timestamp(loaded.created_at), timestamp(book.created_at));
    }

    #[test]
    fn test_sales_are_additive() {
        let (store, seller, _temp) = setup();
        let book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();

        store.record_sale(&book.id, &seller, 2, 20.0, None).unwrap().unwrap();
        let after = store.record_sale(&book.id, &seller, 3, 30.0, None).unwrap().unwrap();

        assert_eq!(after.sold_count, 5);
        assert_eq!(after.revenue, 50.0);
        assert_eq!(after.rating.count, 0);
    }

    #[test]
    fn test_first_rating_is_exact() {
        let (store, seller, _temp) = setup();
        let book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();

        let after = store
            .record_sale(&book.id, &seller, 1, 10.0, Some(3.7))
            .unwrap()
            .unwrap();
        assert_eq!(after.rating.average, 3.7);
        assert_eq!(after.rating.count, 1);
    }

    #[test]
    fn test_sequential_ratings_average() {
        let (store, seller, _temp) = setup();
        let book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();

        let mut last = None;
        for rating in [4.0, 5.0, 3.0] {
            last = store.record_sale(&book.id, &seller, 1, 10.0, Some(rating)).unwrap();
        }
        let last = last.unwrap();
        assert_eq!(last.rating.average, 4.0);
        assert_eq!(last.rating.count, 3);
    }

    #[test]
    fn test_sale_rejected_for_other_seller() {
        let (store, seller, _temp) = setup();
        let book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();

        let stranger = Uuid::new_v4();
        assert!(store.record_sale(&book.id, &stranger, 1, 10.0, None).unwrap().is_none());

        let untouched = store.get_book(&book.id).unwrap().unwrap();
        assert_eq!(untouched.sold_count, 0);
        assert_eq!(untouched.revenue, 0.0);
    }

    #[test]
    fn test_soft_delete_hides_from_listings() {
        let (store, seller, _temp) = setup();
        let keep = new_book(seller, "Keep");
        let gone = new_book(seller, "Gone");
        store.create_book(&keep).unwrap();
        store.create_book(&gone).unwrap();

        assert!(store.mark_deleted(&gone.id).unwrap());
        assert!(!store.mark_deleted(&gone.id).unwrap());

        let active: Vec<_> = store.list_active().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(active, vec!["Keep"]);
        assert_eq!(store.list_by_seller(&seller, false).unwrap().len(), 1);
        assert_eq!(store.list_by_seller(&seller, true).unwrap().len(), 2);
        assert_eq!(store.count_books().unwrap(), 1);
    }

    #[test]
    fn test_update_details_leaves_counters() {
        let (store, seller, _temp) = setup();
        let mut book = new_book(seller, "Dune");
        store.create_book(&book).unwrap();
        store.record_sale(&book.id, &seller, 2, 20.0, Some(5.0)).unwrap();

        book.title = "Dune Messiah".to_string();
        book.price = 11.0;
        book.trending = true;
        assert!(store.update_details(&book).unwrap());

        let loaded = store.get_book(&book.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Dune Messiah");
        assert_eq!(loaded.price, 11.0);
        assert!(loaded.trending);
        assert_eq!(loaded.sold_count, 2);
        assert_eq!(loaded.revenue, 20.0);
        assert_eq!(loaded.rating.count, 1);
    }
}
