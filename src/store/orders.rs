//! Order storage
//! Mission: Persist checkouts and their status transitions

use super::{column_datetime, column_enum, column_uuid, now_timestamp, timestamp, Database};
use crate::models::{Order, OrderItem, OrderStatus};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

/// Order storage on the shared database
#[derive(Clone)]
pub struct OrderStore {
    db: Database,
}

impl OrderStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert the order and its line items in one transaction
    pub fn create_order(&self, order: &Order) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction().context("Failed to begin order transaction")?;

        tx.execute(
            "INSERT INTO orders (id, email, total_amount, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.id.to_string(),
                order.email,
                order.total_amount,
                order.status.as_str(),
                timestamp(order.created_at),
                timestamp(order.updated_at),
            ],
        )
        .context("Failed to insert order")?;

        for (position, item) in order.items.iter().enumerate() {
            tx.execute(
                "INSERT INTO order_items (order_id, position, book_id, title, unit_price, quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    order.id.to_string(),
                    position as i64,
                    item.book_id.to_string(),
                    item.title,
                    item.unit_price,
                    item.quantity,
                ],
            )
            .context("Failed to insert order item")?;
        }

        tx.commit().context("Failed to commit order")?;

        info!(
            "🧾 Order placed: {} by {} ({} items, {:.2})",
            order.id,
            order.email,
            order.items.len(),
            order.total_amount
        );
        Ok(())
    }

    pub fn get_order(&self, id: &Uuid) -> Result<Option<Order>> {
        let conn = self.db.conn();
        let mut orders = query_orders(&conn, "id = ?1", params![id.to_string()])?;
        Ok(orders.pop())
    }

    /// A buyer's orders, newest first
    pub fn list_by_email(&self, email: &str) -> Result<Vec<Order>> {
        let conn = self.db.conn();
        query_orders(&conn, "email = ?1", params![email])
    }

    /// Orders with at least one line item for a book owned by `seller`
    pub fn list_for_seller(&self, seller: &Uuid) -> Result<Vec<Order>> {
        let conn = self.db.conn();
        query_orders(
            &conn,
            "id IN (SELECT oi.order_id FROM order_items oi
                    JOIN books b ON b.id = oi.book_id
                    WHERE b.seller_id = ?1)",
            params![seller.to_string()],
        )
    }

    pub fn list_all(&self) -> Result<Vec<Order>> {
        let conn = self.db.conn();
        query_orders(&conn, "1 = 1", params![])
    }

    /// Move an order from `from` to `to`. Returns `false` if the order was
    /// not in `from` any more (or does not exist).
    pub fn transition(&self, id: &Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        let conn = self.db.conn();
        let changed = conn
            .execute(
                "UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
                params![id.to_string(), from.as_str(), to.as_str(), now_timestamp()],
            )
            .context("Failed to update order status")?;

        if changed > 0 {
            info!("🧾 Order {}: {} -> {}", id, from.as_str(), to.as_str());
        }
        Ok(changed > 0)
    }
}

fn query_orders(
    conn: &Connection,
    predicate: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Order>> {
    let sql = format!(
        "SELECT id, email, total_amount, status, created_at, updated_at
         FROM orders WHERE {} ORDER BY created_at DESC, rowid DESC",
        predicate
    );

    let mut orders = conn
        .prepare(&sql)?
        .query_map(args, |row| {
            Ok(Order {
                id: column_uuid(row, 0)?,
                email: row.get(1)?,
                items: Vec::new(),
                total_amount: row.get(2)?,
                status: column_enum(row, 3, OrderStatus::from_str)?,
                created_at: column_datetime(row, 4)?,
                updated_at: column_datetime(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load orders")?;

    let mut stmt = conn.prepare(
        "SELECT book_id, title, unit_price, quantity FROM order_items
         WHERE order_id = ?1 ORDER BY position",
    )?;
    for order in &mut orders {
        order.items = stmt
            .query_map(params![order.id.to_string()], |row| {
                Ok(OrderItem {
                    book_id: column_uuid(row, 0)?,
                    title: row.get(1)?,
                    unit_price: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load order items")?;
    }

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::create_test_db;
    use chrono::{Duration, Utc};

    fn order(email: &str, minutes_ago: i64, items: Vec<(Uuid, &str)>) -> Order {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Order {
            id: Uuid::new_v4(),
            email: email.to_string(),
            items: items
                .into_iter()
                .map(|(book_id, title)| OrderItem {
                    book_id,
                    title: title.to_string(),
                    unit_price: 10.0,
                    quantity: 1,
                })
                .collect(),
            total_amount: 10.0,
            status: OrderStatus::Pending,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_create_and_load_with_items() {
        let (db, _temp) = create_test_db();
        let store = OrderStore::new(db);

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let placed = order("buyer@example.com", 0, vec![(a, "First"), (b, "Second")]);
        store.create_order(&placed).unwrap();

        let loaded = store.get_order(&placed.id).unwrap().unwrap();
        assert_eq!(loaded.items, placed.items);
        assert_eq!(loaded.status, OrderStatus::Pending);
        assert!(store.get_order(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_by_email_newest_first() {
        let (db, _temp) = create_test_db();
        let store = OrderStore::new(db);

        let old = order("buyer@example.com", 10, vec![(Uuid::new_v4(), "Old")]);
        let new = order("buyer@example.com", 1, vec![(Uuid::new_v4(), "New")]);
        let other = order("other@example.com", 0, vec![(Uuid::new_v4(), "Other")]);
        for o in [&old, &new, &other] {
            store.create_order(o).unwrap();
        }

        let ids: Vec<_> = store
            .list_by_email("buyer@example.com")
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![new.id, old.id]);
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_transition_only_from_expected_state() {
        let (db, _temp) = create_test_db();
        let store = OrderStore::new(db);
        let placed = order("buyer@example.com", 0, vec![(Uuid::new_v4(), "Book")]);
        store.create_order(&placed).unwrap();

        assert!(store
            .transition(&placed.id, OrderStatus::Pending, OrderStatus::Completed)
            .unwrap());
        assert!(!store
            .transition(&placed.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .unwrap());

        let loaded = store.get_order(&placed.id).unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Completed);
    }
}
