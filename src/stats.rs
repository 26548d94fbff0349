//! Dashboard statistics
//!
//! Pure aggregation over records already loaded from the store. Nothing in
//! here writes.

use crate::models::{Book, Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const TOP_BOOKS_LIMIT: usize = 5;
pub const RECENT_ORDERS_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub total_books: usize,
    pub total_orders: i64,
    pub total_revenue: f64,
    pub average_rating: f64,
    pub top_books: Vec<TopBook>,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBook {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub sold_copies: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: Uuid,
    /// Title of the order's first line item, even when that item belongs to
    /// another seller.
    pub first_item_title: String,
    pub total_amount: f64,
    pub date: DateTime<Utc>,
}

/// Summarize a seller's catalog and the orders that touch it.
///
/// `books` must be every book the seller owns, in fetch order; that order
/// breaks ties in `top_books`. Orders that reference none of the books are
/// ignored.
pub fn seller_stats(books: &[Book], orders: &[Order]) -> SellerStats {
    let total_books = books.len();
    let total_orders = books.iter().map(|b| b.sold_count).sum();
    let total_revenue = books.iter().map(|b| b.revenue).sum();

    // Mean of per-book averages; each book weighs the same
    let average_rating = if total_books == 0 {
        0.0
    } else {
        books.iter().map(|b| b.rating.average).sum::<f64>() / total_books as f64
    };

    let mut ranked: Vec<&Book> = books.iter().collect();
    ranked.sort_by(|a, b| b.sold_count.cmp(&a.sold_count)); // stable
    let top_books = ranked
        .into_iter()
        .take(TOP_BOOKS_LIMIT)
        .map(|b| TopBook {
            id: b.id,
            title: b.title.clone(),
            price: b.price,
            sold_copies: b.sold_count,
            revenue: b.revenue,
        })
        .collect();

    let book_ids: Vec<Uuid> = books.iter().map(|b| b.id).collect();
    let mut touching: Vec<&Order> = orders.iter().filter(|o| o.contains_any(&book_ids)).collect();
    touching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_orders = touching
        .into_iter()
        .take(RECENT_ORDERS_LIMIT)
        .map(|o| RecentOrder {
            id: o.id,
            first_item_title: o.items.first().map(|i| i.title.clone()).unwrap_or_default(),
            total_amount: o.total_amount,
            date: o.created_at,
        })
        .collect();

    SellerStats {
        total_books,
        total_orders,
        total_revenue,
        average_rating,
        top_books,
        recent_orders,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_books: i64,
    pub total_orders: usize,
    pub pending_orders: usize,
    pub total_sales: f64,
    pub monthly_sales: Vec<MonthlySales>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    pub month: String, // YYYY-MM
    pub total_sales: f64,
    pub total_orders: usize,
}

/// Store-wide totals. Sales count completed orders only.
pub fn admin_stats(total_books: i64, orders: &[Order]) -> AdminStats {
    let mut months: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut total_sales = 0.0;
    let mut pending_orders = 0;

    for order in orders {
        match order.status {
            OrderStatus::Completed => {
                total_sales += order.total_amount;
                let entry = months
                    .entry(order.created_at.format("%Y-%m").to_string())
                    .or_insert((0.0, 0));
                entry.0 += order.total_amount;
                entry.1 += 1;
            }
            OrderStatus::Pending => pending_orders += 1,
            OrderStatus::Cancelled => {}
        }
    }

    AdminStats {
        total_books,
        total_orders: orders.len(),
        pending_orders,
        total_sales,
        monthly_sales: months
            .into_iter()
            .map(|(month, (total_sales, total_orders))| MonthlySales {
                month,
                total_sales,
                total_orders,
            })
            .collect(),
    }
}
