use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Catalog entry lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Active,
    Inactive,
    Deleted,
}

impl BookStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookStatus::Active => "active",
            BookStatus::Inactive => "inactive",
            BookStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BookStatus::Active),
            "inactive" => Some(BookStatus::Inactive),
            "deleted" => Some(BookStatus::Deleted),
            _ => None,
        }
    }
}

/// Running mean plus sample count
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i64,
}

impl RatingAggregate {
    /// Fold one more rating into the mean.
    pub fn apply(self, rating: f64) -> Self {
        let count = self.count + 1;
        Self {
            average: (self.average * self.count as f64 + rating) / count as f64,
            count,
        }
    }
}

/// A book in the catalog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub old_price: Option<f64>,
    pub stock: i64,
    pub image_url: String,
    pub status: BookStatus,
    pub seller: Uuid,
    pub seller_name: String,
    pub rating: RatingAggregate,
    pub sold_count: i64,
    pub revenue: f64,
    pub trending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let required = [
            ("title", &self.title, "Please enter book title"),
            ("author", &self.author, "Please enter author name"),
            ("description", &self.description, "Please enter book description"),
            ("category", &self.category, "Please enter book category"),
            ("imageUrl", &self.image_url, "Please enter book image"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                violations.push(Violation::new(field, message));
            }
        }

        if !self.price.is_finite() || self.price < 0.0 {
            violations.push(Violation::new("price", "Price must be a non-negative number"));
        }
        if let Some(old_price) = self.old_price {
            if !old_price.is_finite() || old_price < 0.0 {
                violations.push(Violation::new("oldPrice", "Old price must be a non-negative number"));
            }
        }
        if self.stock < 0 {
            violations.push(Violation::new("stock", "Stock cannot be negative"));
        }

        violations
    }
}

/// Body of `POST /api/books/seller/create`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub old_price: Option<f64>,
    #[serde(default = "default_stock")]
    pub stock: i64,
    pub image_url: String,
    #[serde(default)]
    pub trending: bool,
}

fn default_stock() -> i64 {
    1
}

impl CreateBookRequest {
    /// Build the entity for `seller`; counters start at zero.
    pub fn into_book(self, seller: Uuid, seller_name: String) -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_lowercase(),
            price: self.price,
            old_price: self.old_price,
            stock: self.stock,
            image_url: self.image_url.trim().to_string(),
            status: BookStatus::Active,
            seller,
            seller_name,
            rating: RatingAggregate::default(),
            sold_count: 0,
            revenue: 0.0,
            trending: self.trending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PUT /api/books/seller/:id`. Counters, rating and owner are not writable.
///
/// `oldPrice` is tri-state: absent leaves it alone, `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub old_price: Option<Option<f64>>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub status: Option<BookStatus>,
    pub trending: Option<bool>,
}

/// Wraps any present value, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl UpdateBookRequest {
    pub fn apply_to(self, book: &mut Book) -> Vec<Violation> {
        if let Some(title) = self.title {
            book.title = title.trim().to_string();
        }
        if let Some(author) = self.author {
            book.author = author.trim().to_string();
        }
        if let Some(description) = self.description {
            book.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            book.category = category.trim().to_lowercase();
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(old_price) = self.old_price {
            book.old_price = old_price;
        }
        if let Some(stock) = self.stock {
            book.stock = stock;
        }
        if let Some(image_url) = self.image_url {
            book.image_url = image_url.trim().to_string();
        }
        if let Some(trending) = self.trending {
            book.trending = trending;
        }

        let mut violations = Vec::new();
        match self.status {
            Some(BookStatus::Deleted) => violations.push(Violation::new(
                "status",
                "Use DELETE to remove a book",
            )),
            Some(status) => book.status = status,
            None => {}
        }

        book.updated_at = Utc::now();
        violations.extend(book.validate());
        violations
    }
}

/// Body of `POST /api/books/seller/:id/sale`
#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub quantity: i64,
    pub revenue: f64,
    pub rating: Option<f64>,
}

impl RecordSaleRequest {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.quantity < 1 {
            violations.push(Violation::new("quantity", "Quantity must be at least 1"));
        }
        if !self.revenue.is_finite() || self.revenue < 0.0 {
            violations.push(Violation::new("revenue", "Revenue must be a non-negative number"));
        }
        if let Some(rating) = self.rating {
            if !is_valid_rating(rating) {
                violations.push(Violation::new("rating", "Rating must be between 0 and 5"));
            }
        }
        violations
    }
}

pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (0.0..=5.0).contains(&rating)
}

/// Order lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Only pending orders move; completed and cancelled are terminal.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Cancelled) | (OrderStatus::Pending, OrderStatus::Completed)
        )
    }
}

/// Line item; title and price are snapshotted at checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub book_id: Uuid,
    pub title: String,
    pub unit_price: f64,
    pub quantity: i64,
}

/// A placed order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.email.trim().is_empty() {
            violations.push(Violation::new("email", "Buyer email is required"));
        }
        if self.items.is_empty() {
            violations.push(Violation::new("items", "An order needs at least one item"));
        }
        if self.items.iter().any(|item| item.quantity < 1) {
            violations.push(Violation::new("items", "Item quantity must be at least 1"));
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            violations.push(Violation::new("totalAmount", "Total amount must be non-negative"));
        }
        violations
    }

    pub fn contains_any(&self, book_ids: &[Uuid]) -> bool {
        self.items.iter().any(|item| book_ids.contains(&item.book_id))
    }
}

/// Body of `POST /api/orders`
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub book_id: Uuid,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        CreateBookRequest {
            title: " Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            description: "Spice".to_string(),
            category: " Fiction ".to_string(),
            price: 12.5,
            old_price: Some(15.0),
            stock: 3,
            image_url: "/uploads/dune.jpg".to_string(),
            trending: false,
        }
        .into_book(Uuid::new_v4(), "Acme Books".to_string())
    }

    #[test]
    fn test_new_book_starts_clean() {
        let book = sample_book();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.category, "fiction");
        assert_eq!(book.status, BookStatus::Active);
        assert_eq!(book.sold_count, 0);
        assert_eq!(book.revenue, 0.0);
        assert_eq!(book.rating, RatingAggregate::default());
        assert!(book.validate().is_empty());
    }

    #[test]
    fn test_book_validation_lists_every_violation() {
        let mut book = sample_book();
        book.title = "  ".to_string();
        book.price = -1.0;
        book.stock = -2;

        let fields: Vec<_> = book.validate().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["title", "price", "stock"]);
    }

    #[test]
    fn test_update_cannot_mark_deleted() {
        let mut book = sample_book();
        let update = UpdateBookRequest {
            status: Some(BookStatus::Deleted),
            price: Some(9.99),
            ..Default::default()
        };

        let violations = update.apply_to(&mut book);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "status");
        assert_eq!(book.status, BookStatus::Active);
    }

    #[test]
    fn test_update_old_price_absent_vs_null() {
        let mut book = sample_book();

        let untouched: UpdateBookRequest = serde_json::from_str(r#"{"price": 11.0}"#).unwrap();
        assert!(untouched.apply_to(&mut book).is_empty());
        assert_eq!(book.old_price, Some(15.0));

        let cleared: UpdateBookRequest = serde_json::from_str(r#"{"oldPrice": null}"#).unwrap();
        assert!(cleared.apply_to(&mut book).is_empty());
        assert_eq!(book.old_price, None);

        let set: UpdateBookRequest = serde_json::from_str(r#"{"oldPrice": 20.0}"#).unwrap();
        assert!(set.apply_to(&mut book).is_empty());
        assert_eq!(book.old_price, Some(20.0));
    }

    #[test]
    fn test_trending_defaults_off_and_is_editable() {
        let request: CreateBookRequest = serde_json::from_str(
            r#"{"title":"Dune","author":"Frank Herbert","description":"Spice",
                "category":"fiction","price":10.0,"imageUrl":"/dune.jpg"}"#,
        )
        .unwrap();
        let mut book = request.into_book(Uuid::new_v4(), "Acme Books".to_string());
        assert!(!book.trending);
        assert_eq!(book.stock, 1);

        let update: UpdateBookRequest = serde_json::from_str(r#"{"trending": true}"#).unwrap();
        assert!(update.apply_to(&mut book).is_empty());
        assert!(book.trending);
        assert_eq!(serde_json::to_value(&book).unwrap()["trending"], true);
    }

    #[test]
    fn test_rating_aggregate_running_mean() {
        let first = RatingAggregate::default().apply(4.5);
        assert_eq!(first.average, 4.5);
        assert_eq!(first.count, 1);

        let agg = [4.0, 5.0, 3.0]
            .into_iter()
            .fold(RatingAggregate::default(), RatingAggregate::apply);
        assert_eq!(agg.average, 4.0);
        assert_eq!(agg.count, 3);
    }

    #[test]
    fn test_order_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_sale_request_validation() {
        let ok = RecordSaleRequest { quantity: 2, revenue: 20.0, rating: Some(5.0) };
        assert!(ok.validate().is_empty());

        let bad = RecordSaleRequest { quantity: 0, revenue: -1.0, rating: Some(6.0) };
        let fields: Vec<_> = bad.validate().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["quantity", "revenue", "rating"]);
    }
}
