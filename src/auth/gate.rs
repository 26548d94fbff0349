//! Role Gate
//! Mission: Decide, after authentication, whether a caller may perform an operation

use crate::auth::models::{Claims, Role, User};
use crate::error::{ApiError, ApiResult};
use crate::models::{Book, BookStatus};
use crate::store::UserStore;
use tracing::warn;
use uuid::Uuid;

pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const ADMIN_HAS_NO_ACCOUNT: &str = "Not available to administrators";

/// Caller allowed to write to the catalog
#[derive(Debug, Clone)]
pub enum CatalogWriter {
    /// Bypasses ownership, never existence
    Admin,
    /// Approved seller; may only touch their own books
    Seller(User),
}

impl CatalogWriter {
    /// Owner id to use for a write on `book`
    pub fn owner_for(&self, book: &Book) -> Uuid {
        match self {
            CatalogWriter::Admin => book.seller,
            CatalogWriter::Seller(user) => user.id,
        }
    }
}

/// Plain role check. Admin does not implicitly hold other roles.
pub fn authorize(claims: &Claims, required: Role) -> ApiResult<()> {
    if claims.role == required {
        Ok(())
    } else {
        warn!(
            "🚫 Role mismatch: {} requires {}, caller is {}",
            claims.id,
            required.as_str(),
            claims.role.as_str()
        );
        Err(ApiError::Forbidden(format!(
            "Access denied, {} role required",
            required.as_str()
        )))
    }
}

/// Load the caller's buyer or seller account. Administrators live in their
/// own table and are refused here. A token whose account no longer exists
/// is treated like an invalid token.
pub fn current_account(users: &UserStore, claims: &Claims) -> ApiResult<User> {
    if claims.role == Role::Admin {
        return Err(ApiError::Forbidden(ADMIN_HAS_NO_ACCOUNT.to_string()));
    }
    let id = claims.account_id().ok_or(ApiError::Unauthenticated)?;
    users.get_user_by_id(&id)?.ok_or(ApiError::Unauthenticated)
}

/// Seller role plus approval, read from the store so that an approval
/// takes effect without a new token.
pub fn approved_seller(users: &UserStore, claims: &Claims) -> ApiResult<User> {
    authorize(claims, Role::Seller)?;
    let seller = current_account(users, claims)?;

    if !seller.is_approved_seller() {
        warn!("🚫 Unapproved seller blocked: {}", seller.email);
        return Err(ApiError::Forbidden(
            "Your seller account is pending approval".to_string(),
        ));
    }
    Ok(seller)
}

/// Admin or approved seller; everyone else is denied.
pub fn catalog_writer(users: &UserStore, claims: &Claims) -> ApiResult<CatalogWriter> {
    match claims.role {
        Role::Admin => Ok(CatalogWriter::Admin),
        _ => approved_seller(users, claims).map(CatalogWriter::Seller),
    }
}

/// Existence first, then ownership. Another seller's book is reported
/// exactly like a missing one.
pub fn authorize_book(writer: &CatalogWriter, book: Option<Book>) -> ApiResult<Book> {
    let book = book
        .filter(|b| b.status != BookStatus::Deleted)
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;

    match writer {
        CatalogWriter::Admin => Ok(book),
        CatalogWriter::Seller(seller) if seller.id == book.seller => Ok(book),
        CatalogWriter::Seller(seller) => {
            warn!("🚫 Cross-tenant access: seller {} on book {}", seller.id, book.id);
            Err(ApiError::NotFound(BOOK_NOT_FOUND.to_string()))
        }
    }
}
