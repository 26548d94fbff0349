//! User Storage
//! Mission: Store buyer, seller and admin accounts; hash passwords on write

use super::{column_enum, column_uuid, now_timestamp, Database};
use crate::auth::models::{normalize_email, AdminAccount, NewUser, Role, User};
use crate::auth::password::PasswordHasher;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, business_name, business_address,
     is_approved, ratings, total_ratings, created_at, updated_at";

/// Account storage on the shared database
#[derive(Clone)]
pub struct UserStore {
    db: Database,
    hasher: PasswordHasher,
}

impl UserStore {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    /// Create the configured admin account if no admin exists yet
    pub fn ensure_default_admin(&self, username: &str, password: &str) -> Result<()> {
        let conn = self.db.conn();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))
            .context("Failed to check for admin accounts")?;

        if count == 0 {
            conn.execute(
                "INSERT INTO admins (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![Uuid::new_v4().to_string(), username, password, now_timestamp()],
            )
            .context("Failed to insert admin account")?;

            info!("🔐 Default admin account created (username: {})", username);
            warn!("⚠️  Admin passwords are stored and compared as plaintext");
        }

        Ok(())
    }

    pub fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT id, username, password, created_at FROM admins WHERE username = ?1",
            params![username.trim()],
            |row| {
                Ok(AdminAccount {
                    id: column_uuid(row, 0)?,
                    username: row.get(1)?,
                    password: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()
        .context("Failed to load admin account")
    }

    /// Admin login. Compares the stored password as entered (not hashed).
    pub fn verify_admin(&self, username: &str, password: &str) -> Result<Option<AdminAccount>> {
        Ok(self
            .get_admin_by_username(username)?
            .filter(|admin| admin.password == password))
    }

    /// Create a buyer or seller. Sellers always start unapproved.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        // Hash before taking the connection lock; bcrypt is slow on purpose
        let password_hash = self.hasher.hash(&new_user.password)?;
        let now = now_timestamp();
        let id = Uuid::new_v4();

        {
            let conn = self.db.conn();
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, role, business_name,
                     business_address, is_approved, ratings, total_ratings, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, 0, ?8, ?8)",
                params![
                    id.to_string(),
                    new_user.name,
                    normalize_email(&new_user.email),
                    password_hash,
                    new_user.role.as_str(),
                    new_user.business_name,
                    new_user.business_address,
                    now,
                ],
            )
            .context("Failed to insert user")?;
        }

        info!("✅ Created {}: {}", new_user.role.as_str(), new_user.email);

        self.get_user_by_id(&id)?
            .context("User missing right after insert")
    }

    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = self.db.conn();
        query_user(&conn, "id = ?1", &id.to_string())
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.conn();
        query_user(&conn, "email = ?1", &normalize_email(email))
    }

    /// Email + password check. Unknown email and wrong password both yield `None`.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .get_user_by_email(email)?
            .filter(|user| self.hasher.verify(password, &user.password_hash)))
    }

    /// Update name and/or password. The password is hashed only when a new one is given.
    pub fn update_profile(
        &self,
        id: &Uuid,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<User>> {
        let password_hash = password.map(|p| self.hasher.hash(p)).transpose()?;

        let changed = {
            let conn = self.db.conn();
            conn.execute(
                "UPDATE users SET
                     name = COALESCE(?2, name),
                     password_hash = COALESCE(?3, password_hash),
                     updated_at = ?4
                 WHERE id = ?1",
                params![id.to_string(), name, password_hash, now_timestamp()],
            )
            .context("Failed to update user")?
        };

        if changed == 0 {
            return Ok(None);
        }
        self.get_user_by_id(id)
    }

    /// Mark a seller as approved. `None` when no seller has this id.
    pub fn approve_seller(&self, id: &Uuid) -> Result<Option<User>> {
        let changed = {
            let conn = self.db.conn();
            conn.execute(
                "UPDATE users SET is_approved = 1, updated_at = ?2 WHERE id = ?1 AND role = 'seller'",
                params![id.to_string(), now_timestamp()],
            )
            .context("Failed to approve seller")?
        };

        if changed == 0 {
            return Ok(None);
        }
        info!("✅ Seller approved: {}", id);
        self.get_user_by_id(id)
    }

    /// Fold one rating into the seller's running mean in a single statement.
    pub fn rate_seller(&self, id: &Uuid, rating: f64) -> Result<Option<User>> {
        let changed = {
            let conn = self.db.conn();
            conn.execute(
                "UPDATE users SET
                     ratings = (ratings * total_ratings + ?2) / (total_ratings + 1),
                     total_ratings = total_ratings + 1,
                     updated_at = ?3
                 WHERE id = ?1 AND role = 'seller'",
                params![id.to_string(), rating, now_timestamp()],
            )
            .context("Failed to rate seller")?
        };

        if changed == 0 {
            return Ok(None);
        }
        self.get_user_by_id(id)
    }

    /// List all accounts (admin only)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.db.conn();
        let ids: Vec<String> = conn
            .prepare("SELECT id FROM users ORDER BY created_at, rowid")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = query_user(&conn, "id = ?1", &id)? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, predicate);

    let user = conn
        .query_row(&sql, params![value], |row| {
            Ok(User {
                id: column_uuid(row, 0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                role: column_enum(row, 4, Role::from_str)?,
                business_name: row.get(5)?,
                business_address: row.get(6)?,
                is_approved: row.get(7)?,
                ratings: row.get(8)?,
                total_ratings: row.get(9)?,
                books: Vec::new(),
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            })
        })
        .optional()
        .context("Failed to load user")?;

    let Some(mut user) = user else {
        return Ok(None);
    };

    if user.role == Role::Seller {
        user.books = conn
            .prepare(
                "SELECT id FROM books WHERE seller_id = ?1 AND status != 'deleted'
                 ORDER BY created_at, rowid",
            )?
            .query_map(params![user.id.to_string()], |row| column_uuid(row, 0))?
            .collect::<Result<_, _>>()
            .context("Failed to load seller books")?;
    }

    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::is_constraint_violation;
    use crate::store::test_support::{create_seller, create_test_db, user_store};

    fn buyer(email: &str) -> NewUser {
        NewUser {
            name: "Buyer".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role: Role::User,
            business_name: None,
            business_address: None,
        }
    }

    #[test]
    fn test_default_admin_created_once() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);

        store.ensure_default_admin("admin", "admin123").unwrap();
        store.ensure_default_admin("other", "pw").unwrap();

        assert!(store.get_admin_by_username("admin").unwrap().is_some());
        assert!(store.get_admin_by_username("other").unwrap().is_none());
    }

    #[test]
    fn test_admin_plaintext_compare() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);
        store.ensure_default_admin("admin", "admin123").unwrap();

        assert!(store.verify_admin("admin", "admin123").unwrap().is_some());
        assert!(store.verify_admin("admin", "wrong").unwrap().is_none());
        assert!(store.verify_admin("ghost", "admin123").unwrap().is_none());
    }

    #[test]
    fn test_create_user_hashes_and_normalizes() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);

        let user = store.create_user(&buyer("  Buyer@Example.COM ")).unwrap();
        assert_eq!(user.email, "buyer@example.com");
        assert_ne!(user.password_hash, "password123");
        assert!(user.password_hash.starts_with("$2"));
        assert!(!user.is_approved);

        let found = store.get_user_by_email("BUYER@example.com").unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);

        store.create_user(&buyer("dup@example.com")).unwrap();
        let err = store.create_user(&buyer("DUP@example.com")).unwrap_err();
        assert!(is_constraint_violation(&err));

        let other = anyhow::anyhow!("disk on fire");
        assert!(!is_constraint_violation(&other));
    }

    #[test]
    fn test_password_verification() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);
        store.create_user(&buyer("buyer@example.com")).unwrap();

        assert!(store
            .verify_credentials("buyer@example.com", "password123")
            .unwrap()
            .is_some());
        assert!(store
            .verify_credentials("buyer@example.com", "wrongpassword")
            .unwrap()
            .is_none());
        assert!(store
            .verify_credentials("nobody@example.com", "password123")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_profile_rehashes_only_on_new_password() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);
        let user = store.create_user(&buyer("buyer@example.com")).unwrap();

        let renamed = store
            .update_profile(&user.id, Some("New Name"), None)
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "New Name");
        assert_eq!(renamed.password_hash, user.password_hash);

        let repassed = store
            .update_profile(&user.id, None, Some("another-secret"))
            .unwrap()
            .unwrap();
        assert_ne!(repassed.password_hash, user.password_hash);
        assert!(store
            .verify_credentials("buyer@example.com", "another-secret")
            .unwrap()
            .is_some());

        assert!(store
            .update_profile(&Uuid::new_v4(), Some("x"), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_approve_only_sellers() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);
        let seller = create_seller(&store, "s@example.com", false);
        let user = store.create_user(&buyer("b@example.com")).unwrap();

        assert!(!seller.is_approved);
        let approved = store.approve_seller(&seller.id).unwrap().unwrap();
        assert!(approved.is_approved);

        assert!(store.approve_seller(&user.id).unwrap().is_none());
        assert!(store.approve_seller(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_seller_rating_running_mean() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);
        let seller = create_seller(&store, "s@example.com", true);

        let first = store.rate_seller(&seller.id, 4.0).unwrap().unwrap();
        assert_eq!(first.ratings, 4.0);
        assert_eq!(first.total_ratings, 1);

        store.rate_seller(&seller.id, 5.0).unwrap();
        let third = store.rate_seller(&seller.id, 3.0).unwrap().unwrap();
        assert_eq!(third.ratings, 4.0);
        assert_eq!(third.total_ratings, 3);
    }

    #[test]
    fn test_list_users() {
        let (db, _temp) = create_test_db();
        let store = user_store(&db);

        store.create_user(&buyer("a@example.com")).unwrap();
        create_seller(&store, "s@example.com", false);

        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "a@example.com");
        assert_eq!(users[1].role, Role::Seller);
    }
}
