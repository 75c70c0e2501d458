//! # Repository Module
//!
//! One repository per table group. Every method takes the owner id and
//! filters on it, so one account can never read or touch another's rows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.items().get(&owner_id, &id)                                 │
//! │       ▼                                                                 │
//! │  ItemRepository / SaleRepository / PurchaseRepository / ...             │
//! │       │  SQL (WHERE owner_id = ?)                                       │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory CRUD, search, stock adjustments, import
//! - [`sale::SaleRepository`] - Sales with atomic stock decrement
//! - [`purchase::PurchaseRepository`] - Purchases with atomic stock increment
//! - [`expense::ExpenseRepository`] - Expense CRUD
//! - [`activity::ActivityRepository`] - Append-only activity feed
//! - [`account::AccountRepository`] - Sign-up accounts

pub mod account;
pub mod activity;
pub mod expense;
pub mod item;
pub mod purchase;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use stockbook_core::{new_id, Account, Item};

    use crate::pool::{Database, DbConfig};

    /// Fresh in-memory database with one account, `owner@shop.com`.
    pub async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account(&db, "owner@shop.com").await;
        (db, owner)
    }

    pub async fn account(db: &Database, email: &str) -> String {
        let now = Utc::now();
        let account = Account {
            id: new_id(),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: "$argon2id$test".to_string(),
            created_at: now,
            updated_at: now,
        };
        db.accounts().insert(&account).await.unwrap();
        account.id
    }

    pub fn item(owner_id: &str, name: &str, sku: &str, price_cents: i64, quantity: i64) -> Item {
        let now = Utc::now();
        Item {
            id: new_id(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            price_cents,
            quantity,
            sku: sku.to_string(),
            description: None,
            vendor: None,
            created_at: now,
            created_by: "owner@shop.com".to_string(),
            updated_at: now,
            updated_by: "owner@shop.com".to_string(),
        }
    }
}
