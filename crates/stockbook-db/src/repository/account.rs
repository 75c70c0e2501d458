//! # Account Repository
//!
//! Sign-up accounts. Emails are stored lower-cased and are unique.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockbook_core::Account;

const ACCOUNT_COLUMNS: &str = "id, email, display_name, password_hash, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts an account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(id = %account.id, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("accounts.email") => {
                DbError::duplicate("email", account.email.as_str())
            }
            err => err,
        })?;

        info!(id = %account.id, "Account created");
        Ok(())
    }

    /// Looks up an account by (already normalized) email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn get(&self, id: &str) -> DbResult<Account> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Account", id))
    }

    /// Updates the display name and/or password hash. `None` keeps the
    /// stored value.
    pub async fn update_profile(
        &self,
        id: &str,
        display_name: Option<&str>,
        password_hash: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Account> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET display_name = COALESCE(?1, display_name),
                password_hash = COALESCE(?2, password_hash),
                updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(display_name)
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        info!(id = %id, "Profile updated");
        self.get(id).await
    }
}
