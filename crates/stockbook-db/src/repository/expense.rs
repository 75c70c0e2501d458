//! # Expense Repository
//!
//! CRUD for operating expenses.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockbook_core::{Expense, ExpenseDraft};

const EXPENSE_COLUMNS: &str = "id, owner_id, name, category, amount_cents, description, \
     expense_date, created_at, created_by, updated_at, updated_by";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Lists the owner's expenses, newest first.
    pub async fn list(&self, owner_id: &str) -> DbResult<Vec<Expense>> {
        debug!(owner_id = %owner_id, "Listing expenses");

        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE owner_id = ?1 \
             ORDER BY expense_date DESC, created_at DESC"
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Expense> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND owner_id = ?2");
        sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, category = %expense.category, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, owner_id, name, category, amount_cents, description, expense_date,
                created_at, created_by, updated_at, updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.owner_id)
        .bind(&expense.name)
        .bind(expense.category.as_str())
        .bind(expense.amount_cents)
        .bind(&expense.description)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .bind(&expense.created_by)
        .bind(expense.updated_at)
        .bind(&expense.updated_by)
        .execute(&self.pool)
        .await?;

        info!(id = %expense.id, amount = expense.amount_cents, "Expense recorded");
        Ok(())
    }

    /// Overwrites an expense from a normalized draft. A draft without a
    /// date keeps the stored one.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        draft: &ExpenseDraft,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Expense> {
        debug!(id = %id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET name = ?1, category = ?2, amount_cents = ?3, description = ?4,
                expense_date = COALESCE(?5, expense_date), updated_at = ?6, updated_by = ?7
            WHERE id = ?8 AND owner_id = ?9
            "#,
        )
        .bind(&draft.name)
        .bind(draft.category.as_str())
        .bind(draft.amount_cents)
        .bind(&draft.description)
        .bind(draft.expense_date)
        .bind(now)
        .bind(updated_by)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id = %id, "Expense updated");
        self.get(owner_id, id).await
    }

    /// Deletes an expense and returns what was deleted.
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<Expense> {
        let expense = self.get(owner_id, id).await?;

        sqlx::query("DELETE FROM expenses WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        info!(id = %id, "Expense deleted");
        Ok(expense)
    }
}
