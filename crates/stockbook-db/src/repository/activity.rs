//! # Activity Log Repository
//!
//! Append-only: the repository offers no update or delete.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::{new_id, ActivityLog, NewActivity};

/// Default number of entries returned by [`ActivityRepository::recent`].
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Appends an entry and returns it.
    pub async fn append(
        &self,
        owner_id: &str,
        actor: &str,
        entry: NewActivity,
        now: DateTime<Utc>,
    ) -> DbResult<ActivityLog> {
        let log = ActivityLog {
            id: new_id(),
            owner_id: owner_id.to_string(),
            action: entry.action,
            details: entry.details,
            item_id: entry.item_id,
            sale_id: entry.sale_id,
            change_summary: entry.change_summary,
            created_at: now,
            created_by: actor.to_string(),
        };

        debug!(action = ?log.action, item_id = ?log.item_id, sale_id = ?log.sale_id, "Appending activity");

        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                id, owner_id, action, details, item_id, sale_id, change_summary,
                created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&log.id)
        .bind(&log.owner_id)
        .bind(log.action)
        .bind(&log.details)
        .bind(&log.item_id)
        .bind(&log.sale_id)
        .bind(&log.change_summary)
        .bind(log.created_at)
        .bind(&log.created_by)
        .execute(&self.pool)
        .await?;

        Ok(log)
    }

    /// Most recent entries first.
    pub async fn recent(&self, owner_id: &str, limit: u32) -> DbResult<Vec<ActivityLog>> {
        let logs = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, owner_id, action, details, item_id, sale_id, change_summary,
                   created_at, created_by
            FROM activity_logs
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{account, setup};
    use stockbook_core::ActivityAction;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let (db, owner) = setup().await;
        let now = Utc::now();

        db.activity()
            .append(
                &owner,
                "owner@shop.com",
                NewActivity::new(ActivityAction::ItemCreated, "Created item Cola").with_item("i1"),
                now,
            )
            .await
            .unwrap();
        db.activity()
            .append(
                &owner,
                "owner@shop.com",
                NewActivity::new(ActivityAction::ItemUpdated, "Updated item Cola")
                    .with_item("i1")
                    .with_changes("price: $1.50 → $1.75"),
                now,
            )
            .await
            .unwrap();

        let logs = db.activity().recent(&owner, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        // same timestamp: insertion order breaks the tie
        assert_eq!(logs[0].action, ActivityAction::ItemUpdated);
        assert_eq!(logs[0].change_summary.as_deref(), Some("price: $1.50 → $1.75"));
        assert_eq!(logs[1].item_id.as_deref(), Some("i1"));
    }

    #[tokio::test]
    async fn test_limit_and_owner_scope() {
        let (db, owner) = setup().await;
        let other = account(&db, "other@shop.com").await;

        for i in 0..5 {
            db.activity()
                .append(
                    &owner,
                    "owner@shop.com",
                    NewActivity::new(ActivityAction::StockAdjusted, format!("adjust {}", i)),
                    Utc::now(),
                )
                .await
                .unwrap();
        }

        assert_eq!(db.activity().recent(&owner, 3).await.unwrap().len(), 3);
        assert!(db.activity().recent(&other, 10).await.unwrap().is_empty());
    }
}
