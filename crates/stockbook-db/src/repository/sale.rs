//! # Sale Repository
//!
//! Database operations for sales and their line items.
//!
//! ## Sale Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT sales                                                         │
//! │    for each line:                                                       │
//! │      INSERT sale_items                                                  │
//! │      UPDATE items SET quantity = quantity - n                           │
//! │             WHERE id = ? AND owner_id = ? AND quantity >= n             │
//! │      0 rows? ──► ROLLBACK, InsufficientStock / ItemNotFound             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a sale runs the same steps in reverse and puts the units back.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use stockbook_core::{CoreError, Sale, SaleLine, MAX_STOCK_LEVEL};

const SALE_COLUMNS: &str = "id, owner_id, sale_type, total_cents, pay_cash, cash_amount_cents, \
     pay_credit, credit_amount_cents, purchaser_name, purchaser_phone, notes, sale_date, \
     created_at, created_by";

const LINE_COLUMNS: &str = "si.id, si.sale_id, si.item_id, si.item_name, si.sku, si.quantity, \
     si.unit_price_cents, si.cash_price_cents, si.credit_price_cents, si.line_total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists the owner's sales, newest first, with their lines.
    pub async fn list(&self, owner_id: &str) -> DbResult<Vec<Sale>> {
        debug!(owner_id = %owner_id, "Listing sales");

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE owner_id = ?1 ORDER BY sale_date DESC, created_at DESC"
        );
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM sale_items si \
             INNER JOIN sales s ON s.id = si.sale_id \
             WHERE s.owner_id = ?1 \
             ORDER BY si.sale_id, si.position"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<SaleLine>> = HashMap::new();
        for line in lines {
            by_sale.entry(line.sale_id.clone()).or_default().push(line);
        }
        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        debug!(count = sales.len(), "Sale list returned");
        Ok(sales)
    }

    /// Gets one of the owner's sales with its lines.
    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, owner_id, id).await
    }

    /// Records a sale and takes its units out of stock, atomically.
    ///
    /// The sale is expected to have passed the cart checks already; stock
    /// is re-checked here against the committed quantities.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - A line exceeds current stock
    /// * `Err(DbError::Domain(CoreError::ItemNotFound))` - A line names a missing item
    pub async fn create(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, lines = sale.items.len(), total = sale.total_cents, "Creating sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, owner_id, sale_type, total_cents, pay_cash, cash_amount_cents,
                pay_credit, credit_amount_cents, purchaser_name, purchaser_phone, notes,
                sale_date, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.owner_id)
        .bind(sale.sale_type.as_str())
        .bind(sale.total_cents)
        .bind(sale.pay_cash)
        .bind(sale.cash_amount_cents)
        .bind(sale.pay_credit)
        .bind(sale.credit_amount_cents)
        .bind(&sale.purchaser_name)
        .bind(&sale.purchaser_phone)
        .bind(&sale.notes)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .bind(&sale.created_by)
        .execute(&mut *tx)
        .await?;

        for (position, line) in sale.items.iter().enumerate() {
            insert_line(&mut tx, line, position as i64).await?;

            let result = sqlx::query(
                r#"
                UPDATE items
                SET quantity = quantity - ?1, updated_at = ?2, updated_by = ?3
                WHERE id = ?4 AND owner_id = ?5 AND quantity >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(sale.created_at)
            .bind(&sale.created_by)
            .bind(&line.item_id)
            .bind(&sale.owner_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let current: Option<(String, i64)> =
                    sqlx::query_as("SELECT name, quantity FROM items WHERE id = ?1 AND owner_id = ?2")
                        .bind(&line.item_id)
                        .bind(&sale.owner_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                warn!(sale_id = %sale.id, item_id = %line.item_id, "Sale rejected at stock update");

                // Dropping the transaction rolls it back
                return Err(match current {
                    Some((name, available)) => CoreError::InsufficientStock {
                        name,
                        available,
                        requested: line.quantity,
                    },
                    None => CoreError::ItemNotFound(line.item_id.clone()),
                }
                .into());
            }
        }

        tx.commit().await?;

        info!(id = %sale.id, sale_type = %sale.sale_type, total = sale.total_cents, "Sale recorded");
        Ok(())
    }

    /// Deletes a sale and returns its units to stock, atomically.
    ///
    /// Lines whose item has since been deleted are skipped.
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, owner_id, id).await?;

        for line in &sale.items {
            sqlx::query(
                r#"
                UPDATE items SET quantity = MIN(?4, quantity + ?1)
                WHERE id = ?2 AND owner_id = ?3
                "#,
            )
            .bind(line.quantity)
            .bind(&line.item_id)
            .bind(owner_id)
            .bind(MAX_STOCK_LEVEL)
            .execute(&mut *tx)
            .await?;
        }

        // sale_items go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM sales WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, units = sale.total_units(), "Sale deleted, stock restored");
        Ok(sale)
    }
}

async fn fetch_sale(conn: &mut SqliteConnection, owner_id: &str, id: &str) -> DbResult<Sale> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND owner_id = ?2");
    let mut sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

    let sql = format!(
        "SELECT {LINE_COLUMNS} FROM sale_items si WHERE si.sale_id = ?1 ORDER BY si.position"
    );
    sale.items = sqlx::query_as::<_, SaleLine>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(sale)
}

async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine, position: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, position, item_id, item_name, sku, quantity,
            unit_price_cents, cash_price_cents, credit_price_cents, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(position)
    .bind(&line.item_id)
    .bind(&line.item_name)
    .bind(&line.sku)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.cash_price_cents)
    .bind(line.credit_price_cents)
    .bind(line.line_total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{account, item, setup};
    use chrono::{Duration, Utc};
    use stockbook_core::cart::{PaymentSplit, SaleCart, SaleDetails};
    use stockbook_core::money::Money;
    use stockbook_core::SaleType;

    fn cash_details(total_cents: i64) -> SaleDetails {
        SaleDetails {
            payment: PaymentSplit::cash(Money::from_cents(total_cents)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sale_decrements_and_delete_restores() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 150, 10);
        db.items().insert(&cola).await.unwrap();

        let mut cart = SaleCart::new();
        cart.add_item(&cola, 3).unwrap();
        let sale = cart
            .into_sale(SaleType::Retail, cash_details(450), &owner, "owner@shop.com", Utc::now())
            .unwrap();
        db.sales().create(&sale).await.unwrap();

        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 7);

        let stored = db.sales().get(&owner, &sale.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].item_name, "Cola");
        assert_eq!(stored.total_cents, 450);
        assert!(stored.pay_cash);

        let deleted = db.sales().delete(&owner, &sale.id).await.unwrap();
        assert_eq!(deleted.total_units(), 3);
        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 10);
        assert!(db.sales().get(&owner, &sale.id).await.is_err());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_whole_sale() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 100, 10);
        let chips = item(&owner, "Chips", "CHIPS", 100, 1);
        db.items().insert(&cola).await.unwrap();
        db.items().insert(&chips).await.unwrap();

        // Built against a stale view where chips had plenty of stock
        let mut stale_chips = chips.clone();
        stale_chips.quantity = 50;
        let mut cart = SaleCart::new();
        cart.add_item(&cola, 2).unwrap();
        cart.add_item(&stale_chips, 2).unwrap();
        let sale = cart
            .into_sale(SaleType::Retail, cash_details(400), &owner, "owner@shop.com", Utc::now())
            .unwrap();

        let err = db.sales().create(&sale).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 10);
        assert!(db.sales().list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_owner_scoped() {
        let (db, owner) = setup().await;
        let other = account(&db, "other@shop.com").await;
        let cola = item(&owner, "Cola", "COLA", 100, 20);
        db.items().insert(&cola).await.unwrap();

        let now = Utc::now();
        for days_ago in [3, 1, 2] {
            let mut cart = SaleCart::new();
            cart.add_item(&cola, 1).unwrap();
            let mut details = cash_details(100);
            details.sale_date = Some(now - Duration::days(days_ago));
            let sale = cart
                .into_sale(SaleType::Retail, details, &owner, "owner@shop.com", now)
                .unwrap();
            db.sales().create(&sale).await.unwrap();
        }

        let sales = db.sales().list(&owner).await.unwrap();
        assert_eq!(sales.len(), 3);
        assert!(sales.windows(2).all(|w| w[0].sale_date >= w[1].sale_date));
        assert!(sales.iter().all(|s| s.items.len() == 1));

        assert!(db.sales().list(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_owner_cannot_delete_sale() {
        let (db, owner) = setup().await;
        let other = account(&db, "other@shop.com").await;
        let cola = item(&owner, "Cola", "COLA", 100, 5);
        db.items().insert(&cola).await.unwrap();

        let mut cart = SaleCart::new();
        cart.add_item(&cola, 1).unwrap();
        let sale = cart
            .into_sale(SaleType::Retail, cash_details(100), &owner, "owner@shop.com", Utc::now())
            .unwrap();
        db.sales().create(&sale).await.unwrap();

        let err = db.sales().delete(&other, &sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 4);
    }
}
