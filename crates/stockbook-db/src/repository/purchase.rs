//! # Purchase Repository
//!
//! Database operations for purchases (stock intake).
//!
//! A purchase write creates any new items first (at zero stock), then adds
//! every line's units to its item, all in one transaction. Deleting a
//! purchase takes the units back out, never below zero.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::item::{fetch_item, insert_item, stock_limit_error};
use stockbook_core::cart::PurchasePlan;
use stockbook_core::{CoreError, Purchase, PurchaseLine, MAX_STOCK_LEVEL};

const PURCHASE_COLUMNS: &str =
    "id, owner_id, total_cents, notes, purchase_date, created_at, created_by";

const LINE_COLUMNS: &str = "pi.id, pi.purchase_id, pi.item_id, pi.item_name, pi.is_new_item, \
     pi.pricing, pi.entered_quantity, pi.entered_price_cents, pi.quantity, pi.unit_cost_cents, \
     pi.total_cost_cents";

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists the owner's purchases, newest first, with their lines.
    pub async fn list(&self, owner_id: &str) -> DbResult<Vec<Purchase>> {
        debug!(owner_id = %owner_id, "Listing purchases");

        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE owner_id = ?1 \
             ORDER BY purchase_date DESC, created_at DESC"
        );
        let mut purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM purchase_items pi \
             INNER JOIN purchases p ON p.id = pi.purchase_id \
             WHERE p.owner_id = ?1 \
             ORDER BY pi.purchase_id, pi.position"
        );
        let lines = sqlx::query_as::<_, PurchaseLine>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_purchase: HashMap<String, Vec<PurchaseLine>> = HashMap::new();
        for line in lines {
            by_purchase
                .entry(line.purchase_id.clone())
                .or_default()
                .push(line);
        }
        for purchase in &mut purchases {
            purchase.items = by_purchase.remove(&purchase.id).unwrap_or_default();
        }

        debug!(count = purchases.len(), "Purchase list returned");
        Ok(purchases)
    }

    /// Gets one of the owner's purchases with its lines.
    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Purchase> {
        let mut conn = self.pool.acquire().await?;
        fetch_purchase(&mut conn, owner_id, id).await
    }

    /// Writes a purchase plan: new items, the purchase, and the stock
    /// increments, atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::DuplicateSku))` - A new item's SKU was taken meanwhile
    /// * `Err(DbError::Domain(CoreError::ItemNotFound))` - A line names a missing item
    pub async fn create(&self, plan: &PurchasePlan) -> DbResult<()> {
        let purchase = &plan.purchase;
        debug!(
            id = %purchase.id,
            lines = purchase.items.len(),
            new_items = plan.new_items.len(),
            "Creating purchase"
        );

        let mut tx = self.pool.begin().await?;

        for item in &plan.new_items {
            insert_item(&mut tx, item).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, owner_id, total_cents, notes, purchase_date, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.owner_id)
        .bind(purchase.total_cents)
        .bind(&purchase.notes)
        .bind(purchase.purchase_date)
        .bind(purchase.created_at)
        .bind(&purchase.created_by)
        .execute(&mut *tx)
        .await?;

        for (position, line) in purchase.items.iter().enumerate() {
            insert_line(&mut tx, line, position as i64).await?;

            let result = sqlx::query(
                r#"
                UPDATE items
                SET quantity = quantity + ?1, updated_at = ?2, updated_by = ?3
                WHERE id = ?4 AND owner_id = ?5 AND quantity + ?1 <= ?6
                "#,
            )
            .bind(line.quantity)
            .bind(purchase.created_at)
            .bind(&purchase.created_by)
            .bind(&line.item_id)
            .bind(&purchase.owner_id)
            .bind(MAX_STOCK_LEVEL)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return match fetch_item(&mut tx, &purchase.owner_id, &line.item_id).await {
                    Ok(_) => Err(CoreError::from(stock_limit_error()).into()),
                    Err(DbError::NotFound { .. }) => {
                        Err(CoreError::ItemNotFound(line.item_id.clone()).into())
                    }
                    Err(e) => Err(e),
                };
            }
        }

        tx.commit().await?;

        info!(
            id = %purchase.id,
            total = purchase.total_cents,
            units = purchase.total_units(),
            "Purchase recorded"
        );
        Ok(())
    }

    /// Deletes a purchase and takes its units back out of stock.
    ///
    /// Stock is floored at zero when some of the units were already sold.
    /// Items the purchase created are kept.
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let purchase = fetch_purchase(&mut tx, owner_id, id).await?;

        for line in &purchase.items {
            sqlx::query(
                r#"
                UPDATE items SET quantity = MAX(0, quantity - ?1)
                WHERE id = ?2 AND owner_id = ?3
                "#,
            )
            .bind(line.quantity)
            .bind(&line.item_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM purchases WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, units = purchase.total_units(), "Purchase deleted, stock reversed");
        Ok(purchase)
    }
}

async fn fetch_purchase(
    conn: &mut SqliteConnection,
    owner_id: &str,
    id: &str,
) -> DbResult<Purchase> {
    let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1 AND owner_id = ?2");
    let mut purchase = sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase", id))?;

    let sql = format!(
        "SELECT {LINE_COLUMNS} FROM purchase_items pi WHERE pi.purchase_id = ?1 ORDER BY pi.position"
    );
    purchase.items = sqlx::query_as::<_, PurchaseLine>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(purchase)
}

async fn insert_line(
    conn: &mut SqliteConnection,
    line: &PurchaseLine,
    position: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_items (
            id, purchase_id, position, item_id, item_name, is_new_item, pricing,
            entered_quantity, entered_price_cents, quantity, unit_cost_cents, total_cost_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&line.id)
    .bind(&line.purchase_id)
    .bind(position)
    .bind(&line.item_id)
    .bind(&line.item_name)
    .bind(line.is_new_item)
    .bind(line.pricing.as_str())
    .bind(line.entered_quantity)
    .bind(line.entered_price_cents)
    .bind(line.quantity)
    .bind(line.unit_cost_cents)
    .bind(line.total_cost_cents)
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
    use crate::repository::test_support::{item, setup};
    use chrono::Utc;
    use stockbook_core::cart::{NewItemDraft, PurchaseCart, PurchaseCartLine, PurchaseTarget};
    use stockbook_core::money::Money;
    use stockbook_core::pricing::PricingType;

    #[tokio::test]
    async fn test_bulk_purchase_adds_units() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 150, 2);
        db.items().insert(&cola).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add_existing(&cola, PricingType::Bulk, 2, Money::from_cents(1200))
            .unwrap();
        let plan = cart
            .into_purchase(None, None, &db.items().skus(&owner).await.unwrap(), &owner, "owner@shop.com", Utc::now())
            .unwrap();
        db.purchases().create(&plan).await.unwrap();

        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 26);

        let stored = db.purchases().get(&owner, &plan.purchase.id).await.unwrap();
        assert_eq!(stored.total_cents, 2400);
        assert_eq!(stored.items[0].pricing, PricingType::Bulk);
        assert_eq!(stored.items[0].quantity, 24);
        assert_eq!(stored.items[0].unit_cost_cents, 100);
    }

    #[tokio::test]
    async fn test_purchase_creates_new_item() {
        let (db, owner) = setup().await;

        let mut cart = PurchaseCart::new();
        cart.add_line(PurchaseCartLine {
            target: PurchaseTarget::New {
                draft: NewItemDraft {
                    name: "Sparkling Water".to_string(),
                    sku: None,
                    price_cents: 2400,
                    description: None,
                    vendor: Some("Springs Ltd".to_string()),
                },
            },
            pricing: PricingType::Bulk,
            entered_quantity: 1,
            entered_price_cents: 1800,
        })
        .unwrap();
        let plan = cart
            .into_purchase(None, None, &Default::default(), &owner, "owner@shop.com", Utc::now())
            .unwrap();
        db.purchases().create(&plan).await.unwrap();

        let items = db.items().list_all(&owner).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Sparkling Water");
        assert_eq!(items[0].quantity, 12);
        // selling price entered per box, stored per unit
        assert_eq!(items[0].price_cents, 200);

        let stored = db.purchases().list(&owner).await.unwrap();
        assert!(stored[0].items[0].is_new_item);
    }

    #[tokio::test]
    async fn test_delete_floors_stock_at_zero() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 150, 0);
        db.items().insert(&cola).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add_existing(&cola, PricingType::Unit, 10, Money::from_cents(90))
            .unwrap();
        let plan = cart
            .into_purchase(None, None, &Default::default(), &owner, "owner@shop.com", Utc::now())
            .unwrap();
        db.purchases().create(&plan).await.unwrap();

        // 7 of the 10 units sold off meanwhile
        db.items()
            .adjust_stock(&owner, &cola.id, -7, "owner@shop.com", Utc::now())
            .await
            .unwrap();

        let deleted = db.purchases().delete(&owner, &plan.purchase.id).await.unwrap();
        assert_eq!(deleted.total_units(), 10);
        assert_eq!(db.items().get(&owner, &cola.id).await.unwrap().quantity, 0);
        assert!(db.purchases().list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_past_stock_ceiling_rolls_back() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 150, MAX_STOCK_LEVEL - 5);
        db.items().insert(&cola).await.unwrap();

        let mut cart = PurchaseCart::new();
        cart.add_existing(&cola, PricingType::Unit, 10, Money::from_cents(90))
            .unwrap();
        let plan = cart
            .into_purchase(None, None, &Default::default(), &owner, "owner@shop.com", Utc::now())
            .unwrap();

        let err = db.purchases().create(&plan).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(
            db.items().get(&owner, &cola.id).await.unwrap().quantity,
            MAX_STOCK_LEVEL - 5
        );
        assert!(db.purchases().list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_item_rolls_back() {
        let (db, owner) = setup().await;
        let ghost = item(&owner, "Ghost", "GHOST", 100, 0);

        let mut cart = PurchaseCart::new();
        cart.add_existing(&ghost, PricingType::Unit, 1, Money::from_cents(50))
            .unwrap();
        let plan = cart
            .into_purchase(None, None, &Default::default(), &owner, "owner@shop.com", Utc::now())
            .unwrap();

        let err = db.purchases().create(&plan).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
        assert!(db.purchases().list(&owner).await.unwrap().is_empty());
    }
}
