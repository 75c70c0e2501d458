//! # Item Repository
//!
//! Database operations for inventory items.
//!
//! ## Key Operations
//! - Owner-scoped list with search and sort
//! - CRUD with per-owner SKU uniqueness
//! - Relative stock adjustments
//! - Applying a spreadsheet import plan in one transaction

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockbook_core::import::{ImportAction, ImportPlan};
use stockbook_core::validation::validate_stock_delta;
use stockbook_core::{CoreError, Item, ItemDraft, ValidationError, MAX_STOCK_LEVEL};

pub(crate) const ITEM_COLUMNS: &str = "id, owner_id, name, price_cents, quantity, sku, description, vendor, \
     created_at, created_by, updated_at, updated_by";

// =============================================================================
// Query Options
// =============================================================================

/// Sort order for item lists. Newest first unless asked otherwise, like
/// every other list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSort {
    Name,
    NameDesc,
    PriceAsc,
    PriceDesc,
    QuantityAsc,
    QuantityDesc,
    #[default]
    Newest,
    Oldest,
}

impl ItemSort {
    fn order_by(&self) -> &'static str {
        match self {
            ItemSort::Name => "name COLLATE NOCASE ASC, id ASC",
            ItemSort::NameDesc => "name COLLATE NOCASE DESC, id ASC",
            ItemSort::PriceAsc => "price_cents ASC, name COLLATE NOCASE ASC",
            ItemSort::PriceDesc => "price_cents DESC, name COLLATE NOCASE ASC",
            ItemSort::QuantityAsc => "quantity ASC, name COLLATE NOCASE ASC",
            ItemSort::QuantityDesc => "quantity DESC, name COLLATE NOCASE ASC",
            ItemSort::Newest => "created_at DESC, id ASC",
            ItemSort::Oldest => "created_at ASC, id ASC",
        }
    }
}

impl FromStr for ItemSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "name_asc" => Ok(ItemSort::Name),
            "name_desc" => Ok(ItemSort::NameDesc),
            "price" | "price_asc" => Ok(ItemSort::PriceAsc),
            "price_desc" => Ok(ItemSort::PriceDesc),
            "quantity" | "quantity_asc" => Ok(ItemSort::QuantityAsc),
            "quantity_desc" => Ok(ItemSort::QuantityDesc),
            "newest" => Ok(ItemSort::Newest),
            "oldest" => Ok(ItemSort::Oldest),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: [
                    "name",
                    "name_desc",
                    "price_asc",
                    "price_desc",
                    "quantity_asc",
                    "quantity_desc",
                    "newest",
                    "oldest",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

/// Filters for [`ItemRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Case-insensitive substring of name, SKU or vendor.
    pub search: Option<String>,
    pub sort: ItemSort,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
/// let results = repo.list(&owner_id, &ItemQuery { search: Some("cola".into()), ..Default::default() }).await?;
/// let item = repo.get(&owner_id, &item_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists the owner's items, optionally filtered by a search term.
    ///
    /// The term matches anywhere in the name, SKU or vendor. `%` and `_`
    /// in the term are matched literally.
    pub async fn list(&self, owner_id: &str, query: &ItemQuery) -> DbResult<Vec<Item>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        debug!(owner_id = %owner_id, search = ?search, sort = ?query.sort, "Listing items");

        let items = match search {
            Some(term) => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM items \
                     WHERE owner_id = ?1 \
                     AND (name LIKE ?2 ESCAPE '\\' OR sku LIKE ?2 ESCAPE '\\' OR IFNULL(vendor, '') LIKE ?2 ESCAPE '\\') \
                     ORDER BY {}",
                    query.sort.order_by()
                );
                sqlx::query_as::<_, Item>(&sql)
                    .bind(owner_id)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = ?1 ORDER BY {}",
                    query.sort.order_by()
                );
                sqlx::query_as::<_, Item>(&sql)
                    .bind(owner_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = items.len(), "Item list returned");
        Ok(items)
    }

    /// Every item of the owner, by name.
    pub async fn list_all(&self, owner_id: &str) -> DbResult<Vec<Item>> {
        self.list(owner_id, &ItemQuery::default()).await
    }

    /// Gets one of the owner's items.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such item, or it belongs to someone else
    pub async fn get(&self, owner_id: &str, id: &str) -> DbResult<Item> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, owner_id, id).await
    }

    /// All SKUs the owner uses, for uniqueness checks before a batch write.
    pub async fn skus(&self, owner_id: &str) -> DbResult<HashSet<String>> {
        let skus: Vec<String> = sqlx::query_scalar("SELECT sku FROM items WHERE owner_id = ?1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(skus.into_iter().collect())
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::DuplicateSku))` - The owner already has this SKU
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_item(&mut conn, item).await?;
        info!(id = %item.id, sku = %item.sku, "Item created");
        Ok(())
    }

    /// Overwrites an item's editable fields and returns the stored row.
    ///
    /// `draft` is expected to be normalized already.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        draft: &ItemDraft,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Item> {
        debug!(id = %id, sku = %draft.sku, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?1, sku = ?2, price_cents = ?3, quantity = ?4,
                description = ?5, vendor = ?6, updated_at = ?7, updated_by = ?8
            WHERE id = ?9 AND owner_id = ?10
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.sku)
        .bind(draft.price_cents)
        .bind(draft.quantity)
        .bind(&draft.description)
        .bind(&draft.vendor)
        .bind(now)
        .bind(updated_by)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &draft.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        info!(id = %id, "Item updated");
        self.get(owner_id, id).await
    }

    /// Adds `delta` (may be negative) to an item's stock.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - Stock would go below zero
    /// * `Err(DbError::Domain(CoreError::Validation))` - Zero delta, or stock would exceed `MAX_STOCK_LEVEL`
    /// * `Err(DbError::NotFound)` - No such item
    pub async fn adjust_stock(
        &self,
        owner_id: &str,
        id: &str,
        delta: i64,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Item> {
        debug!(id = %id, delta = delta, "Adjusting stock");
        validate_stock_delta(delta).map_err(CoreError::from)?;

        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity + ?1, updated_at = ?2, updated_by = ?3
            WHERE id = ?4 AND owner_id = ?5 AND quantity + ?1 BETWEEN 0 AND ?6
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(updated_by)
        .bind(id)
        .bind(owner_id)
        .bind(MAX_STOCK_LEVEL)
        .execute(&mut *conn)
        .await?;

        let item = fetch_item(&mut conn, owner_id, id).await?;
        if result.rows_affected() == 0 {
            if delta > 0 {
                return Err(CoreError::from(stock_limit_error()).into());
            }
            return Err(CoreError::InsufficientStock {
                name: item.name,
                available: item.quantity,
                requested: -delta,
            }
            .into());
        }

        info!(id = %id, quantity = item.quantity, "Stock adjusted");
        Ok(item)
    }

    /// Deletes an item and returns what was deleted.
    ///
    /// Sale and purchase lines keep their name snapshot.
    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<Item> {
        let mut tx = self.pool.begin().await?;

        let item = fetch_item(&mut tx, owner_id, id).await?;
        sqlx::query("DELETE FROM items WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, sku = %item.sku, "Item deleted");
        Ok(item)
    }

    /// Applies an import plan atomically: every create and merge lands, or
    /// none does.
    pub async fn apply_import(
        &self,
        owner_id: &str,
        plan: &ImportPlan,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(
            owner_id = %owner_id,
            created = plan.created(),
            merged = plan.merged(),
            skipped = plan.skipped(),
            "Applying import"
        );

        if plan.is_noop() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for action in &plan.actions {
            match action {
                ImportAction::Create {
                    item_id,
                    name,
                    sku,
                    price_cents,
                    quantity,
                    description,
                    vendor,
                    ..
                } => {
                    let item = Item {
                        id: item_id.clone(),
                        owner_id: owner_id.to_string(),
                        name: name.clone(),
                        price_cents: *price_cents,
                        quantity: *quantity,
                        sku: sku.clone(),
                        description: description.clone(),
                        vendor: vendor.clone(),
                        created_at: now,
                        created_by: actor.to_string(),
                        updated_at: now,
                        updated_by: actor.to_string(),
                    };
                    insert_item(&mut tx, &item).await?;
                }
                ImportAction::Merge {
                    item_id,
                    quantity_added,
                    ..
                } => {
                    let result = sqlx::query(
                        r#"
                        UPDATE items
                        SET quantity = quantity + ?1, updated_at = ?2, updated_by = ?3
                        WHERE id = ?4 AND owner_id = ?5 AND quantity + ?1 BETWEEN 0 AND ?6
                        "#,
                    )
                    .bind(quantity_added)
                    .bind(now)
                    .bind(actor)
                    .bind(item_id)
                    .bind(owner_id)
                    .bind(MAX_STOCK_LEVEL)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        // distinguishes a vanished item from an out-of-range merge
                        fetch_item(&mut tx, owner_id, item_id).await?;
                        return Err(CoreError::from(stock_limit_error()).into());
                    }
                }
                ImportAction::Skipped { .. } => {}
            }
        }

        tx.commit().await?;

        info!(owner_id = %owner_id, created = plan.created(), merged = plan.merged(), "Import applied");
        Ok(())
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Raised when an increment would push stock past [`MAX_STOCK_LEVEL`].
pub(crate) fn stock_limit_error() -> ValidationError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 0,
        max: MAX_STOCK_LEVEL,
    }
}

/// Fetches one of the owner's items on an existing connection or transaction.
pub(crate) async fn fetch_item(
    conn: &mut SqliteConnection,
    owner_id: &str,
    id: &str,
) -> DbResult<Item> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND owner_id = ?2");
    sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Item", id))
}

/// Inserts an item on an existing connection or transaction.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &Item) -> DbResult<()> {
    debug!(id = %item.id, sku = %item.sku, "Inserting item");

    sqlx::query(
        r#"
        INSERT INTO items (
            id, owner_id, name, price_cents, quantity, sku, description, vendor,
            created_at, created_by, updated_at, updated_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&item.id)
    .bind(&item.owner_id)
    .bind(&item.name)
    .bind(item.price_cents)
    .bind(item.quantity)
    .bind(&item.sku)
    .bind(&item.description)
    .bind(&item.vendor)
    .bind(item.created_at)
    .bind(&item.created_by)
    .bind(item.updated_at)
    .bind(&item.updated_by)
    .execute(&mut *conn)
    .await
    .map_err(|e| sku_conflict(e, &item.sku))?;

    Ok(())
}

/// Turns a unique failure on (owner_id, sku) into the user-facing
/// duplicate-SKU error.
fn sku_conflict(err: sqlx::Error, sku: &str) -> DbError {
    let err = DbError::from(err);
    if err.is_unique_violation_on("items.sku") {
        CoreError::DuplicateSku {
            sku: sku.to_string(),
        }
        .into()
    } else {
        err
    }
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{item, setup};
    use stockbook_core::import::{plan_import, ImportRow};
    use stockbook_core::money::Money;
    use stockbook_core::sheet::read_item_sheet;

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, owner) = setup().await;
        let repo = db.items();

        let cola = item(&owner, "Cola", "COLA", 150, 10);
        repo.insert(&cola).await.unwrap();

        let stored = repo.get(&owner, &cola.id).await.unwrap();
        assert_eq!(stored.name, "Cola");
        assert_eq!(stored.price_cents, 150);
        assert_eq!(stored.quantity, 10);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_domain_error() {
        let (db, owner) = setup().await;
        let repo = db.items();

        repo.insert(&item(&owner, "Cola", "COLA", 150, 10)).await.unwrap();
        let err = repo
            .insert(&item(&owner, "Cola Zero", "COLA", 160, 5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateSku { ref sku }) if sku == "COLA"
        ));
    }

    #[tokio::test]
    async fn test_same_sku_allowed_for_different_owners() {
        let (db, owner) = setup().await;
        let other = crate::repository::test_support::account(&db, "other@shop.com").await;

        db.items().insert(&item(&owner, "Cola", "COLA", 150, 1)).await.unwrap();
        db.items().insert(&item(&other, "Cola", "COLA", 150, 1)).await.unwrap();

        assert_eq!(db.items().list_all(&owner).await.unwrap().len(), 1);
        assert_eq!(db.items().list_all(&other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_read_item() {
        let (db, owner) = setup().await;
        let other = crate::repository::test_support::account(&db, "other@shop.com").await;

        let cola = item(&owner, "Cola", "COLA", 150, 1);
        db.items().insert(&cola).await.unwrap();

        let err = db.items().get(&other, &cola.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_and_sort() {
        let (db, owner) = setup().await;
        let repo = db.items();

        repo.insert(&item(&owner, "Cola", "COLA", 150, 10)).await.unwrap();
        repo.insert(&item(&owner, "Apple Juice", "AJ-1", 300, 2)).await.unwrap();
        repo.insert(&item(&owner, "100% Orange", "OJ", 250, 5)).await.unwrap();

        let by_name = repo
            .list(&owner, &ItemQuery { search: None, sort: ItemSort::Name })
            .await
            .unwrap();
        let names: Vec<&str> = by_name.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["100% Orange", "Apple Juice", "Cola"]);

        let by_price = repo
            .list(&owner, &ItemQuery { search: None, sort: ItemSort::PriceDesc })
            .await
            .unwrap();
        assert_eq!(by_price[0].name, "Apple Juice");

        let found = repo
            .list(&owner, &ItemQuery { search: Some("aj".to_string()), sort: ItemSort::Name })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        // % is literal, not a wildcard
        let found = repo
            .list(&owner, &ItemQuery { search: Some("0%".to_string()), sort: ItemSort::Name })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "OJ");
    }

    #[tokio::test]
    async fn test_update_returns_stored_item() {
        let (db, owner) = setup().await;
        let repo = db.items();
        let cola = item(&owner, "Cola", "COLA", 150, 10);
        repo.insert(&cola).await.unwrap();

        let draft = ItemDraft {
            name: "Cola Classic".to_string(),
            sku: "COLA-C".to_string(),
            price_cents: 175,
            quantity: 8,
            description: None,
            vendor: Some("Acme".to_string()),
        };
        let updated = repo
            .update(&owner, &cola.id, &draft, "owner@shop.com", Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.name, "Cola Classic");
        assert_eq!(updated.sku, "COLA-C");
        assert_eq!(updated.vendor.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let (db, owner) = setup().await;
        let draft = ItemDraft {
            name: "Ghost".to_string(),
            sku: "GHOST".to_string(),
            price_cents: 1,
            quantity: 0,
            description: None,
            vendor: None,
        };
        let err = db
            .items()
            .update(&owner, "missing", &draft, "owner@shop.com", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let (db, owner) = setup().await;
        let repo = db.items();
        let cola = item(&owner, "Cola", "COLA", 150, 3);
        repo.insert(&cola).await.unwrap();

        let item = repo.adjust_stock(&owner, &cola.id, 4, "x", Utc::now()).await.unwrap();
        assert_eq!(item.quantity, 7);

        let err = repo
            .adjust_stock(&owner, &cola.id, -8, "x", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 7, requested: 8, .. })
        ));
        assert_eq!(repo.get(&owner, &cola.id).await.unwrap().quantity, 7);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_out_of_range_delta() {
        let (db, owner) = setup().await;
        let repo = db.items();
        let cola = item(&owner, "Cola", "COLA", 150, 5);
        repo.insert(&cola).await.unwrap();

        for delta in [0, i64::MAX, i64::MIN, MAX_STOCK_LEVEL] {
            let err = repo
                .adjust_stock(&owner, &cola.id, delta, "x", Utc::now())
                .await
                .unwrap_err();
            assert!(
                matches!(err, DbError::Domain(CoreError::Validation(_))),
                "delta {} gave {:?}",
                delta,
                err
            );
        }

        let items = repo.list_all(&owner).await.unwrap();
        assert_eq!(items[0].quantity, 5);

        let item = repo
            .adjust_stock(&owner, &cola.id, MAX_STOCK_LEVEL - 5, "x", Utc::now())
            .await
            .unwrap();
        assert_eq!(item.quantity, MAX_STOCK_LEVEL);
    }

    #[tokio::test]
    async fn test_import_with_huge_quantity_leaves_items_readable() {
        let (db, owner) = setup().await;
        let repo = db.items();
        repo.insert(&item(&owner, "Cola", "COLA", 150, 5)).await.unwrap();

        let sheet = read_item_sheet("Name,Price,Quantity\nCola,1.50,9223372036854775807\n").unwrap();
        let plan = plan_import(&repo.list_all(&owner).await.unwrap(), &sheet.rows);
        assert_eq!(plan.skipped(), 1);
        repo.apply_import(&owner, &plan, "owner@shop.com", Utc::now())
            .await
            .unwrap();

        let items = repo.list_all(&owner).await.unwrap();
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_apply_import_refuses_merge_past_stock_ceiling() {
        let (db, owner) = setup().await;
        let repo = db.items();
        let cola = item(&owner, "Cola", "COLA", 150, 5);
        repo.insert(&cola).await.unwrap();

        let plan = ImportPlan {
            actions: vec![ImportAction::Merge {
                line: 2,
                item_id: cola.id.clone(),
                name: "Cola".to_string(),
                quantity_added: MAX_STOCK_LEVEL,
            }],
        };
        let err = repo
            .apply_import(&owner, &plan, "owner@shop.com", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let items = repo.list_all(&owner).await.unwrap();
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_delete_returns_item() {
        let (db, owner) = setup().await;
        let cola = item(&owner, "Cola", "COLA", 150, 3);
        db.items().insert(&cola).await.unwrap();

        let deleted = db.items().delete(&owner, &cola.id).await.unwrap();
        assert_eq!(deleted.id, cola.id);
        assert!(db.items().list_all(&owner).await.unwrap().is_empty());
        assert!(db.items().delete(&owner, &cola.id).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_import_creates_and_merges() {
        let (db, owner) = setup().await;
        let repo = db.items();
        repo.insert(&item(&owner, "Cola", "COLA", 150, 10)).await.unwrap();

        let existing = repo.list_all(&owner).await.unwrap();
        let rows = vec![
            ImportRow {
                line: 2,
                name: "cola".to_string(),
                sku: None,
                price: Money::from_cents(150),
                quantity: 5,
                description: None,
                vendor: None,
            },
            ImportRow {
                line: 3,
                name: "Cola".to_string(),
                sku: None,
                price: Money::from_cents(175),
                quantity: 4,
                description: None,
                vendor: None,
            },
        ];
        let plan = plan_import(&existing, &rows);
        repo.apply_import(&owner, &plan, "owner@shop.com", Utc::now())
            .await
            .unwrap();

        let items = repo.list_all(&owner).await.unwrap();
        assert_eq!(items.len(), 2);
        let original = items.iter().find(|i| i.name == "Cola").unwrap();
        assert_eq!(original.quantity, 15);
        assert_eq!(original.price_cents, 150);
        let variant = items.iter().find(|i| i.name == "Cola (1)").unwrap();
        assert_eq!(variant.price_cents, 175);
        assert_eq!(variant.quantity, 4);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(ItemQuery::default().sort, ItemSort::Newest);
        assert_eq!("price_desc".parse::<ItemSort>().unwrap(), ItemSort::PriceDesc);
        assert_eq!("NAME".parse::<ItemSort>().unwrap(), ItemSort::Name);
        assert!("color".parse::<ItemSort>().is_err());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
