//! # Spreadsheet Import Reconciliation
//!
//! Turns spreadsheet rows into a plan of creates and merges against the
//! owner's existing items. The plan is pure; the database applies it in
//! one transaction.
//!
//! ## Matching Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  row "Cola" @ $1.50                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find "cola" (trimmed, case-insensitive) among existing + planned       │
//! │       │                                                                 │
//! │       ├── none ─────────────────────────────► Create "Cola"             │
//! │       ├── same price ───────────────────────► Merge (add quantity)      │
//! │       └── other price                                                   │
//! │             │                                                           │
//! │             ▼  try "Cola (1)", "Cola (2)", ... "Cola (100)"             │
//! │             ├── free name ──────────────────► Create "Cola (n)"         │
//! │             ├── same price ─────────────────► Merge into "Cola (n)"     │
//! │             └── all taken ──────────────────► Skipped                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An item is never overwritten with a different price.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{new_id, Item};
use crate::validation::{
    normalize_optional_text, normalize_sku, validate_name, validate_price_cents,
    validate_stock_level,
};
use crate::{MAX_IMPORT_SUFFIX_ATTEMPTS, MAX_STOCK_LEVEL};

/// Longest SKU produced by [`derive_sku`] before a uniqueness suffix.
const DERIVED_SKU_LEN: usize = 20;

/// One data row read from the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    /// 1-based line in the source file (header is line 1).
    pub line: usize,
    pub name: String,
    pub sku: Option<String>,
    pub price: Money,
    pub quantity: i64,
    pub description: Option<String>,
    pub vendor: Option<String>,
}

/// What happens to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum ImportAction {
    Create {
        line: usize,
        #[serde(rename = "itemId")]
        item_id: String,
        name: String,
        sku: String,
        #[serde(rename = "priceCents")]
        price_cents: i64,
        quantity: i64,
        description: Option<String>,
        vendor: Option<String>,
    },
    Merge {
        line: usize,
        #[serde(rename = "itemId")]
        item_id: String,
        name: String,
        #[serde(rename = "quantityAdded")]
        quantity_added: i64,
    },
    Skipped {
        line: usize,
        name: String,
        reason: String,
    },
}

/// Ordered actions for a whole spreadsheet. Merges may target items
/// created earlier in the same plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlan {
    pub actions: Vec<ImportAction>,
}

impl ImportPlan {
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Create { .. }))
    }

    pub fn merged(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Merge { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Skipped { .. }))
    }

    /// True when applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.created() == 0 && self.merged() == 0
    }

    fn count(&self, pred: impl Fn(&ImportAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

/// An item as the planner sees it: existing or planned in this batch.
struct Known {
    id: String,
    name: String,
    key: String,
    price_cents: i64,
    sku: String,
    quantity: i64,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Plans an import of `rows` against the owner's `existing` items.
///
/// ## Example
/// ```rust
/// use stockbook_core::import::{plan_import, ImportAction, ImportRow};
/// use stockbook_core::money::Money;
///
/// let rows = vec![ImportRow {
///     line: 2,
///     name: "Cola".to_string(),
///     sku: None,
///     price: Money::from_cents(150),
///     quantity: 10,
///     description: None,
///     vendor: None,
/// }];
/// let plan = plan_import(&[], &rows);
/// assert_eq!(plan.created(), 1);
/// assert!(matches!(&plan.actions[0], ImportAction::Create { sku, .. } if sku == "COLA"));
/// ```
pub fn plan_import(existing: &[Item], rows: &[ImportRow]) -> ImportPlan {
    let mut known: Vec<Known> = existing
        .iter()
        .map(|item| Known {
            id: item.id.clone(),
            name: item.name.clone(),
            key: name_key(&item.name),
            price_cents: item.price_cents,
            sku: item.sku.clone(),
            quantity: item.quantity,
        })
        .collect();
    let mut taken_skus: HashSet<String> = existing.iter().map(|i| i.sku.clone()).collect();

    let mut plan = ImportPlan::default();
    for row in rows {
        let action = match plan_row(row, &mut known, &mut taken_skus) {
            Ok(action) => action,
            Err(reason) => ImportAction::Skipped {
                line: row.line,
                name: row.name.trim().to_string(),
                reason,
            },
        };
        plan.actions.push(action);
    }
    plan
}

fn plan_row(
    row: &ImportRow,
    known: &mut Vec<Known>,
    taken_skus: &mut HashSet<String>,
) -> Result<ImportAction, String> {
    let name = validate_name("name", &row.name).map_err(|e| e.to_string())?;
    validate_price_cents(row.price.cents()).map_err(|e| e.to_string())?;
    validate_stock_level(row.quantity).map_err(|e| e.to_string())?;

    let supplied_sku = match row.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(sku) => Some(normalize_sku(sku).map_err(|e| e.to_string())?),
        None => None,
    };
    let price_cents = row.price.cents();

    let target_name = match find(known, &name) {
        None => name.clone(),
        Some(found) if known[found].price_cents == price_cents => {
            return merge(row, &mut known[found], supplied_sku.as_deref(), taken_skus);
        }
        Some(_) => {
            let mut free_name = None;
            for n in 1..=MAX_IMPORT_SUFFIX_ATTEMPTS {
                let candidate = format!("{} ({})", name, n);
                match find(known, &candidate) {
                    None => {
                        free_name = Some(candidate);
                        break;
                    }
                    Some(found) if known[found].price_cents == price_cents => {
                        return merge(row, &mut known[found], supplied_sku.as_deref(), taken_skus);
                    }
                    Some(_) => continue,
                }
            }
            free_name.ok_or_else(|| {
                format!(
                    "no free name after {} attempts for a different price",
                    MAX_IMPORT_SUFFIX_ATTEMPTS
                )
            })?
        }
    };

    let sku = match supplied_sku {
        Some(sku) if taken_skus.contains(&sku) => {
            return Err(CoreError::DuplicateSku { sku }.to_string());
        }
        Some(sku) => sku,
        None => unique_sku(&derive_sku(&target_name), taken_skus),
    };

    let description = normalize_optional_text("description", row.description.as_deref())
        .map_err(|e| e.to_string())?;
    let vendor =
        normalize_optional_text("vendor", row.vendor.as_deref()).map_err(|e| e.to_string())?;

    let item_id = new_id();
    taken_skus.insert(sku.clone());
    known.push(Known {
        id: item_id.clone(),
        name: target_name.clone(),
        key: name_key(&target_name),
        price_cents,
        sku: sku.clone(),
        quantity: row.quantity,
    });

    Ok(ImportAction::Create {
        line: row.line,
        item_id,
        name: target_name,
        sku,
        price_cents,
        quantity: row.quantity,
        description,
        vendor,
    })
}

fn find(known: &[Known], name: &str) -> Option<usize> {
    let key = name_key(name);
    known.iter().position(|k| k.key == key)
}

/// A supplied SKU must belong to the merge target or be unused, and the
/// merged stock must stay within [`MAX_STOCK_LEVEL`].
fn merge(
    row: &ImportRow,
    target: &mut Known,
    supplied_sku: Option<&str>,
    taken_skus: &HashSet<String>,
) -> Result<ImportAction, String> {
    if let Some(sku) = supplied_sku {
        if sku != target.sku && taken_skus.contains(sku) {
            return Err(CoreError::DuplicateSku {
                sku: sku.to_string(),
            }
            .to_string());
        }
    }

    let merged = target.quantity + row.quantity;
    if merged > MAX_STOCK_LEVEL {
        return Err(format!(
            "stock of {} would exceed {}",
            target.name, MAX_STOCK_LEVEL
        ));
    }
    target.quantity = merged;

    Ok(ImportAction::Merge {
        line: row.line,
        item_id: target.id.clone(),
        name: target.name.clone(),
        quantity_added: row.quantity,
    })
}

// =============================================================================
// SKU Generation
// =============================================================================

/// Derives a SKU from an item name: alphanumeric words, upper-cased,
/// joined by hyphens.
///
/// ## Example
/// ```rust
/// use stockbook_core::import::derive_sku;
///
/// assert_eq!(derive_sku("Coca-Cola 330ml"), "COCA-COLA-330ML");
/// assert_eq!(derive_sku("Cola (2)"), "COLA-2");
/// assert_eq!(derive_sku("!!!"), "ITEM");
/// ```
pub fn derive_sku(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_uppercase)
        .collect();

    let mut sku = String::new();
    for word in words {
        let extra = if sku.is_empty() { word.len() } else { word.len() + 1 };
        if sku.len() + extra > DERIVED_SKU_LEN {
            if sku.is_empty() {
                sku.push_str(&word[..DERIVED_SKU_LEN]);
            }
            break;
        }
        if !sku.is_empty() {
            sku.push('-');
        }
        sku.push_str(&word);
    }

    if sku.is_empty() {
        "ITEM".to_string()
    } else {
        sku
    }
}

/// Returns `base` if unused, otherwise the first free `base-2`, `base-3`, ...
pub fn unique_sku(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn existing(id: &str, name: &str, sku: &str, price_cents: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            name: name.to_string(),
            price_cents,
            quantity: 5,
            sku: sku.to_string(),
            description: None,
            vendor: None,
            created_at: now,
            created_by: "owner@shop.com".to_string(),
            updated_at: now,
            updated_by: "owner@shop.com".to_string(),
        }
    }

    fn row(line: usize, name: &str, sku: Option<&str>, price_cents: i64, quantity: i64) -> ImportRow {
        ImportRow {
            line,
            name: name.to_string(),
            sku: sku.map(str::to_string),
            price: Money::from_cents(price_cents),
            quantity,
            description: None,
            vendor: None,
        }
    }

    #[test]
    fn test_same_name_same_price_merges() {
        let items = vec![existing("a", "Cola", "COLA", 150)];
        let plan = plan_import(&items, &[row(2, "  cola ", None, 150, 10)]);

        assert_eq!(
            plan.actions,
            vec![ImportAction::Merge {
                line: 2,
                item_id: "a".to_string(),
                name: "Cola".to_string(),
                quantity_added: 10,
            }]
        );
    }

    #[test]
    fn test_different_price_creates_suffixed_variant() {
        let items = vec![existing("a", "Cola", "COLA", 150)];
        let plan = plan_import(&items, &[row(2, "Cola", None, 175, 4)]);

        match &plan.actions[0] {
            ImportAction::Create {
                name,
                sku,
                price_cents,
                quantity,
                ..
            } => {
                assert_eq!(name, "Cola (1)");
                assert_eq!(sku, "COLA-1");
                assert_eq!(*price_cents, 175);
                assert_eq!(*quantity, 4);
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn test_suffix_search_merges_into_matching_variant() {
        let items = vec![
            existing("a", "Cola", "COLA", 150),
            existing("b", "Cola (1)", "COLA-1", 175),
            existing("c", "Cola (2)", "COLA-2", 200),
        ];
        let plan = plan_import(&items, &[row(2, "Cola", None, 200, 3)]);

        assert!(matches!(
            &plan.actions[0],
            ImportAction::Merge { item_id, quantity_added: 3, .. } if item_id == "c"
        ));
    }

    #[test]
    fn test_suffix_search_gives_up_after_limit() {
        let mut items = vec![existing("base", "Cola", "COLA", 100)];
        for n in 1..=MAX_IMPORT_SUFFIX_ATTEMPTS {
            items.push(existing(
                &format!("v{}", n),
                &format!("Cola ({})", n),
                &format!("COLA-V{}", n),
                100 + i64::from(n),
            ));
        }

        let plan = plan_import(&items, &[row(2, "Cola", None, 5, 1)]);
        assert_eq!(plan.skipped(), 1);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_rows_in_same_batch_see_each_other() {
        let rows = vec![
            row(2, "Chips", None, 99, 5),
            row(3, "CHIPS", None, 99, 7),
            row(4, "Chips", None, 120, 1),
        ];
        let plan = plan_import(&[], &rows);

        assert_eq!(plan.created(), 2);
        assert_eq!(plan.merged(), 1);

        let first_id = match &plan.actions[0] {
            ImportAction::Create { item_id, .. } => item_id.clone(),
            other => panic!("expected create, got {:?}", other),
        };
        assert!(matches!(
            &plan.actions[1],
            ImportAction::Merge { item_id, quantity_added: 7, .. } if *item_id == first_id
        ));
        assert!(matches!(
            &plan.actions[2],
            ImportAction::Create { name, .. } if name == "Chips (1)"
        ));
    }

    #[test]
    fn test_duplicate_supplied_sku_is_skipped() {
        let items = vec![existing("a", "Cola", "COLA", 150)];
        let rows = vec![
            row(2, "Lemonade", Some("cola"), 200, 1),
            row(3, "Water", Some("wat"), 80, 1),
            row(4, "Juice", Some("WAT"), 90, 1),
        ];
        let plan = plan_import(&items, &rows);

        assert!(matches!(
            &plan.actions[0],
            ImportAction::Skipped { reason, .. } if reason.contains("'COLA'")
        ));
        assert!(matches!(&plan.actions[1], ImportAction::Create { sku, .. } if sku == "WAT"));
        assert!(matches!(&plan.actions[2], ImportAction::Skipped { .. }));
    }

    #[test]
    fn test_generated_sku_avoids_collisions() {
        let items = vec![existing("a", "Soda Water", "SODA-WATER", 150)];
        let plan = plan_import(&items, &[row(2, "  SODA WATER ", None, 150, 1)]);
        assert_eq!(plan.merged(), 1);

        let plan = plan_import(&items, &[row(2, "Soda/Water", None, 90, 1)]);
        assert!(matches!(&plan.actions[0], ImportAction::Create { sku, .. } if sku == "SODA-WATER-2"));
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let plan = plan_import(
            &[],
            &[row(2, "  ", None, 100, 1), row(3, "Gum", None, 100, -1)],
        );
        assert_eq!(plan.skipped(), 2);
    }

    #[test]
    fn test_oversized_quantities_and_prices_are_skipped() {
        let items = vec![existing("a", "Cola", "COLA", 150)];
        let plan = plan_import(
            &items,
            &[
                row(2, "Cola", None, 150, i64::MAX),
                row(3, "Chips", None, 100, MAX_STOCK_LEVEL + 1),
                row(4, "Gold", None, 100_000_000_000_000_000, 1),
            ],
        );
        assert_eq!(plan.skipped(), 3);
        assert!(plan.actions.iter().all(|a| matches!(a, ImportAction::Skipped { .. })));
    }

    #[test]
    fn test_merge_that_would_overflow_stock_is_skipped() {
        // existing Cola holds 5 units
        let items = vec![existing("a", "Cola", "COLA", 150)];
        let plan = plan_import(
            &items,
            &[
                row(2, "Cola", None, 150, MAX_STOCK_LEVEL - 5),
                row(3, "Cola", None, 150, 1),
            ],
        );
        assert_eq!(plan.merged(), 1);
        assert!(matches!(
            &plan.actions[1],
            ImportAction::Skipped { line: 3, reason, .. } if reason.contains("would exceed")
        ));
    }

    #[test]
    fn test_derive_sku_truncates() {
        assert_eq!(derive_sku("Extra Large Family Size Pack"), "EXTRA-LARGE-FAMILY");
        assert_eq!(derive_sku("Supercalifragilisticexpialidocious"), "SUPERCALIFRAGILISTIC");
    }

    #[test]
    fn test_unique_sku() {
        let taken: HashSet<String> = ["A".to_string(), "A-2".to_string()].into_iter().collect();
        assert_eq!(unique_sku("A", &taken), "A-3");
        assert_eq!(unique_sku("B", &taken), "B");
    }
}
