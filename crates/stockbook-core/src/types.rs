//! # Domain Types
//!
//! Records stored by Stockbook. Every record belongs to one account
//! (`owner_id`) and is only ever read back through owner-scoped queries.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐               │
//! │  │    Item      │◄──│   SaleLine   │   │ PurchaseLine │──►(Item)      │
//! │  │  sku (UPPER) │   │  snapshot of │   │  unit | bulk │               │
//! │  │  price_cents │   │  name + sku  │   │  × 12 units  │               │
//! │  │  quantity    │   └──────┬───────┘   └──────┬───────┘               │
//! │  └──────────────┘          │                  │                        │
//! │                     ┌──────▼───────┐   ┌──────▼───────┐               │
//! │                     │    Sale      │   │   Purchase   │               │
//! │                     │ retail|whsl  │   │  total_cents │               │
//! │                     │ cash+credit  │   └──────────────┘               │
//! │                     └──────────────┘                                   │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐               │
//! │  │   Expense    │   │ ActivityLog  │   │   Account    │               │
//! │  │  category    │   │ append-only  │   │  owner of    │               │
//! │  └──────────────┘   └──────────────┘   │  everything  │               │
//! │                                        └──────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Items have a UUID `id` used for relations and a human `sku` that is
//! upper-cased and unique per owner.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::PaymentSplit;
use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::PricingType;

/// Generates a new record id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Item
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Account that owns this item.
    pub owner_id: String,

    /// Display name. Import matches on it case-insensitively.
    pub name: String,

    /// Selling price per unit, in cents.
    pub price_cents: i64,

    /// Units in stock.
    pub quantity: i64,

    /// Stock Keeping Unit, upper-cased, unique per owner.
    pub sku: String,

    pub description: Option<String>,

    pub vendor: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Email of the account that created the item.
    pub created_by: String,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub updated_by: String,
}

impl Item {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the units on hand at the selling price.
    pub fn stock_value(&self) -> Money {
        self.price().saturating_multiply_quantity(self.quantity.max(0))
    }

    /// Checks if stock is at or below the threshold.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    /// Checks if the requested units can be sold from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

/// Input for creating or updating an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// Retail sales stay under one box; wholesale sales start at one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Retail,
    Wholesale,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Retail => "retail",
            SaleType::Wholesale => "wholesale",
        }
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retail" => Ok(SaleType::Retail),
            "wholesale" => Ok(SaleType::Wholesale),
            _ => Err(ValidationError::NotAllowed {
                field: "sale type".to_string(),
                allowed: vec!["retail".to_string(), "wholesale".to_string()],
            }),
        }
    }
}

/// A recorded sale with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub owner_id: String,
    pub sale_type: SaleType,

    /// Lines live in their own table and are attached after loading.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleLine>,

    pub total_cents: i64,
    pub pay_cash: bool,
    pub cash_amount_cents: i64,
    pub pay_credit: bool,
    pub credit_amount_cents: i64,
    pub purchaser_name: Option<String>,
    pub purchaser_phone: Option<String>,
    pub notes: Option<String>,

    /// Business date of the sale (what the balance sheet sorts on).
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Units across all lines.
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// The cash / credit split recorded with the sale.
    pub fn payment(&self) -> PaymentSplit {
        PaymentSplit {
            pay_cash: self.pay_cash,
            cash_amount_cents: self.cash_amount_cents,
            pay_credit: self.pay_credit,
            credit_amount_cents: self.credit_amount_cents,
        }
    }
}

/// A line of a sale. Name and SKU are frozen at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    pub item_name: String,
    pub sku: String,
    pub quantity: i64,
    /// Price charged per unit.
    pub unit_price_cents: i64,
    /// Per-unit price when paid in cash.
    pub cash_price_cents: i64,
    /// Per-unit price when paid on credit.
    pub credit_price_cents: i64,
    /// unit_price × quantity
    pub line_total_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Stock bought from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub owner_id: String,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<PurchaseLine>,

    pub total_cents: i64,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Purchase {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Actual units received (boxes already expanded).
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

/// A line of a purchase.
///
/// `entered_*` keep what the user typed (boxes and box price for bulk
/// lines); `quantity` and `unit_cost_cents` are the expanded unit values.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub id: String,
    pub purchase_id: String,
    pub item_id: String,
    pub item_name: String,
    /// The item was created by this purchase.
    pub is_new_item: bool,
    pub pricing: PricingType,
    pub entered_quantity: i64,
    pub entered_price_cents: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
}

// =============================================================================
// Expense
// =============================================================================

/// Closed set of expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Rent,
    Utilities,
    Salaries,
    Supplies,
    Transport,
    Marketing,
    Maintenance,
    Taxes,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 9] = [
        ExpenseCategory::Rent,
        ExpenseCategory::Utilities,
        ExpenseCategory::Salaries,
        ExpenseCategory::Supplies,
        ExpenseCategory::Transport,
        ExpenseCategory::Marketing,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Taxes,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "rent",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Salaries => "salaries",
            ExpenseCategory::Supplies => "supplies",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Taxes => "taxes",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ExpenseCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ExpenseCategory::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

/// Money spent on running the business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: ExpenseCategory,
    pub amount_cents: i64,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub expense_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for creating or updating an expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub name: String,
    pub category: ExpenseCategory,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to now when omitted.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expense_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Activity Log
// =============================================================================

/// What happened. The log is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    StockAdjusted,
    ItemsImported,
    SaleCreated,
    SaleDeleted,
    PurchaseCreated,
    PurchaseDeleted,
    ExpenseCreated,
    ExpenseUpdated,
    ExpenseDeleted,
    ProfileUpdated,
}

/// One entry in the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub owner_id: String,
    pub action: ActivityAction,
    /// Human-readable sentence shown in the feed.
    pub details: String,
    pub item_id: Option<String>,
    pub sale_id: Option<String>,
    /// Short "field: old → new" summary for updates.
    pub change_summary: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Everything needed to append an activity entry.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub action: ActivityAction,
    pub details: String,
    pub item_id: Option<String>,
    pub sale_id: Option<String>,
    pub change_summary: Option<String>,
}

impl NewActivity {
    pub fn new(action: ActivityAction, details: impl Into<String>) -> Self {
        NewActivity {
            action,
            details: details.into(),
            item_id: None,
            sale_id: None,
            change_summary: None,
        }
    }

    pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_sale(mut self, sale_id: impl Into<String>) -> Self {
        self.sale_id = Some(sale_id.into());
        self
    }

    pub fn with_changes(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        if !summary.is_empty() {
            self.change_summary = Some(summary);
        }
        self
    }
}

/// Builds the "field: old → new" summary for an item update.
///
/// Only fields that actually changed appear.
pub fn item_change_summary(before: &Item, after: &ItemDraft) -> String {
    let mut changes = Vec::new();

    if before.name != after.name {
        changes.push(format!("name: {} → {}", before.name, after.name));
    }
    if before.sku != after.sku {
        changes.push(format!("sku: {} → {}", before.sku, after.sku));
    }
    if before.price_cents != after.price_cents {
        changes.push(format!(
            "price: {} → {}",
            before.price(),
            Money::from_cents(after.price_cents)
        ));
    }
    if before.quantity != after.quantity {
        changes.push(format!("quantity: {} → {}", before.quantity, after.quantity));
    }
    if before.description != after.description {
        changes.push("description".to_string());
    }
    if before.vendor != after.vendor {
        changes.push(format!(
            "vendor: {} → {}",
            before.vendor.as_deref().unwrap_or("-"),
            after.vendor.as_deref().unwrap_or("-")
        ));
    }

    changes.join("; ")
}

// =============================================================================
// Account
// =============================================================================

/// A signed-up user. Owns every record it creates.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Lower-cased; unique.
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
