//! # Sale and Purchase Carts
//!
//! A cart collects lines before a sale or purchase is written. All the
//! checks that must hold before any write happen here.
//!
//! ## Sale Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item() ──► lines unique by item id (quantities merge)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate(sale_type)                                                    │
//! │       ├── empty?                       → EmptyCart                      │
//! │       ├── retail and units > 11?       → RetailQuantityExceeded         │
//! │       └── wholesale and units < 12?    → WholesaleQuantityTooSmall      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_stock(items)                    → InsufficientStock              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentSplit::reconcile(total)        → NoPaymentMethod /              │
//! │       │                                  UnselectedPaymentAmount /      │
//! │       ▼                                  PaymentMismatch                │
//! │  into_sale() ──► Sale with frozen name / sku / price per line          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::import::{derive_sku, unique_sku};
use crate::money::Money;
use crate::pricing::{per_unit_price, PricedQuantity, PricingType};
use crate::types::{new_id, Item, Purchase, PurchaseLine, Sale, SaleLine, SaleType};
use crate::validation::{
    normalize_optional_text, normalize_sku, validate_cart_size, validate_name,
    validate_price_cents, validate_quantity,
};
use crate::{BULK_UNIT_SIZE, MAX_LINE_QUANTITY, PAYMENT_TOLERANCE_CENTS, RETAIL_MAX_UNITS};

// =============================================================================
// Payment Split
// =============================================================================

/// How a sale is paid: cash, credit, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    pub pay_cash: bool,
    #[serde(default)]
    pub cash_amount_cents: i64,
    pub pay_credit: bool,
    #[serde(default)]
    pub credit_amount_cents: i64,
}

impl PaymentSplit {
    /// Whole total in cash.
    pub fn cash(total: Money) -> Self {
        PaymentSplit {
            pay_cash: true,
            cash_amount_cents: total.cents(),
            pay_credit: false,
            credit_amount_cents: 0,
        }
    }

    /// Whole total on credit.
    pub fn credit(total: Money) -> Self {
        PaymentSplit {
            pay_cash: false,
            cash_amount_cents: 0,
            pay_credit: true,
            credit_amount_cents: total.cents(),
        }
    }

    /// Cash plus credit.
    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.cash_amount_cents) + Money::from_cents(self.credit_amount_cents)
    }

    /// Checks the split against the sale total.
    ///
    /// ## Rules
    /// - At least one method is selected
    /// - Amounts are never negative
    /// - A method that is not selected carries zero
    /// - cash + credit is within one cent of the total
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::cart::PaymentSplit;
    /// use stockbook_core::money::Money;
    ///
    /// let split = PaymentSplit {
    ///     pay_cash: true,
    ///     cash_amount_cents: 600,
    ///     pay_credit: true,
    ///     credit_amount_cents: 399,
    /// };
    /// assert!(split.reconcile(Money::from_cents(1000)).is_ok());
    /// assert!(split.reconcile(Money::from_cents(1002)).is_err());
    /// ```
    pub fn reconcile(&self, total: Money) -> CoreResult<()> {
        if !self.pay_cash && !self.pay_credit {
            return Err(CoreError::NoPaymentMethod);
        }

        if self.cash_amount_cents < 0 || self.credit_amount_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "payment amount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        if !self.pay_cash && self.cash_amount_cents != 0 {
            return Err(CoreError::UnselectedPaymentAmount {
                method: "cash".to_string(),
            });
        }
        if !self.pay_credit && self.credit_amount_cents != 0 {
            return Err(CoreError::UnselectedPaymentAmount {
                method: "credit".to_string(),
            });
        }

        let paid = self.paid();
        if !paid.is_within(total, Money::from_cents(PAYMENT_TOLERANCE_CENTS)) {
            return Err(CoreError::PaymentMismatch {
                expected: total,
                received: paid,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Sale Cart
// =============================================================================

/// A line in a sale cart. Name, SKU and prices are frozen when added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleCartLine {
    pub item_id: String,
    pub item_name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub cash_price_cents: i64,
    pub credit_price_cents: i64,
}

impl SaleCartLine {
    /// Creates a line at the item's current selling price.
    pub fn from_item(item: &Item, quantity: i64) -> Self {
        SaleCartLine {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            sku: item.sku.clone(),
            quantity,
            unit_price_cents: item.price_cents,
            cash_price_cents: item.price_cents,
            credit_price_cents: item.price_cents,
        }
    }

    pub fn line_total(&self) -> CoreResult<Money> {
        Ok(Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)?)
    }
}

/// Lines of a sale being assembled.
///
/// ## Invariants
/// - Lines are unique by `item_id` (adding the same item merges quantity)
/// - Every quantity is > 0 (setting 0 removes the line)
/// - At most [`crate::MAX_CART_LINES`] lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleCart {
    pub lines: Vec<SaleCartLine>,
}

/// Details entered alongside the sale lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetails {
    pub payment: PaymentSplit,
    #[serde(default)]
    pub purchaser_name: Option<String>,
    #[serde(default)]
    pub purchaser_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the time of recording.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sale_date: Option<DateTime<Utc>>,
}

impl SaleCart {
    pub fn new() -> Self {
        SaleCart::default()
    }

    /// Adds an item at its current price, merging with an existing line.
    pub fn add_item(&mut self, item: &Item, quantity: i64) -> CoreResult<()> {
        self.add_line(SaleCartLine::from_item(item, quantity))
    }

    /// Adds a prepared line, merging quantity when the item is already in
    /// the cart. The first line's prices win.
    pub fn add_line(&mut self, line: SaleCartLine) -> CoreResult<()> {
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_price_cents)?;

        if let Some(existing) = self.lines.iter_mut().find(|l| l.item_id == line.item_id) {
            let merged = existing.quantity + line.quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_LINE_QUANTITY,
                }
                .into());
            }
            existing.quantity = merged;
            return Ok(());
        }

        validate_cart_size(self.lines.len())
            .map_err(|_| CoreError::CartTooLarge { max: crate::MAX_CART_LINES })?;

        self.lines.push(line);
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(item_id);
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by item id.
    pub fn remove(&mut self, item_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);

        if self.lines.len() == before {
            Err(CoreError::ItemNotFound(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines; this is what the sale type rule looks at.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| -> CoreResult<Money> {
            Ok(acc.checked_add(line.line_total()?)?)
        })
    }

    /// Checks the cart against the sale type rules.
    pub fn validate(&self, sale_type: SaleType) -> CoreResult<()> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let total = self.total_quantity();
        match sale_type {
            SaleType::Retail if total > RETAIL_MAX_UNITS => {
                Err(CoreError::RetailQuantityExceeded {
                    total,
                    max: RETAIL_MAX_UNITS,
                })
            }
            SaleType::Wholesale if total < BULK_UNIT_SIZE => {
                Err(CoreError::WholesaleQuantityTooSmall {
                    total,
                    min: BULK_UNIT_SIZE,
                })
            }
            _ => Ok(()),
        }
    }

    /// Checks every line against the current stock of its item.
    ///
    /// A line whose item is missing from `items` fails with `ItemNotFound`.
    pub fn check_stock(&self, items: &[Item]) -> CoreResult<()> {
        for line in &self.lines {
            let item = items
                .iter()
                .find(|i| i.id == line.item_id)
                .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;

            if !item.can_sell(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    name: item.name.clone(),
                    available: item.quantity,
                    requested: line.quantity,
                });
            }
        }
        Ok(())
    }

    /// Runs every pre-write check and builds the sale record.
    pub fn into_sale(
        self,
        sale_type: SaleType,
        details: SaleDetails,
        owner_id: &str,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Sale> {
        self.validate(sale_type)?;

        let total = self.total()?;
        details.payment.reconcile(total)?;

        let sale_id = new_id();
        let mut items = Vec::with_capacity(self.lines.len());
        for line in self.lines {
            items.push(SaleLine {
                id: new_id(),
                sale_id: sale_id.clone(),
                line_total_cents: line.line_total()?.cents(),
                item_id: line.item_id,
                item_name: line.item_name,
                sku: line.sku,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                cash_price_cents: line.cash_price_cents,
                credit_price_cents: line.credit_price_cents,
            });
        }

        Ok(Sale {
            id: sale_id,
            owner_id: owner_id.to_string(),
            sale_type,
            items,
            total_cents: total.cents(),
            pay_cash: details.payment.pay_cash,
            cash_amount_cents: details.payment.cash_amount_cents,
            pay_credit: details.payment.pay_credit,
            credit_amount_cents: details.payment.credit_amount_cents,
            purchaser_name: normalize_optional_text(
                "purchaser name",
                details.purchaser_name.as_deref(),
            )?,
            purchaser_phone: normalize_optional_text(
                "purchaser phone",
                details.purchaser_phone.as_deref(),
            )?,
            notes: normalize_optional_text("notes", details.notes.as_deref())?,
            sale_date: details.sale_date.unwrap_or(now),
            created_at: now,
            created_by: created_by.to_string(),
        })
    }
}

// =============================================================================
// Purchase Cart
// =============================================================================

/// An item that does not exist yet and is created by the purchase.
///
/// `price_cents` is the selling price under the line's pricing type, so a
/// bulk line's price is per box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewItemDraft {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// What a purchase line restocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PurchaseTarget {
    Existing {
        #[serde(rename = "itemId")]
        item_id: String,
        #[serde(rename = "itemName")]
        item_name: String,
    },
    New {
        draft: NewItemDraft,
    },
}

impl PurchaseTarget {
    pub fn name(&self) -> &str {
        match self {
            PurchaseTarget::Existing { item_name, .. } => item_name,
            PurchaseTarget::New { draft } => &draft.name,
        }
    }

    fn same_target(&self, other: &PurchaseTarget) -> bool {
        match (self, other) {
            (
                PurchaseTarget::Existing { item_id: a, .. },
                PurchaseTarget::Existing { item_id: b, .. },
            ) => a == b,
            (PurchaseTarget::New { draft: a }, PurchaseTarget::New { draft: b }) => {
                a.name.trim().to_lowercase() == b.name.trim().to_lowercase()
            }
            _ => false,
        }
    }
}

/// A line of a purchase being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCartLine {
    pub target: PurchaseTarget,
    #[serde(default)]
    pub pricing: PricingType,
    pub entered_quantity: i64,
    pub entered_price_cents: i64,
}

impl PurchaseCartLine {
    pub fn resolve(&self) -> CoreResult<PricedQuantity> {
        Ok(PricedQuantity::resolve(
            self.pricing,
            self.entered_quantity,
            Money::from_cents(self.entered_price_cents),
        )?)
    }
}

/// Lines of a purchase being assembled.
///
/// Adding the same target with the same pricing and price merges the
/// entered quantities; anything else becomes its own line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCart {
    pub lines: Vec<PurchaseCartLine>,
}

/// A purchase ready to write, plus the items it creates.
///
/// New items start at zero stock; writing the purchase lines adds their
/// units like any other line.
#[derive(Debug, Clone)]
pub struct PurchasePlan {
    pub purchase: Purchase,
    pub new_items: Vec<Item>,
}

impl PurchaseCart {
    pub fn new() -> Self {
        PurchaseCart::default()
    }

    pub fn add_existing(
        &mut self,
        item: &Item,
        pricing: PricingType,
        entered_quantity: i64,
        entered_price: Money,
    ) -> CoreResult<()> {
        self.add_line(PurchaseCartLine {
            target: PurchaseTarget::Existing {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
            },
            pricing,
            entered_quantity,
            entered_price_cents: entered_price.cents(),
        })
    }

    pub fn add_line(&mut self, line: PurchaseCartLine) -> CoreResult<()> {
        line.resolve()?;

        if let Some(existing) = self.lines.iter_mut().find(|l| {
            l.target.same_target(&line.target)
                && l.pricing == line.pricing
                && l.entered_price_cents == line.entered_price_cents
        }) {
            let merged = existing.entered_quantity + line.entered_quantity;
            validate_quantity(merged)?;
            existing.entered_quantity = merged;
            return Ok(());
        }

        validate_cart_size(self.lines.len())
            .map_err(|_| CoreError::CartTooLarge { max: crate::MAX_CART_LINES })?;

        self.lines.push(line);
        Ok(())
    }

    /// Removes the line at `index`.
    pub fn remove(&mut self, index: usize) -> CoreResult<PurchaseCartLine> {
        if index >= self.lines.len() {
            return Err(CoreError::ItemNotFound(format!("line {}", index)));
        }
        Ok(self.lines.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Actual units across all lines (boxes expanded).
    pub fn total_units(&self) -> CoreResult<i64> {
        self.lines
            .iter()
            .map(|l| l.resolve().map(|p| p.units))
            .sum()
    }

    pub fn total(&self) -> CoreResult<Money> {
        self.lines
            .iter()
            .map(|l| l.resolve().map(|p| p.total_cost))
            .sum()
    }

    /// Builds the purchase record and the items it creates.
    ///
    /// `taken_skus` holds the owner's existing SKUs. A supplied SKU that is
    /// already taken fails with `DuplicateSku`; a missing one is derived
    /// from the name.
    pub fn into_purchase(
        self,
        notes: Option<String>,
        purchase_date: Option<DateTime<Utc>>,
        taken_skus: &HashSet<String>,
        owner_id: &str,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<PurchasePlan> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let purchase_id = new_id();
        let mut taken: HashSet<String> = taken_skus.clone();
        let mut new_items: Vec<Item> = Vec::new();
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut total = Money::zero();

        for line in self.lines {
            let priced = line.resolve()?;
            total += priced.total_cost;

            let (item_id, item_name, is_new_item) = match line.target {
                PurchaseTarget::Existing { item_id, item_name } => (item_id, item_name, false),
                PurchaseTarget::New { draft } => {
                    let item = new_item_from_draft(
                        draft,
                        line.pricing,
                        &mut taken,
                        owner_id,
                        created_by,
                        now,
                    )?;
                    let ids = (item.id.clone(), item.name.clone(), true);
                    new_items.push(item);
                    ids
                }
            };

            lines.push(PurchaseLine {
                id: new_id(),
                purchase_id: purchase_id.clone(),
                item_id,
                item_name,
                is_new_item,
                pricing: priced.pricing,
                entered_quantity: priced.entered_quantity,
                entered_price_cents: priced.entered_price.cents(),
                quantity: priced.units,
                unit_cost_cents: priced.unit_cost.cents(),
                total_cost_cents: priced.total_cost.cents(),
            });
        }

        Ok(PurchasePlan {
            purchase: Purchase {
                id: purchase_id,
                owner_id: owner_id.to_string(),
                items: lines,
                total_cents: total.cents(),
                notes: normalize_optional_text("notes", notes.as_deref())?,
                purchase_date: purchase_date.unwrap_or(now),
                created_at: now,
                created_by: created_by.to_string(),
            },
            new_items,
        })
    }
}

fn new_item_from_draft(
    draft: NewItemDraft,
    pricing: PricingType,
    taken: &mut HashSet<String>,
    owner_id: &str,
    created_by: &str,
    now: DateTime<Utc>,
) -> CoreResult<Item> {
    let name = validate_name("name", &draft.name)?;
    validate_price_cents(draft.price_cents)?;

    let sku = match draft.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(supplied) => {
            let sku = normalize_sku(supplied)?;
            if taken.contains(&sku) {
                return Err(CoreError::DuplicateSku { sku });
            }
            sku
        }
        None => unique_sku(&derive_sku(&name), taken),
    };
    taken.insert(sku.clone());

    Ok(Item {
        id: new_id(),
        owner_id: owner_id.to_string(),
        name,
        price_cents: per_unit_price(pricing, Money::from_cents(draft.price_cents)).cents(),
        quantity: 0,
        sku,
        description: normalize_optional_text("description", draft.description.as_deref())?,
        vendor: normalize_optional_text("vendor", draft.vendor.as_deref())?,
        created_at: now,
        created_by: created_by.to_string(),
        updated_at: now,
        updated_by: created_by.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price_cents: i64, quantity: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            name: format!("Item {}", id),
            price_cents,
            quantity,
            sku: format!("SKU-{}", id),
            description: None,
            vendor: None,
            created_at: now,
            created_by: "owner@shop.com".to_string(),
            updated_at: now,
            updated_by: "owner@shop.com".to_string(),
        }
    }

    fn cash_details(total_cents: i64) -> SaleDetails {
        SaleDetails {
            payment: PaymentSplit::cash(Money::from_cents(total_cents)),
            ..SaleDetails::default()
        }
    }

    #[test]
    fn test_add_same_item_merges_quantity() {
        let mut cart = SaleCart::new();
        let cola = item("1", 150, 50);

        cart.add_item(&cola, 2).unwrap();
        cart.add_item(&cola, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total().unwrap().cents(), 750);
    }

    #[test]
    fn test_huge_payment_amounts_do_not_overflow() {
        let split = PaymentSplit {
            pay_cash: true,
            cash_amount_cents: i64::MAX,
            pay_credit: true,
            credit_amount_cents: i64::MAX,
        };
        assert_eq!(split.paid().cents(), i64::MAX);
        assert!(matches!(
            split.reconcile(Money::from_cents(1000)),
            Err(CoreError::PaymentMismatch { .. })
        ));
    }

    #[test]
    fn test_oversized_price_override_is_rejected() {
        let mut cart = SaleCart::new();
        let mut line = SaleCartLine::from_item(&item("1", 150, 5000), 1000);
        line.unit_price_cents = 100_000_000_000_000_000;

        let err = cart.add_line(line).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_reports_overflow_instead_of_wrapping() {
        // built directly, bypassing add_line
        let mut line = SaleCartLine::from_item(&item("1", 150, 5000), 1000);
        line.unit_price_cents = 100_000_000_000_000_000;
        let cart = SaleCart { lines: vec![line] };

        assert!(matches!(
            cart.total(),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
        let err = cart
            .into_sale(SaleType::Wholesale, cash_details(0), "owner", "owner@shop.com", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::TooLarge { .. })));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = SaleCart::new();
        cart.add_item(&item("1", 100, 10), 2).unwrap();

        cart.set_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove("1").is_err());
    }

    #[test]
    fn test_retail_rejects_twelve_units() {
        let mut cart = SaleCart::new();
        cart.add_item(&item("1", 100, 100), 11).unwrap();
        assert!(cart.validate(SaleType::Retail).is_ok());

        cart.add_item(&item("2", 100, 100), 1).unwrap();
        assert!(matches!(
            cart.validate(SaleType::Retail),
            Err(CoreError::RetailQuantityExceeded { total: 12, max: 11 })
        ));
    }

    #[test]
    fn test_wholesale_rejects_under_twelve_units() {
        let mut cart = SaleCart::new();
        cart.add_item(&item("1", 100, 100), 11).unwrap();
        assert!(matches!(
            cart.validate(SaleType::Wholesale),
            Err(CoreError::WholesaleQuantityTooSmall { total: 11, min: 12 })
        ));

        cart.set_quantity("1", 12).unwrap();
        assert!(cart.validate(SaleType::Wholesale).is_ok());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let cart = SaleCart::new();
        assert!(matches!(cart.validate(SaleType::Retail), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_check_stock() {
        let stock = vec![item("1", 100, 3)];
        let mut cart = SaleCart::new();
        cart.add_item(&stock[0], 3).unwrap();
        assert!(cart.check_stock(&stock).is_ok());

        cart.set_quantity("1", 4).unwrap();
        assert!(matches!(
            cart.check_stock(&stock),
            Err(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));

        assert!(matches!(cart.check_stock(&[]), Err(CoreError::ItemNotFound(_))));
    }

    #[test]
    fn test_payment_within_one_cent() {
        let total = Money::from_cents(1000);
        let split = |cash, credit| PaymentSplit {
            pay_cash: true,
            cash_amount_cents: cash,
            pay_credit: true,
            credit_amount_cents: credit,
        };

        assert!(split(500, 500).reconcile(total).is_ok());
        assert!(split(500, 501).reconcile(total).is_ok());
        assert!(split(500, 499).reconcile(total).is_ok());
        assert!(matches!(
            split(500, 498).reconcile(total),
            Err(CoreError::PaymentMismatch { .. })
        ));
    }

    #[test]
    fn test_payment_method_rules() {
        let total = Money::from_cents(1000);

        let none = PaymentSplit::default();
        assert!(matches!(none.reconcile(total), Err(CoreError::NoPaymentMethod)));

        let stray_credit = PaymentSplit {
            pay_cash: true,
            cash_amount_cents: 900,
            pay_credit: false,
            credit_amount_cents: 100,
        };
        assert!(matches!(
            stray_credit.reconcile(total),
            Err(CoreError::UnselectedPaymentAmount { .. })
        ));

        assert!(PaymentSplit::credit(total).reconcile(total).is_ok());
    }

    #[test]
    fn test_into_sale_freezes_lines() {
        let cola = item("1", 150, 20);
        let mut cart = SaleCart::new();
        cart.add_item(&cola, 2).unwrap();

        let now = Utc::now();
        let sale = cart
            .into_sale(SaleType::Retail, cash_details(300), "owner", "owner@shop.com", now)
            .unwrap();

        assert_eq!(sale.total_cents, 300);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].sale_id, sale.id);
        assert_eq!(sale.items[0].sku, "SKU-1");
        assert_eq!(sale.items[0].line_total_cents, 300);
        assert_eq!(sale.sale_date, now);
    }

    #[test]
    fn test_into_sale_checks_payment() {
        let mut cart = SaleCart::new();
        cart.add_item(&item("1", 150, 20), 2).unwrap();

        let result = cart.into_sale(
            SaleType::Retail,
            cash_details(250),
            "owner",
            "owner@shop.com",
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::PaymentMismatch { .. })));
    }

    #[test]
    fn test_purchase_cart_bulk_line() {
        let mut cart = PurchaseCart::new();
        let cola = item("1", 150, 0);
        cart.add_existing(&cola, PricingType::Bulk, 2, Money::from_cents(1200))
            .unwrap();

        assert_eq!(cart.total_units().unwrap(), 24);
        assert_eq!(cart.total().unwrap().cents(), 2400);

        let plan = cart
            .into_purchase(None, None, &HashSet::new(), "owner", "owner@shop.com", Utc::now())
            .unwrap();
        let line = &plan.purchase.items[0];
        assert_eq!(line.quantity, 24);
        assert_eq!(line.unit_cost_cents, 100);
        assert_eq!(line.total_cost_cents, 2400);
        assert!(!line.is_new_item);
        assert!(plan.new_items.is_empty());
    }

    #[test]
    fn test_purchase_cart_merges_matching_lines() {
        let mut cart = PurchaseCart::new();
        let cola = item("1", 150, 0);
        cart.add_existing(&cola, PricingType::Unit, 5, Money::from_cents(90)).unwrap();
        cart.add_existing(&cola, PricingType::Unit, 5, Money::from_cents(90)).unwrap();
        cart.add_existing(&cola, PricingType::Unit, 1, Money::from_cents(95)).unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].entered_quantity, 10);
    }

    #[test]
    fn test_purchase_creates_new_item_with_per_unit_price() {
        let mut cart = PurchaseCart::new();
        cart.add_line(PurchaseCartLine {
            target: PurchaseTarget::New {
                draft: NewItemDraft {
                    name: "Lemonade".to_string(),
                    sku: None,
                    price_cents: 2400,
                    description: None,
                    vendor: Some("Acme".to_string()),
                },
            },
            pricing: PricingType::Bulk,
            entered_quantity: 1,
            entered_price_cents: 1800,
        })
        .unwrap();

        let taken: HashSet<String> = ["LEMONADE".to_string()].into_iter().collect();
        let plan = cart
            .into_purchase(None, None, &taken, "owner", "owner@shop.com", Utc::now())
            .unwrap();

        let created = &plan.new_items[0];
        assert_eq!(created.price_cents, 200);
        assert_eq!(created.quantity, 0);
        assert_eq!(created.sku, "LEMONADE-2");
        assert_eq!(plan.purchase.items[0].item_id, created.id);
        assert!(plan.purchase.items[0].is_new_item);
    }

    #[test]
    fn test_purchase_new_item_duplicate_sku() {
        let mut cart = PurchaseCart::new();
        cart.add_line(PurchaseCartLine {
            target: PurchaseTarget::New {
                draft: NewItemDraft {
                    name: "Lemonade".to_string(),
                    sku: Some("lem".to_string()),
                    price_cents: 200,
                    description: None,
                    vendor: None,
                },
            },
            pricing: PricingType::Unit,
            entered_quantity: 1,
            entered_price_cents: 100,
        })
        .unwrap();

        let taken: HashSet<String> = ["LEM".to_string()].into_iter().collect();
        let result = cart.into_purchase(None, None, &taken, "owner", "owner@shop.com", Utc::now());
        assert!(matches!(result, Err(CoreError::DuplicateSku { sku }) if sku == "LEM"));
    }

    #[test]
    fn test_empty_purchase_rejected() {
        let result = PurchaseCart::new().into_purchase(
            None,
            None,
            &HashSet::new(),
            "owner",
            "owner@shop.com",
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::EmptyCart)));
    }
}
