//! # Unit and Bulk Pricing
//!
//! Purchases can be entered per unit or per box. A box always holds
//! [`BULK_UNIT_SIZE`] units.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Entered                     Resolved                                   │
//! │                                                                         │
//! │  Unit:  5 × $2.00      ──►   5 units   @ $2.00   = $10.00              │
//! │  Bulk:  2 × $30.00/box ──►   24 units  @ $2.50   = $60.00              │
//! │                                                                         │
//! │  Bulk total is box price × boxes, never unit cost × units, so a        │
//! │  box price that does not divide by 12 keeps its exact total.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_price_cents, validate_quantity, ValidationResult};
use crate::BULK_UNIT_SIZE;

/// How the entered quantity and price of a purchase line are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    /// Quantity in units, price per unit.
    #[default]
    Unit,
    /// Quantity in boxes, price per box of 12.
    Bulk,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Unit => "unit",
            PricingType::Bulk => "bulk",
        }
    }

    /// Units represented by one entered quantity.
    #[inline]
    pub fn units_per_entry(&self) -> i64 {
        match self {
            PricingType::Unit => 1,
            PricingType::Bulk => BULK_UNIT_SIZE,
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unit" => Ok(PricingType::Unit),
            "bulk" | "box" => Ok(PricingType::Bulk),
            _ => Err(ValidationError::NotAllowed {
                field: "pricing".to_string(),
                allowed: vec!["unit".to_string(), "bulk".to_string()],
            }),
        }
    }
}

/// Entered quantity and price resolved to actual units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedQuantity {
    pub pricing: PricingType,
    pub entered_quantity: i64,
    pub entered_price: Money,
    /// Actual units received.
    pub units: i64,
    /// Cost per unit, rounded half-up to the cent for bulk lines.
    pub unit_cost: Money,
    /// Exact line total.
    pub total_cost: Money,
}

impl PricedQuantity {
    /// Resolves an entered quantity and price.
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::money::Money;
    /// use stockbook_core::pricing::{PricedQuantity, PricingType};
    ///
    /// let line = PricedQuantity::resolve(PricingType::Bulk, 1, Money::from_cents(1000)).unwrap();
    /// assert_eq!(line.units, 12);
    /// assert_eq!(line.unit_cost.cents(), 83); // 833.33... cents rounds to 83
    /// assert_eq!(line.total_cost.cents(), 1000);
    /// ```
    pub fn resolve(
        pricing: PricingType,
        entered_quantity: i64,
        entered_price: Money,
    ) -> ValidationResult<Self> {
        validate_quantity(entered_quantity)?;
        validate_price_cents(entered_price.cents())?;

        let units = entered_quantity * pricing.units_per_entry();
        let unit_cost = per_unit_price(pricing, entered_price);
        let total_cost = entered_price.multiply_quantity(entered_quantity)?;

        Ok(PricedQuantity {
            pricing,
            entered_quantity,
            entered_price,
            units,
            unit_cost,
            total_cost,
        })
    }
}

/// Converts an entered price to a per-unit price.
///
/// Used for purchase costs and for the selling price of items created
/// during a purchase, which may be entered per box.
pub fn per_unit_price(pricing: PricingType, entered_price: Money) -> Money {
    match pricing {
        PricingType::Unit => entered_price,
        PricingType::Bulk => entered_price.divide_rounded(BULK_UNIT_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_pricing_is_identity() {
        let line = PricedQuantity::resolve(PricingType::Unit, 5, Money::from_cents(200)).unwrap();
        assert_eq!(line.units, 5);
        assert_eq!(line.unit_cost.cents(), 200);
        assert_eq!(line.total_cost.cents(), 1000);
    }

    #[test]
    fn test_bulk_expands_boxes_to_units() {
        let line = PricedQuantity::resolve(PricingType::Bulk, 3, Money::from_cents(2400)).unwrap();
        assert_eq!(line.units, 36);
        assert_eq!(line.unit_cost.cents(), 200);
        assert_eq!(line.total_cost.cents(), 7200);
    }

    #[test]
    fn test_bulk_total_is_not_rebuilt_from_rounded_unit_cost() {
        // $10.00 / 12 = 83.33c, rounded to 83c; 83c × 24 would be $19.92
        let line = PricedQuantity::resolve(PricingType::Bulk, 2, Money::from_cents(1000)).unwrap();
        assert_eq!(line.unit_cost.cents(), 83);
        assert_eq!(line.total_cost.cents(), 2000);
    }

    #[test]
    fn test_bulk_unit_cost_rounds_half_up() {
        // 6c / 12 = 0.5c
        assert_eq!(per_unit_price(PricingType::Bulk, Money::from_cents(6)).cents(), 1);
        // 1010c / 12 = 84.1666c
        assert_eq!(per_unit_price(PricingType::Bulk, Money::from_cents(1010)).cents(), 84);
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        assert!(PricedQuantity::resolve(PricingType::Unit, 0, Money::from_cents(100)).is_err());
        assert!(PricedQuantity::resolve(PricingType::Bulk, 1, Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_pricing_type_parse() {
        assert_eq!("BULK".parse::<PricingType>().unwrap(), PricingType::Bulk);
        assert_eq!("box".parse::<PricingType>().unwrap(), PricingType::Bulk);
        assert_eq!("unit".parse::<PricingType>().unwrap(), PricingType::Unit);
        assert!("crate".parse::<PricingType>().is_err());
    }
}
