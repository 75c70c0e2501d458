//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate holds every rule of the tracker as pure functions with zero
//! I/O dependencies. The database crate persists what this crate computes;
//! the server only orchestrates.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI                                   │   │
//! │  │  Items ─ Sales ─ Purchases ─ Expenses ─ Balance ─ Reports      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (services)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   types   money   pricing   cart   balance   import   report   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockbook-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Item, Sale, Purchase, Expense, ActivityLog, Account)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Unit / box (bulk) pricing conversion
//! - [`cart`] - Sale and purchase cart assembly and checks
//! - [`balance`] - Running balance over purchases and sales
//! - [`import`] - Spreadsheet import reconciliation
//! - [`report`] - Date ranges, dashboard stats and report documents
//! - [`sheet`] - CSV reading and writing
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::money::Money;
//! use stockbook_core::pricing::{PricingType, PricedQuantity};
//!
//! // Two boxes at $30.00 per box of 12
//! let priced = PricedQuantity::resolve(PricingType::Bulk, 2, Money::from_cents(3000)).unwrap();
//! assert_eq!(priced.units, 24);
//! assert_eq!(priced.unit_cost.cents(), 250);
//! assert_eq!(priced.total_cost.cents(), 6000);
//! ```

pub mod balance;
pub mod cart;
pub mod error;
pub mod import;
pub mod money;
pub mod pricing;
pub mod report;
pub mod sheet;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Units in one box. Bulk prices are quoted per box and wholesale sales
/// start at one box.
pub const BULK_UNIT_SIZE: i64 = 12;

/// Largest total unit count a retail sale may carry.
pub const RETAIL_MAX_UNITS: i64 = BULK_UNIT_SIZE - 1;

/// Allowed gap between the payment split and the sale total, in cents.
pub const PAYMENT_TOLERANCE_CENTS: i64 = 1;

/// Maximum distinct lines in one cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single line (units or boxes).
pub const MAX_LINE_QUANTITY: i64 = 99_999;

/// Largest price or expense amount, in cents ($10,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Largest stock level an item may hold.
pub const MAX_STOCK_LEVEL: i64 = i32::MAX as i64;

/// Numeric suffixes tried before an import row is given up on.
pub const MAX_IMPORT_SUFFIX_ATTEMPTS: u32 = 100;
