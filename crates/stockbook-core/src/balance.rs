//! # Balance Sheet
//!
//! Merges purchases and sales into one ledger with a running balance.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchases ──► entry { amount: -total, quantity_delta: +units }         │
//! │  sales     ──► entry { amount: +total, quantity_delta: -units }         │
//! │                                                                         │
//! │  sort by date DESC (tie: sales first, then id)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  running_balance[i] = running_balance[i-1] + amount[i]                  │
//! │                                                                         │
//! │  The newest entry carries only its own amount; the oldest entry        │
//! │  carries the net of the whole (filtered) ledger.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::report::Period;
use crate::types::{Purchase, Sale, SaleType};

/// Which side of the ledger an entry is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Sale,
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    /// Id of the sale or purchase.
    pub id: String,
    pub kind: EntryKind,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub description: String,
    /// Only set for sales.
    pub sale_type: Option<SaleType>,
    /// Signed: sales positive, purchases negative.
    pub amount: Money,
    /// Signed: purchases add stock, sales remove it.
    pub quantity_delta: i64,
    pub running_balance: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub total_sales: Money,
    pub total_purchases: Money,
    /// total_sales - total_purchases
    pub net: Money,
    pub units_in: i64,
    pub units_out: i64,
    pub sale_count: usize,
    pub purchase_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub entries: Vec<BalanceEntry>,
    pub summary: BalanceSummary,
}

/// Builds the balance sheet from the owner's purchases and sales.
///
/// Records outside `period` are left out before the running balance is
/// computed.
///
/// ## Example
/// ```rust,ignore
/// let sheet = build_balance_sheet(&purchases, &sales, &Period::all());
/// let last = sheet.entries.last().unwrap();
/// assert_eq!(last.running_balance, sheet.summary.net);
/// ```
pub fn build_balance_sheet(purchases: &[Purchase], sales: &[Sale], period: &Period) -> BalanceSheet {
    let mut entries: Vec<BalanceEntry> = Vec::with_capacity(purchases.len() + sales.len());
    let mut summary = BalanceSummary::default();

    for sale in sales.iter().filter(|s| period.contains(s.sale_date)) {
        let units = sale.total_units();
        summary.total_sales += sale.total();
        summary.units_out += units;
        summary.sale_count += 1;

        entries.push(BalanceEntry {
            id: sale.id.clone(),
            kind: EntryKind::Sale,
            date: sale.sale_date,
            description: describe(
                &format!("{} sale", capitalize(sale.sale_type.as_str())),
                sale.items.iter().map(|l| (l.item_name.as_str(), l.quantity)),
            ),
            sale_type: Some(sale.sale_type),
            amount: sale.total(),
            quantity_delta: -units,
            running_balance: Money::zero(),
        });
    }

    for purchase in purchases.iter().filter(|p| period.contains(p.purchase_date)) {
        let units = purchase.total_units();
        summary.total_purchases += purchase.total();
        summary.units_in += units;
        summary.purchase_count += 1;

        entries.push(BalanceEntry {
            id: purchase.id.clone(),
            kind: EntryKind::Purchase,
            date: purchase.purchase_date,
            description: describe(
                "Purchase",
                purchase.items.iter().map(|l| (l.item_name.as_str(), l.quantity)),
            ),
            sale_type: None,
            amount: -purchase.total(),
            quantity_delta: units,
            running_balance: Money::zero(),
        });
    }

    entries.sort_by(compare_entries);

    let mut running = Money::zero();
    for entry in &mut entries {
        running += entry.amount;
        entry.running_balance = running;
    }

    summary.net = summary.total_sales - summary.total_purchases;

    BalanceSheet { entries, summary }
}

/// Newest first; on equal dates sales come before purchases, then by id.
fn compare_entries(a: &BalanceEntry, b: &BalanceEntry) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
        .then_with(|| a.id.cmp(&b.id))
}

fn kind_rank(kind: EntryKind) -> u8 {
    match kind {
        EntryKind::Sale => 0,
        EntryKind::Purchase => 1,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn describe<'a>(prefix: &str, lines: impl Iterator<Item = (&'a str, i64)>) -> String {
    let parts: Vec<String> = lines.map(|(name, qty)| format!("{} x{}", name, qty)).collect();
    if parts.is_empty() {
        prefix.to_string()
    } else {
        format!("{}: {}", prefix, parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingType;
    use crate::types::{PurchaseLine, SaleLine};
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn sale(id: &str, day: u32, total_cents: i64, units: i64) -> Sale {
        Sale {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            sale_type: SaleType::Retail,
            items: vec![SaleLine {
                id: format!("{}-l", id),
                sale_id: id.to_string(),
                item_id: "item".to_string(),
                item_name: "Cola".to_string(),
                sku: "COLA".to_string(),
                quantity: units,
                unit_price_cents: total_cents / units,
                cash_price_cents: total_cents / units,
                credit_price_cents: total_cents / units,
                line_total_cents: total_cents,
            }],
            total_cents,
            pay_cash: true,
            cash_amount_cents: total_cents,
            pay_credit: false,
            credit_amount_cents: 0,
            purchaser_name: None,
            purchaser_phone: None,
            notes: None,
            sale_date: at(day),
            created_at: at(day),
            created_by: "owner@shop.com".to_string(),
        }
    }

    fn purchase(id: &str, day: u32, total_cents: i64, units: i64) -> Purchase {
        Purchase {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            items: vec![PurchaseLine {
                id: format!("{}-l", id),
                purchase_id: id.to_string(),
                item_id: "item".to_string(),
                item_name: "Cola".to_string(),
                is_new_item: false,
                pricing: PricingType::Unit,
                entered_quantity: units,
                entered_price_cents: total_cents / units,
                quantity: units,
                unit_cost_cents: total_cents / units,
                total_cost_cents: total_cents,
            }],
            total_cents,
            notes: None,
            purchase_date: at(day),
            created_at: at(day),
            created_by: "owner@shop.com".to_string(),
        }
    }

    #[test]
    fn test_running_balance_accumulates_newest_first() {
        let purchases = vec![purchase("p1", 1, 5000, 50)];
        let sales = vec![sale("s1", 2, 1000, 5), sale("s2", 3, 2000, 10)];

        let sheet = build_balance_sheet(&purchases, &sales, &Period::all());

        let ids: Vec<&str> = sheet.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1", "p1"]);

        let running: Vec<i64> = sheet.entries.iter().map(|e| e.running_balance.cents()).collect();
        assert_eq!(running, vec![2000, 3000, -2000]);
    }

    #[test]
    fn test_last_running_balance_equals_net() {
        let purchases = vec![purchase("p1", 1, 5000, 50), purchase("p2", 4, 1200, 12)];
        let sales = vec![sale("s1", 2, 1000, 5), sale("s2", 5, 2400, 12)];

        let sheet = build_balance_sheet(&purchases, &sales, &Period::all());

        assert_eq!(sheet.summary.total_sales.cents(), 3400);
        assert_eq!(sheet.summary.total_purchases.cents(), 6200);
        assert_eq!(sheet.summary.net.cents(), -2800);
        assert_eq!(sheet.summary.units_in, 62);
        assert_eq!(sheet.summary.units_out, 17);
        assert_eq!(
            sheet.entries.last().map(|e| e.running_balance),
            Some(sheet.summary.net)
        );
    }

    #[test]
    fn test_signs_of_amount_and_quantity() {
        let sheet = build_balance_sheet(
            &[purchase("p1", 1, 600, 6)],
            &[sale("s1", 2, 300, 3)],
            &Period::all(),
        );
        let s = &sheet.entries[0];
        let p = &sheet.entries[1];
        assert_eq!((s.amount.cents(), s.quantity_delta), (300, -3));
        assert_eq!((p.amount.cents(), p.quantity_delta), (-600, 6));
        assert_eq!(s.description, "Retail sale: Cola x3");
    }

    #[test]
    fn test_ties_put_sales_before_purchases() {
        let sheet = build_balance_sheet(
            &[purchase("a", 2, 100, 1)],
            &[sale("z", 2, 100, 1)],
            &Period::all(),
        );
        assert_eq!(sheet.entries[0].kind, EntryKind::Sale);
    }

    #[test]
    fn test_period_filters_before_accumulating() {
        let purchases = vec![purchase("p1", 1, 5000, 50)];
        let sales = vec![sale("s1", 10, 1000, 5)];
        let period = Period {
            start: Some(at(5)),
            end: Some(at(20) + Duration::days(1)),
        };

        let sheet = build_balance_sheet(&purchases, &sales, &period);
        assert_eq!(sheet.entries.len(), 1);
        assert_eq!(sheet.summary.total_purchases, Money::zero());
        assert_eq!(sheet.entries[0].running_balance.cents(), 1000);
    }

    #[test]
    fn test_empty_inputs() {
        let sheet = build_balance_sheet(&[], &[], &Period::all());
        assert!(sheet.entries.is_empty());
        assert_eq!(sheet.summary.net, Money::zero());
    }
}
