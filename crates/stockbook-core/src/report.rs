//! # Reports and Dashboard
//!
//! Date ranges, dashboard statistics and printable report documents.
//!
//! ## Report Document Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Corner Shop: Sales Report                       ← title                │
//! │  This Month                                      ← subtitle             │
//! │  Generated 2024-03-31 18:00 UTC                                         │
//! │                                                                         │
//! │  Total sales ........ $1,234.00                  ← summary              │
//! │  Number of sales .... 42                                                │
//! │                                                                         │
//! │  Date       │ Type   │ Items        │ Total      ← columns              │
//! │  2024-03-30 │ retail │ Cola x2      │ $3.00      ← rows                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The document is rendered here as plain text and CSV. Binary formats
//! are left to the browser.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::sheet::write_csv;
use crate::types::{Expense, ExpenseCategory, Item, Purchase, Sale, SaleType};
use crate::validation::ValidationResult;

const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Date Ranges
// =============================================================================

/// A half-open time window `[start, end)`. Missing bounds are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    pub fn all() -> Self {
        Period::default()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at < e)
    }
}

/// Date range picked in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "range")]
pub enum DateRange {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    /// Both days inclusive.
    Custom {
        #[ts(as = "String")]
        start: NaiveDate,
        #[ts(as = "String")]
        end: NaiveDate,
    },
    #[default]
    All,
}

impl DateRange {
    /// Builds a range from query parameters (`range`, `start`, `end`).
    ///
    /// A missing `range` with both dates present is a custom range.
    pub fn from_query(
        range: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ValidationResult<Self> {
        let custom = |start: Option<NaiveDate>, end: Option<NaiveDate>| match (start, end) {
            (Some(start), Some(end)) if start <= end => Ok(DateRange::Custom { start, end }),
            (Some(_), Some(_)) => Err(ValidationError::InvalidFormat {
                field: "end".to_string(),
                reason: "must not be before start".to_string(),
            }),
            _ => Err(ValidationError::Required {
                field: "start and end".to_string(),
            }),
        };

        match range.map(|r| r.trim().to_lowercase()) {
            None if start.is_some() || end.is_some() => custom(start, end),
            None => Ok(DateRange::All),
            Some(r) => match r.as_str() {
                "" | "all" => Ok(DateRange::All),
                "today" => Ok(DateRange::Today),
                "this_week" | "week" => Ok(DateRange::ThisWeek),
                "this_month" | "month" => Ok(DateRange::ThisMonth),
                "this_year" | "year" => Ok(DateRange::ThisYear),
                "custom" => custom(start, end),
                _ => Err(ValidationError::NotAllowed {
                    field: "range".to_string(),
                    allowed: ["today", "this_week", "this_month", "this_year", "custom", "all"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                }),
            },
        }
    }

    /// Resolves the range against `now`. Weeks start on Monday.
    ///
    /// An end past the last representable day leaves the period open-ended.
    pub fn resolve(&self, now: DateTime<Utc>) -> Period {
        let today = now.date_naive();
        let (start, end) = match *self {
            DateRange::All => return Period::all(),
            DateRange::Today => (today, today.succ_opt()),
            DateRange::ThisWeek => {
                let back = Days::new(u64::from(today.weekday().num_days_from_monday()));
                let monday = today.checked_sub_days(back).unwrap_or(today);
                (monday, monday.checked_add_days(Days::new(7)))
            }
            DateRange::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (first, first_of_next_month(first))
            }
            DateRange::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                (first, NaiveDate::from_ymd_opt(today.year() + 1, 1, 1))
            }
            DateRange::Custom { start, end } => (start, end.succ_opt()),
        };

        Period {
            start: Some(midnight(start)),
            end: end.map(midnight),
        }
    }

    pub fn label(&self) -> String {
        match self {
            DateRange::Today => "Today".to_string(),
            DateRange::ThisWeek => "This Week".to_string(),
            DateRange::ThisMonth => "This Month".to_string(),
            DateRange::ThisYear => "This Year".to_string(),
            DateRange::Custom { start, end } => format!(
                "{} to {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            DateRange::All => "All Time".to_string(),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn first_of_next_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

// =============================================================================
// Report Documents
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Purchases,
    Expenses,
    Inventory,
    ProfitLoss,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Sales => "sales",
            ReportKind::Purchases => "purchases",
            ReportKind::Expenses => "expenses",
            ReportKind::Inventory => "inventory",
            ReportKind::ProfitLoss => "profit_loss",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Sales => "Sales Report",
            ReportKind::Purchases => "Purchases Report",
            ReportKind::Expenses => "Expenses Report",
            ReportKind::Inventory => "Inventory Report",
            ReportKind::ProfitLoss => "Profit & Loss Statement",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sales" => Ok(ReportKind::Sales),
            "purchases" => Ok(ReportKind::Purchases),
            "expenses" => Ok(ReportKind::Expenses),
            "inventory" => Ok(ReportKind::Inventory),
            "profit_loss" | "pnl" => Ok(ReportKind::ProfitLoss),
            _ => Err(ValidationError::NotAllowed {
                field: "report".to_string(),
                allowed: ["sales", "purchases", "expenses", "inventory", "profit_loss"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

/// Header, summary and table of a printable report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<SummaryLine>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportDocument {
    fn new(kind: ReportKind, ctx: &ReportContext) -> Self {
        let title = match ctx.business_name.as_deref() {
            Some(name) if !name.trim().is_empty() => format!("{}: {}", name.trim(), kind.title()),
            _ => kind.title().to_string(),
        };
        ReportDocument {
            title,
            subtitle: ctx.range_label.clone(),
            generated_at: ctx.generated_at,
            summary: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn summary(&mut self, label: &str, value: impl ToString) {
        self.summary.push(SummaryLine {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    fn columns(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
    }

    /// Renders an aligned plain-text report.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if !self.subtitle.is_empty() {
            out.push_str(&self.subtitle);
            out.push('\n');
        }
        out.push_str(&format!(
            "Generated {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        if !self.summary.is_empty() {
            out.push('\n');
            let width = self
                .summary
                .iter()
                .map(|s| s.label.chars().count())
                .max()
                .unwrap_or(0);
            for line in &self.summary {
                out.push_str(&format!("{:<width$}  {}\n", line.label, line.value, width = width));
            }
        }

        if !self.columns.is_empty() {
            out.push('\n');
            let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
            for row in &self.rows {
                for (i, cell) in row.iter().enumerate() {
                    if let Some(w) = widths.get_mut(i) {
                        *w = (*w).max(cell.chars().count());
                    }
                }
            }

            out.push_str(&text_row(&self.columns, &widths));
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push_str(&text_row(&rule, &widths));
            for row in &self.rows {
                out.push_str(&text_row(row, &widths));
            }
            if self.rows.is_empty() {
                out.push_str("(no records)\n");
            }
        }

        out
    }

    /// Renders the table as CSV (header row plus data rows).
    pub fn to_csv(&self) -> String {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.columns.clone());
        rows.extend(self.rows.iter().cloned());
        write_csv(&rows)
    }
}

fn text_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = w)
        })
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

/// Settings that shape a report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub business_name: Option<String>,
    pub currency_symbol: String,
    pub low_stock_threshold: i64,
    pub period: Period,
    pub range_label: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext {
    pub fn new(range: DateRange, now: DateTime<Utc>) -> Self {
        ReportContext {
            business_name: None,
            currency_symbol: "$".to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            period: range.resolve(now),
            range_label: range.label(),
            generated_at: now,
        }
    }

    fn money(&self, m: Money) -> String {
        m.format_with(&self.currency_symbol)
    }
}

/// Stock at or below this many units counts as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Everything a report may read. Only the slices a kind needs are used.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportData<'a> {
    pub items: &'a [Item],
    pub sales: &'a [Sale],
    pub purchases: &'a [Purchase],
    pub expenses: &'a [Expense],
}

/// Builds a report document. Records are filtered to the context period
/// (the inventory report is a snapshot and ignores it) and listed newest
/// first.
pub fn build_report(kind: ReportKind, data: &ReportData<'_>, ctx: &ReportContext) -> ReportDocument {
    match kind {
        ReportKind::Sales => sales_report(data.sales, ctx),
        ReportKind::Purchases => purchases_report(data.purchases, ctx),
        ReportKind::Expenses => expenses_report(data.expenses, ctx),
        ReportKind::Inventory => inventory_report(data.items, ctx),
        ReportKind::ProfitLoss => profit_loss_report(data, ctx),
    }
}

fn sales_report(sales: &[Sale], ctx: &ReportContext) -> ReportDocument {
    let mut doc = ReportDocument::new(ReportKind::Sales, ctx);
    let mut sales: Vec<&Sale> = sales.iter().filter(|s| ctx.period.contains(s.sale_date)).collect();
    sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));

    let total: Money = sales.iter().map(|s| s.total()).sum();
    let cash: Money = sales.iter().map(|s| Money::from_cents(s.cash_amount_cents)).sum();
    let credit: Money = sales.iter().map(|s| Money::from_cents(s.credit_amount_cents)).sum();
    let units: i64 = sales.iter().map(|s| s.total_units()).sum();
    let retail = sales.iter().filter(|s| s.sale_type == SaleType::Retail).count();

    doc.summary("Total sales", ctx.money(total));
    doc.summary("Number of sales", sales.len());
    doc.summary("Units sold", units);
    doc.summary("Cash received", ctx.money(cash));
    doc.summary("Credit extended", ctx.money(credit));
    doc.summary("Retail / wholesale", format!("{} / {}", retail, sales.len() - retail));

    doc.columns(&["Date", "Type", "Items", "Units", "Total", "Cash", "Credit", "Purchaser"]);
    doc.rows = sales
        .iter()
        .map(|s| {
            vec![
                s.sale_date.format(DATE_FORMAT).to_string(),
                s.sale_type.to_string(),
                sale_items_text(s),
                s.total_units().to_string(),
                ctx.money(s.total()),
                ctx.money(Money::from_cents(s.cash_amount_cents)),
                ctx.money(Money::from_cents(s.credit_amount_cents)),
                s.purchaser_name.clone().unwrap_or_default(),
            ]
        })
        .collect();
    doc
}

fn purchases_report(purchases: &[Purchase], ctx: &ReportContext) -> ReportDocument {
    let mut doc = ReportDocument::new(ReportKind::Purchases, ctx);
    let mut purchases: Vec<&Purchase> = purchases
        .iter()
        .filter(|p| ctx.period.contains(p.purchase_date))
        .collect();
    purchases.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));

    let total: Money = purchases.iter().map(|p| p.total()).sum();
    let units: i64 = purchases.iter().map(|p| p.total_units()).sum();

    doc.summary("Total purchases", ctx.money(total));
    doc.summary("Number of purchases", purchases.len());
    doc.summary("Units received", units);

    doc.columns(&["Date", "Items", "Units", "Total", "Notes"]);
    doc.rows = purchases
        .iter()
        .map(|p| {
            vec![
                p.purchase_date.format(DATE_FORMAT).to_string(),
                purchase_items_text(p),
                p.total_units().to_string(),
                ctx.money(p.total()),
                p.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    doc
}

fn expenses_report(expenses: &[Expense], ctx: &ReportContext) -> ReportDocument {
    let mut doc = ReportDocument::new(ReportKind::Expenses, ctx);
    let mut expenses: Vec<&Expense> = expenses
        .iter()
        .filter(|e| ctx.period.contains(e.expense_date))
        .collect();
    expenses.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));

    let total: Money = expenses.iter().map(|e| e.amount()).sum();
    doc.summary("Total expenses", ctx.money(total));
    doc.summary("Number of expenses", expenses.len());
    for (category, amount) in totals_by_category(expenses.iter().copied()) {
        doc.summary(&format!("  {}", category), ctx.money(amount));
    }

    doc.columns(&["Date", "Name", "Category", "Amount", "Description"]);
    doc.rows = expenses
        .iter()
        .map(|e| {
            vec![
                e.expense_date.format(DATE_FORMAT).to_string(),
                e.name.clone(),
                e.category.to_string(),
                ctx.money(e.amount()),
                e.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    doc
}

fn inventory_report(items: &[Item], ctx: &ReportContext) -> ReportDocument {
    let mut doc = ReportDocument::new(ReportKind::Inventory, ctx);
    doc.subtitle = "Current stock".to_string();

    let mut items: Vec<&Item> = items.iter().collect();
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let value: Money = items.iter().map(|i| i.stock_value()).sum();
    let units: i64 = items.iter().map(|i| i.quantity).sum();
    let low = items
        .iter()
        .filter(|i| i.is_low_stock(ctx.low_stock_threshold))
        .count();

    doc.summary("Items", items.len());
    doc.summary("Units in stock", units);
    doc.summary("Inventory value", ctx.money(value));
    doc.summary("Low stock items", low);

    doc.columns(&["Name", "SKU", "Price", "Quantity", "Value", "Status"]);
    doc.rows = items
        .iter()
        .map(|i| {
            let status = if i.quantity <= 0 {
                "Out of stock"
            } else if i.is_low_stock(ctx.low_stock_threshold) {
                "Low stock"
            } else {
                "In stock"
            };
            vec![
                i.name.clone(),
                i.sku.clone(),
                ctx.money(i.price()),
                i.quantity.to_string(),
                ctx.money(i.stock_value()),
                status.to_string(),
            ]
        })
        .collect();
    doc
}

fn profit_loss_report(data: &ReportData<'_>, ctx: &ReportContext) -> ReportDocument {
    let mut doc = ReportDocument::new(ReportKind::ProfitLoss, ctx);

    let revenue: Money = data
        .sales
        .iter()
        .filter(|s| ctx.period.contains(s.sale_date))
        .map(|s| s.total())
        .sum();
    let purchases: Money = data
        .purchases
        .iter()
        .filter(|p| ctx.period.contains(p.purchase_date))
        .map(|p| p.total())
        .sum();
    let expenses: Vec<&Expense> = data
        .expenses
        .iter()
        .filter(|e| ctx.period.contains(e.expense_date))
        .collect();
    let expense_total: Money = expenses.iter().map(|e| e.amount()).sum();
    let gross = revenue - purchases;
    let net = gross - expense_total;

    doc.summary("Revenue", ctx.money(revenue));
    doc.summary("Cost of purchases", ctx.money(purchases));
    doc.summary("Gross profit", ctx.money(gross));
    doc.summary("Expenses", ctx.money(expense_total));
    doc.summary("Net profit", ctx.money(net));

    doc.columns(&["Line", "Amount"]);
    let mut rows = vec![
        vec!["Sales revenue".to_string(), ctx.money(revenue)],
        vec!["Purchases".to_string(), ctx.money(-purchases)],
        vec!["Gross profit".to_string(), ctx.money(gross)],
    ];
    for (category, amount) in totals_by_category(expenses.iter().copied()) {
        rows.push(vec![format!("Expense: {}", category), ctx.money(-amount)]);
    }
    rows.push(vec!["Net profit".to_string(), ctx.money(net)]);
    doc.rows = rows;
    doc
}

pub(crate) fn sale_items_text(sale: &Sale) -> String {
    sale.items
        .iter()
        .map(|l| format!("{} x{}", l.item_name, l.quantity))
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn purchase_items_text(purchase: &Purchase) -> String {
    purchase
        .items
        .iter()
        .map(|l| format!("{} x{}", l.item_name, l.quantity))
        .collect::<Vec<_>>()
        .join("; ")
}

fn totals_by_category<'a>(
    expenses: impl Iterator<Item = &'a Expense>,
) -> BTreeMap<ExpenseCategory, Money> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert_with(Money::zero) += expense.amount();
    }
    totals
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub item_id: String,
    pub name: String,
    pub units: i64,
    pub revenue: Money,
}

/// Numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub range_label: String,
    pub item_count: usize,
    pub units_in_stock: i64,
    pub inventory_value: Money,
    pub low_stock: Vec<LowStockItem>,
    pub sales_total: Money,
    pub sales_count: usize,
    pub purchases_total: Money,
    pub purchases_count: usize,
    pub expenses_total: Money,
    /// sales - purchases - expenses
    pub net_profit: Money,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub top_items: Vec<TopItem>,
}

/// Top sellers listed on the dashboard.
pub const DASHBOARD_TOP_ITEMS: usize = 5;

/// Computes dashboard statistics. Stock figures are current; money
/// figures cover the context period.
pub fn compute_dashboard(data: &ReportData<'_>, ctx: &ReportContext) -> DashboardStats {
    let sales: Vec<&Sale> = data
        .sales
        .iter()
        .filter(|s| ctx.period.contains(s.sale_date))
        .collect();
    let purchases: Vec<&Purchase> = data
        .purchases
        .iter()
        .filter(|p| ctx.period.contains(p.purchase_date))
        .collect();
    let expenses: Vec<&Expense> = data
        .expenses
        .iter()
        .filter(|e| ctx.period.contains(e.expense_date))
        .collect();

    let sales_total: Money = sales.iter().map(|s| s.total()).sum();
    let purchases_total: Money = purchases.iter().map(|p| p.total()).sum();
    let expenses_total: Money = expenses.iter().map(|e| e.amount()).sum();

    let mut low_stock: Vec<LowStockItem> = data
        .items
        .iter()
        .filter(|i| i.is_low_stock(ctx.low_stock_threshold))
        .map(|i| LowStockItem {
            id: i.id.clone(),
            name: i.name.clone(),
            sku: i.sku.clone(),
            quantity: i.quantity,
        })
        .collect();
    low_stock.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));

    let mut by_item: BTreeMap<&str, TopItem> = BTreeMap::new();
    for line in sales.iter().flat_map(|s| s.items.iter()) {
        let entry = by_item.entry(line.item_id.as_str()).or_insert_with(|| TopItem {
            item_id: line.item_id.clone(),
            name: line.item_name.clone(),
            units: 0,
            revenue: Money::zero(),
        });
        entry.units += line.quantity;
        entry.revenue += line.line_total();
    }
    let mut top_items: Vec<TopItem> = by_item.into_values().collect();
    top_items.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.name.cmp(&b.name)));
    top_items.truncate(DASHBOARD_TOP_ITEMS);

    DashboardStats {
        range_label: ctx.range_label.clone(),
        item_count: data.items.len(),
        units_in_stock: data.items.iter().map(|i| i.quantity).sum(),
        inventory_value: data.items.iter().map(|i| i.stock_value()).sum(),
        low_stock,
        sales_total,
        sales_count: sales.len(),
        purchases_total,
        purchases_count: purchases.len(),
        expenses_total,
        net_profit: sales_total - purchases_total - expenses_total,
        expenses_by_category: totals_by_category(expenses.iter().copied())
            .into_iter()
            .map(|(category, amount)| CategoryTotal { category, amount })
            .collect(),
        top_items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
