//! # Spreadsheet (CSV) Codec
//!
//! Reads item spreadsheets for import and writes collections for export.
//! Quoting follows RFC 4180: fields holding commas, quotes or line breaks
//! are wrapped in quotes and inner quotes are doubled.
//!
//! Money columns are plain decimals (`12.50`) so spreadsheets treat them
//! as numbers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::import::ImportRow;
use crate::money::Money;
use crate::report::{purchase_items_text, sale_items_text};
use crate::types::{Expense, Item, Purchase, Sale};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub const ITEM_COLUMNS: [&str; 6] = ["Name", "SKU", "Price", "Quantity", "Description", "Vendor"];
pub const SALE_COLUMNS: [&str; 8] = [
    "Date", "Type", "Items", "Units", "Total", "Cash", "Credit", "Purchaser",
];
pub const PURCHASE_COLUMNS: [&str; 5] = ["Date", "Items", "Units", "Total", "Notes"];
pub const EXPENSE_COLUMNS: [&str; 5] = ["Date", "Name", "Category", "Amount", "Description"];

// =============================================================================
// Writing
// =============================================================================

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes rows as CSV with CRLF line endings.
pub fn write_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let fields: Vec<String> = row.iter().map(|f| escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

fn with_header(columns: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut all = vec![columns.iter().map(|c| c.to_string()).collect::<Vec<_>>()];
    all.extend(rows);
    write_csv(&all)
}

/// Items in the import column layout, so an export can be re-imported.
pub fn items_to_csv(items: &[Item]) -> String {
    with_header(
        &ITEM_COLUMNS,
        items.iter().map(|i| {
            vec![
                i.name.clone(),
                i.sku.clone(),
                i.price().to_decimal_string(),
                i.quantity.to_string(),
                i.description.clone().unwrap_or_default(),
                i.vendor.clone().unwrap_or_default(),
            ]
        }),
    )
}

pub fn sales_to_csv(sales: &[Sale]) -> String {
    with_header(
        &SALE_COLUMNS,
        sales.iter().map(|s| {
            vec![
                s.sale_date.format(DATE_FORMAT).to_string(),
                s.sale_type.to_string(),
                sale_items_text(s),
                s.total_units().to_string(),
                s.total().to_decimal_string(),
                Money::from_cents(s.cash_amount_cents).to_decimal_string(),
                Money::from_cents(s.credit_amount_cents).to_decimal_string(),
                s.purchaser_name.clone().unwrap_or_default(),
            ]
        }),
    )
}

pub fn purchases_to_csv(purchases: &[Purchase]) -> String {
    with_header(
        &PURCHASE_COLUMNS,
        purchases.iter().map(|p| {
            vec![
                p.purchase_date.format(DATE_FORMAT).to_string(),
                purchase_items_text(p),
                p.total_units().to_string(),
                p.total().to_decimal_string(),
                p.notes.clone().unwrap_or_default(),
            ]
        }),
    )
}

pub fn expenses_to_csv(expenses: &[Expense]) -> String {
    with_header(
        &EXPENSE_COLUMNS,
        expenses.iter().map(|e| {
            vec![
                e.expense_date.format(DATE_FORMAT).to_string(),
                e.name.clone(),
                e.category.to_string(),
                e.amount().to_decimal_string(),
                e.description.clone().unwrap_or_default(),
            ]
        }),
    )
}

// =============================================================================
// Reading
// =============================================================================

/// One parsed CSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// 1-based physical line the record starts on.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parses CSV text into records. Blank lines are dropped.
pub fn parse_csv(text: &str) -> CoreResult<Vec<CsvRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut record_line = 1;

    let mut finish_record = |record: &mut Vec<String>, field: &mut String, line: usize| {
        record.push(std::mem::take(field));
        let fields = std::mem::take(record);
        if !(fields.len() == 1 && fields[0].trim().is_empty()) {
            records.push(CsvRecord { line, fields });
        }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_record(&mut record, &mut field, record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CoreError::Import("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        finish_record(&mut record, &mut field, record_line);
    }

    Ok(records)
}

/// A data row that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

/// Rows read from an item spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSheet {
    pub rows: Vec<ImportRow>,
    pub rejected: Vec<RejectedRow>,
}

/// Reads an item spreadsheet.
///
/// The header is matched case-insensitively in any order; `Name` and
/// `Price` are required, the other columns optional. An empty quantity
/// reads as zero.
///
/// ## Example
/// ```rust
/// use stockbook_core::sheet::read_item_sheet;
///
/// let sheet = read_item_sheet("name,price,quantity\nCola,1.50,24\n").unwrap();
/// assert_eq!(sheet.rows[0].price.cents(), 150);
/// assert_eq!(sheet.rows[0].quantity, 24);
/// ```
pub fn read_item_sheet(text: &str) -> CoreResult<ItemSheet> {
    let mut records = parse_csv(text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| CoreError::Import("the file is empty".to_string()))?
        .fields;

    let position = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let name_col = position("name")
        .ok_or_else(|| CoreError::Import("missing Name column".to_string()))?;
    let price_col = position("price")
        .ok_or_else(|| CoreError::Import("missing Price column".to_string()))?;
    let sku_col = position("sku");
    let qty_col = position("quantity");
    let desc_col = position("description");
    let vendor_col = position("vendor");

    let mut sheet = ItemSheet::default();
    for CsvRecord { line, fields } in records {
        let cell = |col: Option<usize>| -> Option<String> {
            col.and_then(|c| fields.get(c))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let name = cell(Some(name_col)).unwrap_or_default();

        let price = match cell(Some(price_col)) {
            Some(raw) => match Money::parse(&raw) {
                Ok(price) => price,
                Err(_) => {
                    sheet.rejected.push(RejectedRow {
                        line,
                        reason: format!("invalid price '{}'", raw),
                    });
                    continue;
                }
            },
            None => {
                sheet.rejected.push(RejectedRow {
                    line,
                    reason: "missing price".to_string(),
                });
                continue;
            }
        };

        let quantity = match cell(qty_col) {
            None => 0,
            Some(raw) => match parse_quantity(&raw) {
                Some(qty) => qty,
                None => {
                    sheet.rejected.push(RejectedRow {
                        line,
                        reason: format!("invalid quantity '{}'", raw),
                    });
                    continue;
                }
            },
        };

        sheet.rows.push(ImportRow {
            line,
            name,
            sku: cell(sku_col),
            price,
            quantity,
            description: cell(desc_col),
            vendor: cell(vendor_col),
        });
    }

    Ok(sheet)
}

/// Whole numbers, allowing a trailing `.0` that spreadsheets like to add.
fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.replace(',', "");
    let whole = match raw.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole.to_string(),
        Some(_) => return None,
        None => raw,
    };
    whole.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let rows = vec![
            vec!["a".to_string(), "b,c".to_string()],
            vec!["say \"hi\"".to_string(), "two\nlines".to_string()],
        ];
        assert_eq!(
            write_csv(&rows),
            "a,\"b,c\"\r\n\"say \"\"hi\"\"\",\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn test_parse_csv_handles_quotes_and_line_endings() {
        let text = "Name,Notes\r\n\"Cola, large\",\"said \"\"yes\"\"\"\n\nGum,\"a\nb\"";
        let records = parse_csv(text).unwrap();
        let fields: Vec<Vec<String>> = records.iter().map(|r| r.fields.clone()).collect();
        assert_eq!(
            fields,
            vec![
                vec!["Name".to_string(), "Notes".to_string()],
                vec!["Cola, large".to_string(), "said \"yes\"".to_string()],
                vec!["Gum".to_string(), "a\nb".to_string()],
            ]
        );
        // the blank line is line 3
        let lines: Vec<usize> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[test]
    fn test_parse_csv_rejects_unterminated_quote() {
        assert!(matches!(parse_csv("a,\"b"), Err(CoreError::Import(_))));
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let records = parse_csv("\u{feff}Name\nCola\n").unwrap();
        assert_eq!(records[0].fields[0], "Name");
    }

    #[test]
    fn test_read_item_sheet() {
        let text = "\
SKU,Name,Price,Quantity,Vendor
cola-1,Cola,\"$1,200.50\",3,Acme
,Chips,0.99,,
,Gum,abc,1,
,Mints,0.50,2.0,
,Tea,1.00,1.5,
";
        let sheet = read_item_sheet(text).unwrap();

        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].sku.as_deref(), Some("cola-1"));
        assert_eq!(sheet.rows[0].price.cents(), 120050);
        assert_eq!(sheet.rows[0].vendor.as_deref(), Some("Acme"));
        assert_eq!(sheet.rows[1].quantity, 0);
        assert_eq!(sheet.rows[1].sku, None);
        assert_eq!(sheet.rows[2].quantity, 2);

        let lines: Vec<usize> = sheet.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![4, 6]);
    }

    #[test]
    fn test_rejected_rows_point_at_physical_lines() {
        let text = "Name,Price,Description\n\nCola,1.50,\"two\nlines\"\n\nGum,abc,\nMints,0.50,\n";
        let sheet = read_item_sheet(text).unwrap();

        assert_eq!(sheet.rows[0].line, 3);
        assert_eq!(sheet.rejected.len(), 1);
        assert_eq!(sheet.rejected[0].line, 6);
        assert_eq!(sheet.rows[1].line, 7);
    }

    #[test]
    fn test_read_item_sheet_requires_columns() {
        assert!(read_item_sheet("").is_err());
        assert!(read_item_sheet("Name,Quantity\nCola,1\n").is_err());
    }

    #[test]
    fn test_items_export_reads_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let item = Item {
            id: "1".to_string(),
            owner_id: "owner".to_string(),
            name: "Cola, 330ml".to_string(),
            price_cents: 150,
            quantity: 12,
            sku: "COLA".to_string(),
            description: Some("Chilled".to_string()),
            vendor: None,
            created_at: now,
            created_by: "owner@shop.com".to_string(),
            updated_at: now,
            updated_by: "owner@shop.com".to_string(),
        };

        let csv = items_to_csv(&[item]);
        assert!(csv.starts_with("Name,SKU,Price,Quantity,Description,Vendor\r\n"));

        let sheet = read_item_sheet(&csv).unwrap();
        assert_eq!(sheet.rows[0].name, "Cola, 330ml");
        assert_eq!(sheet.rows[0].price.cents(), 150);
        assert_eq!(sheet.rows[0].quantity, 12);
    }
}
