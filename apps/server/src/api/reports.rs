//! # Report Routes
//!
//! Read-only views computed from the owner's records on each request.
//!
//! ```text
//! GET /api/balance-sheet?range=        sales vs purchases, running balance
//! GET /api/dashboard?range=            stock, totals, low stock, top items
//! GET /api/reports/{kind}?range=&format=json|text|csv
//! GET /api/export/{collection}         sales | purchases | expenses | items as CSV
//! ```

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use stockbook_core::balance::{build_balance_sheet, BalanceSheet};
use stockbook_core::report::{
    build_report, compute_dashboard, DashboardStats, DateRange, ReportData, ReportKind,
};
use stockbook_core::sheet::{expenses_to_csv, items_to_csv, purchases_to_csv, sales_to_csv};
use stockbook_core::ValidationError;

use super::{csv_download, RangeQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/balance-sheet", get(balance_sheet))
        .route("/api/dashboard", get(dashboard))
        .route("/api/reports/{kind}", get(report))
        .route("/api/export/{collection}", get(export_collection))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub format: Option<String>,
}

/// How a report is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Json,
    Text,
    Csv,
}

impl ReportFormat {
    fn parse(format: Option<&str>) -> Result<Self, ValidationError> {
        match format.map(|f| f.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(ReportFormat::Json),
            Some("text") | Some("txt") => Ok(ReportFormat::Text),
            Some("csv") => Ok(ReportFormat::Csv),
            Some(_) => Err(ValidationError::NotAllowed {
                field: "format".to_string(),
                allowed: vec!["json".to_string(), "text".to_string(), "csv".to_string()],
            }),
        }
    }
}

/// GET /api/balance-sheet?range=&start=&end=
pub async fn balance_sheet(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<BalanceSheet> {
    let period = query.date_range()?.resolve(Utc::now());

    let purchases = state.db.purchases().list(&session.owner_id).await?;
    let sales = state.db.sales().list(&session.owner_id).await?;

    Ok(Json(build_balance_sheet(&purchases, &sales, &period)))
}

/// GET /api/dashboard?range=&start=&end=
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DashboardStats> {
    let ctx = state.report_context(query.date_range()?);

    let items = state.db.items().list_all(&session.owner_id).await?;
    let sales = state.db.sales().list(&session.owner_id).await?;
    let purchases = state.db.purchases().list(&session.owner_id).await?;
    let expenses = state.db.expenses().list(&session.owner_id).await?;

    let data = ReportData {
        items: &items,
        sales: &sales,
        purchases: &purchases,
        expenses: &expenses,
    };
    Ok(Json(compute_dashboard(&data, &ctx)))
}

/// GET /api/reports/{kind}?range=&start=&end=&format=
pub async fn report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let kind: ReportKind = kind.parse()?;
    let format = ReportFormat::parse(query.format.as_deref())?;
    let range = DateRange::from_query(query.range.as_deref(), query.start, query.end)?;
    let ctx = state.report_context(range);

    let owner = session.owner_id.as_str();
    let needs_sales = matches!(kind, ReportKind::Sales | ReportKind::ProfitLoss);
    let needs_purchases = matches!(kind, ReportKind::Purchases | ReportKind::ProfitLoss);
    let needs_expenses = matches!(kind, ReportKind::Expenses | ReportKind::ProfitLoss);

    let items = if kind == ReportKind::Inventory {
        state.db.items().list_all(owner).await?
    } else {
        Vec::new()
    };
    let sales = if needs_sales {
        state.db.sales().list(owner).await?
    } else {
        Vec::new()
    };
    let purchases = if needs_purchases {
        state.db.purchases().list(owner).await?
    } else {
        Vec::new()
    };
    let expenses = if needs_expenses {
        state.db.expenses().list(owner).await?
    } else {
        Vec::new()
    };

    let data = ReportData {
        items: &items,
        sales: &sales,
        purchases: &purchases,
        expenses: &expenses,
    };
    let document = build_report(kind, &data, &ctx);

    let response = match format {
        ReportFormat::Json => Json(document).into_response(),
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            document.to_text(),
        )
            .into_response(),
        ReportFormat::Csv => {
            csv_download(&format!("{}-report.csv", kind.as_str()), document.to_csv())
        }
    };
    Ok(response)
}

/// GET /api/export/{collection}
pub async fn export_collection(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(collection): Path<String>,
) -> Result<Response, ApiError> {
    let owner = session.owner_id.as_str();
    let collection = collection.trim().to_lowercase();

    let body = match collection.as_str() {
        "sales" => sales_to_csv(&state.db.sales().list(owner).await?),
        "purchases" => purchases_to_csv(&state.db.purchases().list(owner).await?),
        "expenses" => expenses_to_csv(&state.db.expenses().list(owner).await?),
        "items" => items_to_csv(&state.db.items().list_all(owner).await?),
        _ => {
            return Err(ValidationError::NotAllowed {
                field: "collection".to_string(),
                allowed: ["sales", "purchases", "expenses", "items"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }
            .into())
        }
    };

    Ok(csv_download(&format!("{}.csv", collection), body))
}
