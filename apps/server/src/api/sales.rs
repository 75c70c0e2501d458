//! # Sale Routes
//!
//! ## Recording a Sale
//! ```text
//! POST /api/sales { saleType, lines[], payment, purchaserName?, ... }
//!        │
//!        ▼
//! SaleCart (prices frozen from the current items)
//!        │  check_stock + into_sale: retail < 12 units, wholesale ≥ 12,
//!        │  cash + credit must settle the total
//!        ▼
//! db.sales().create   inserts sale + lines, decrements stock in one transaction
//!        │
//!        ▼
//! 201 Sale
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use stockbook_core::cart::{SaleCart, SaleCartLine, SaleDetails};
use stockbook_core::report::DateRange;
use stockbook_core::{ActivityAction, CoreError, NewActivity, Sale, SaleType};

use super::log_activity;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list_sales).post(record_sale))
        .route("/api/sales/{id}", get(get_sale).delete(delete_sale))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub sale_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub item_id: String,
    pub quantity: i64,
    /// Overrides the item's selling price for this sale.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleRequest {
    pub sale_type: SaleType,
    pub lines: Vec<SaleLineRequest>,
    #[serde(flatten)]
    pub details: SaleDetails,
}

/// GET /api/sales?range=&start=&end=&type=
///
/// Newest first.
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SaleListQuery>,
) -> ApiResult<Vec<Sale>> {
    let period = DateRange::from_query(query.range.as_deref(), query.start, query.end)?
        .resolve(Utc::now());
    let sale_type = query
        .sale_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<SaleType>)
        .transpose()?;

    let sales = state
        .db
        .sales()
        .list(&session.owner_id)
        .await?
        .into_iter()
        .filter(|s| period.contains(s.sale_date))
        .filter(|s| sale_type.map_or(true, |t| s.sale_type == t))
        .collect();

    Ok(Json(sales))
}

/// POST /api/sales
pub async fn record_sale(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<RecordSaleRequest>,
) -> Result<(StatusCode, Json<Sale>), ApiError> {
    let items = state.db.items().list_all(&session.owner_id).await?;

    let mut cart = SaleCart::new();
    for line in &req.lines {
        let item = items
            .iter()
            .find(|i| i.id == line.item_id)
            .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;

        let mut cart_line = SaleCartLine::from_item(item, line.quantity);
        if let Some(price) = line.unit_price_cents {
            cart_line.unit_price_cents = price;
            cart_line.cash_price_cents = price;
            cart_line.credit_price_cents = price;
        }
        cart.add_line(cart_line)?;
    }
    cart.check_stock(&items)?;

    let sale = cart.into_sale(
        req.sale_type,
        req.details,
        &session.owner_id,
        &session.email,
        Utc::now(),
    )?;
    state.db.sales().create(&sale).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::SaleCreated,
            format!(
                "Recorded {} sale of {} ({} units)",
                sale.sale_type,
                sale.total(),
                sale.total_units()
            ),
        )
        .with_sale(&sale.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/sales/{id}
pub async fn get_sale(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Sale> {
    let sale = state.db.sales().get(&session.owner_id, &id).await?;
    Ok(Json(sale))
}

/// DELETE /api/sales/{id}
///
/// Puts the sold units back on the shelf.
pub async fn delete_sale(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Sale> {
    let sale = state.db.sales().delete(&session.owner_id, &id).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::SaleDeleted,
            format!(
                "Deleted {} sale of {}; {} units returned to stock",
                sale.sale_type,
                sale.total(),
                sale.total_units()
            ),
        )
        .with_sale(&sale.id),
    )
    .await;

    Ok(Json(sale))
}
