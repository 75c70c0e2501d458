//! # Purchase Routes
//!
//! A purchase restocks existing items or creates new ones. Bulk lines are
//! entered as boxes and a box price and expanded to units before anything
//! is written.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockbook_core::cart::{PurchaseCart, PurchaseCartLine, PurchaseTarget};
use stockbook_core::{ActivityAction, CoreError, NewActivity, Purchase};

use super::{log_activity, RangeQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/purchases", get(list_purchases).post(record_purchase))
        .route("/api/purchases/{id}", get(get_purchase).delete(delete_purchase))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    pub lines: Vec<PurchaseCartLine>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the time of recording.
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
}

/// GET /api/purchases?range=&start=&end=
pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Vec<Purchase>> {
    let period = query.date_range()?.resolve(Utc::now());

    let purchases = state
        .db
        .purchases()
        .list(&session.owner_id)
        .await?
        .into_iter()
        .filter(|p| period.contains(p.purchase_date))
        .collect();

    Ok(Json(purchases))
}

/// POST /api/purchases
pub async fn record_purchase(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<RecordPurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>), ApiError> {
    let items = state.db.items().list_all(&session.owner_id).await?;

    let mut cart = PurchaseCart::new();
    for mut line in req.lines {
        // existing targets must be the owner's; the stored name wins
        if let PurchaseTarget::Existing { item_id, item_name } = &mut line.target {
            let item = items
                .iter()
                .find(|i| i.id == *item_id)
                .ok_or_else(|| CoreError::ItemNotFound(item_id.clone()))?;
            *item_name = item.name.clone();
        }
        cart.add_line(line)?;
    }

    let taken: HashSet<String> = items.iter().map(|i| i.sku.clone()).collect();
    let plan = cart.into_purchase(
        req.notes,
        req.purchase_date,
        &taken,
        &session.owner_id,
        &session.email,
        Utc::now(),
    )?;
    state.db.purchases().create(&plan).await?;

    let mut details = format!(
        "Recorded purchase of {} ({} units)",
        plan.purchase.total(),
        plan.purchase.total_units()
    );
    if !plan.new_items.is_empty() {
        let names: Vec<&str> = plan.new_items.iter().map(|i| i.name.as_str()).collect();
        details.push_str(&format!("; new items: {}", names.join(", ")));
    }
    log_activity(
        &state,
        &session,
        NewActivity::new(ActivityAction::PurchaseCreated, details),
    )
    .await;

    Ok((StatusCode::CREATED, Json(plan.purchase)))
}

/// GET /api/purchases/{id}
pub async fn get_purchase(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Purchase> {
    let purchase = state.db.purchases().get(&session.owner_id, &id).await?;
    Ok(Json(purchase))
}

/// DELETE /api/purchases/{id}
///
/// Takes the received units back out of stock, never below zero. Items
/// the purchase created stay in the catalog.
pub async fn delete_purchase(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Purchase> {
    let purchase = state.db.purchases().delete(&session.owner_id, &id).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::PurchaseDeleted,
            format!(
                "Deleted purchase of {}; {} units removed from stock",
                purchase.total(),
                purchase.total_units()
            ),
        ),
    )
    .await;

    Ok(Json(purchase))
}
