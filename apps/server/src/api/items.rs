//! # Item Routes
//!
//! Inventory CRUD, manual stock adjustments and spreadsheet import/export.
//!
//! ## Import Flow
//! ```text
//! POST /api/items/import (text/csv body)
//!        │
//!        ▼
//! read_item_sheet ── bad rows ──► report.rejected
//!        │
//!        ▼
//! plan_import(existing items, rows)   create / merge / skip per row
//!        │
//!        ▼
//! db.items().apply_import   one transaction
//!        │
//!        ▼
//! ImportReport { created, merged, skipped, rejected, actions }
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use stockbook_core::import::{plan_import, ImportAction};
use stockbook_core::sheet::{items_to_csv, read_item_sheet, RejectedRow};
use stockbook_core::validation::{normalize_item_draft, normalize_optional_text, validate_stock_delta};
use stockbook_core::{item_change_summary, new_id, ActivityAction, Item, ItemDraft, NewActivity};
use stockbook_db::{ItemQuery, ItemSort};

use super::{csv_download, log_activity};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/import", post(import_items))
        .route("/api/items/export", get(export_items))
        .route(
            "/api/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/items/{id}/adjust", post(adjust_stock))
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    /// Units to add (positive) or remove (negative).
    pub delta: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: usize,
    pub merged: usize,
    pub skipped: usize,
    pub rejected: Vec<RejectedRow>,
    pub actions: Vec<ImportAction>,
}

/// GET /api/items?search=&sort=
pub async fn list_items(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Vec<Item>> {
    let sort = match query.sort.as_deref() {
        Some(sort) if !sort.trim().is_empty() => sort.parse::<ItemSort>()?,
        _ => ItemSort::default(),
    };
    let query = ItemQuery {
        search: query.search,
        sort,
    };

    let items = state.db.items().list(&session.owner_id, &query).await?;
    Ok(Json(items))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<ItemDraft>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let draft = normalize_item_draft(draft)?;
    let now = Utc::now();

    let item = Item {
        id: new_id(),
        owner_id: session.owner_id.clone(),
        name: draft.name,
        price_cents: draft.price_cents,
        quantity: draft.quantity,
        sku: draft.sku,
        description: draft.description,
        vendor: draft.vendor,
        created_at: now,
        created_by: session.email.clone(),
        updated_at: now,
        updated_by: session.email.clone(),
    };
    state.db.items().insert(&item).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::ItemCreated,
            format!("Created item {} ({})", item.name, item.sku),
        )
        .with_item(&item.id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    let item = state.db.items().get(&session.owner_id, &id).await?;
    Ok(Json(item))
}

/// PUT /api/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(draft): Json<ItemDraft>,
) -> ApiResult<Item> {
    let draft = normalize_item_draft(draft)?;
    let before = state.db.items().get(&session.owner_id, &id).await?;
    let changes = item_change_summary(&before, &draft);

    let item = state
        .db
        .items()
        .update(&session.owner_id, &id, &draft, &session.email, Utc::now())
        .await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(ActivityAction::ItemUpdated, format!("Updated item {}", item.name))
            .with_item(&item.id)
            .with_changes(changes),
    )
    .await;

    Ok(Json(item))
}

/// DELETE /api/items/{id}
///
/// Past sales keep their frozen name and SKU.
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    let item = state.db.items().delete(&session.owner_id, &id).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::ItemDeleted,
            format!("Deleted item {} ({})", item.name, item.sku),
        )
        .with_item(&item.id),
    )
    .await;

    Ok(Json(item))
}

/// POST /api/items/{id}/adjust
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<Item> {
    validate_stock_delta(req.delta)?;
    let reason = normalize_optional_text("reason", req.reason.as_deref())?;

    let item = state
        .db
        .items()
        .adjust_stock(&session.owner_id, &id, req.delta, &session.email, Utc::now())
        .await?;

    let mut details = format!("Adjusted stock of {} by {:+}", item.name, req.delta);
    if let Some(reason) = &reason {
        details.push_str(&format!(" ({})", reason));
    }
    log_activity(
        &state,
        &session,
        NewActivity::new(ActivityAction::StockAdjusted, details)
            .with_item(&item.id)
            .with_changes(format!(
                "quantity: {} → {}",
                item.quantity - req.delta,
                item.quantity
            )),
    )
    .await;

    Ok(Json(item))
}

/// POST /api/items/import
pub async fn import_items(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: String,
) -> ApiResult<ImportReport> {
    let sheet = read_item_sheet(&body)?;
    let existing = state.db.items().list_all(&session.owner_id).await?;
    let plan = plan_import(&existing, &sheet.rows);

    state
        .db
        .items()
        .apply_import(&session.owner_id, &plan, &session.email, Utc::now())
        .await?;

    let report = ImportReport {
        created: plan.created(),
        merged: plan.merged(),
        skipped: plan.skipped(),
        rejected: sheet.rejected,
        actions: plan.actions,
    };

    info!(
        owner_id = %session.owner_id,
        created = report.created,
        merged = report.merged,
        skipped = report.skipped,
        rejected = report.rejected.len(),
        "Items imported"
    );

    if report.created + report.merged > 0 {
        log_activity(
            &state,
            &session,
            NewActivity::new(
                ActivityAction::ItemsImported,
                format!(
                    "Imported items: {} created, {} merged, {} skipped",
                    report.created,
                    report.merged,
                    report.skipped + report.rejected.len()
                ),
            ),
        )
        .await;
    }

    Ok(Json(report))
}

/// GET /api/items/export
pub async fn export_items(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let items = state.db.items().list_all(&session.owner_id).await?;
    Ok(csv_download("items.csv", items_to_csv(&items)))
}
