//! # HTTP API
//!
//! Routes consumed by the browser UI.
//!
//! ## Route Organization
//! ```text
//! api/
//! ├── mod.rs        ◄─── You are here (router, shared helpers)
//! ├── health.rs     ◄─── GET /health
//! ├── auth.rs       ◄─── sign-up, sign-in, me, profile
//! ├── items.rs      ◄─── inventory CRUD, stock adjust, import/export
//! ├── sales.rs      ◄─── record / list / delete sales
//! ├── purchases.rs  ◄─── record / list / delete purchases
//! ├── expenses.rs   ◄─── expense CRUD
//! ├── reports.rs    ◄─── balance sheet, dashboard, reports, CSV exports
//! └── activity.rs   ◄─── activity feed
//! ```
//!
//! Everything under `/api` except sign-up and sign-in sits behind
//! [`auth_middleware`]; handlers read the owner from the `Session`
//! extension and never from the request body.

pub mod activity;
pub mod auth;
pub mod expenses;
pub mod health;
pub mod items;
pub mod purchases;
pub mod reports;
pub mod sales;

use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use stockbook_core::report::DateRange;
use stockbook_core::NewActivity;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::{auth_middleware, Session};
use crate::error::ApiError;
use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(items::routes())
        .merge(sales::routes())
        .merge(purchases::routes())
        .merge(expenses::routes())
        .merge(reports::routes())
        .merge(activity::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health::health))
        .merge(auth::public_routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.cors_origin.as_deref()))
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin {
        None => layer.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin; cross-origin requests are blocked");
                layer
            }
        },
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// `range`, `start` and `end` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    pub fn date_range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange::from_query(self.range.as_deref(), self.start, self.end)?)
    }
}

/// Appends to the owner's activity feed.
///
/// The change itself is already committed, so a failed append is logged
/// and the request still succeeds.
pub(crate) async fn log_activity(state: &AppState, session: &Session, entry: NewActivity) {
    let action = entry.action;
    if let Err(e) = state
        .db
        .activity()
        .append(&session.owner_id, &session.email, entry, Utc::now())
        .await
    {
        warn!(?action, error = %e, "Failed to record activity");
    }
}

/// A CSV body served as a file download.
pub(crate) fn csv_download(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
