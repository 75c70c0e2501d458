//! # Expense Routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use stockbook_core::report::DateRange;
use stockbook_core::validation::normalize_expense_draft;
use stockbook_core::{new_id, ActivityAction, Expense, ExpenseCategory, ExpenseDraft, NewActivity};

use super::log_activity;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route(
            "/api/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
}

/// GET /api/expenses?range=&start=&end=&category=
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ExpenseListQuery>,
) -> ApiResult<Vec<Expense>> {
    let period = DateRange::from_query(query.range.as_deref(), query.start, query.end)?
        .resolve(Utc::now());
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty() && !c.trim().eq_ignore_ascii_case("all"))
        .map(str::parse::<ExpenseCategory>)
        .transpose()?;

    let expenses = state
        .db
        .expenses()
        .list(&session.owner_id)
        .await?
        .into_iter()
        .filter(|e| period.contains(e.expense_date))
        .filter(|e| category.map_or(true, |c| e.category == c))
        .collect();

    Ok(Json(expenses))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<ExpenseDraft>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let draft = normalize_expense_draft(draft)?;
    let now = Utc::now();

    let expense = Expense {
        id: new_id(),
        owner_id: session.owner_id.clone(),
        name: draft.name,
        category: draft.category,
        amount_cents: draft.amount_cents,
        description: draft.description,
        expense_date: draft.expense_date.unwrap_or(now),
        created_at: now,
        created_by: session.email.clone(),
        updated_at: now,
        updated_by: session.email.clone(),
    };
    state.db.expenses().insert(&expense).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::ExpenseCreated,
            format!(
                "Recorded {} expense {} ({})",
                expense.category,
                expense.name,
                expense.amount()
            ),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/expenses/{id}
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Expense> {
    let expense = state.db.expenses().get(&session.owner_id, &id).await?;
    Ok(Json(expense))
}

/// PUT /api/expenses/{id}
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(draft): Json<ExpenseDraft>,
) -> ApiResult<Expense> {
    let draft = normalize_expense_draft(draft)?;
    let before = state.db.expenses().get(&session.owner_id, &id).await?;

    let expense = state
        .db
        .expenses()
        .update(&session.owner_id, &id, &draft, &session.email, Utc::now())
        .await?;

    let mut changes = Vec::new();
    if before.amount_cents != expense.amount_cents {
        changes.push(format!("amount: {} → {}", before.amount(), expense.amount()));
    }
    if before.category != expense.category {
        changes.push(format!("category: {} → {}", before.category, expense.category));
    }
    if before.name != expense.name {
        changes.push(format!("name: {} → {}", before.name, expense.name));
    }

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::ExpenseUpdated,
            format!("Updated expense {}", expense.name),
        )
        .with_changes(changes.join("; ")),
    )
    .await;

    Ok(Json(expense))
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<Expense> {
    let expense = state.db.expenses().delete(&session.owner_id, &id).await?;

    log_activity(
        &state,
        &session,
        NewActivity::new(
            ActivityAction::ExpenseDeleted,
            format!("Deleted expense {} ({})", expense.name, expense.amount()),
        ),
    )
    .await;

    Ok(Json(expense))
}
