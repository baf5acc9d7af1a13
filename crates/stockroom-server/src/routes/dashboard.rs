//! `/api/dashboard/summary`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use stockroom_core::repository::LedgerRepository;

use crate::dto::SummaryResponse;
use crate::error::ApiError;
use crate::extract::{ApiUser, perm};
use crate::routes::item_names;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/summary", get(summary))
}

async fn summary(
    _user: ApiUser<perm::ViewDashboard>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state
        .inventory
        .summary(state.settings.low_stock_threshold)
        .await?;
    let names = item_names(&state, &summary.recent_activity).await?;
    Ok(Json(SummaryResponse::new(summary, &names)))
}
