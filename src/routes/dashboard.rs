//! Dashboard routes: aggregated statistics and the dashboard view model.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::statistics::DashboardStatistics;
use crate::services::stats::{self, StatsOutcome};
use crate::services::view::{completion_rate, DashboardView};
use crate::AppState;

/// Statistics plus how the aggregation went.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub statistics: DashboardStatistics,
    pub completion_rate: String,
    pub outcome: StatsOutcome,
}

/// GET /api/v1/dashboard/stats: fresh aggregation with its typed outcome.
///
/// A failed batch still answers 200 with zeroed statistics; `outcome` says why.
pub async fn stats(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<ApiResponse<StatsReport>> {
    let (panel, outcome) = stats::load_once(&state.stats).await;
    ApiResponse::success(StatsReport {
        completion_rate: completion_rate(&panel.statistics),
        statistics: panel.statistics,
        outcome,
    })
}

/// GET /api/v1/dashboard: full dashboard view model.
pub async fn view(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Json<ApiResponse<DashboardView>> {
    ApiResponse::success(render(&state, &user).await)
}

/// POST /api/v1/dashboard/export: report export placeholder.
pub async fn export(user: CurrentUser) -> Result<Json<ApiResponse<()>>, AppError> {
    tracing::info!(user_id = %user.id, "Report export requested");
    Err(AppError::NotImplemented(
        "Report export is not available yet".to_string(),
    ))
}

/// Mount a panel, load statistics once and build the view from the settled state.
pub(crate) async fn render(state: &AppState, user: &CurrentUser) -> DashboardView {
    let (panel, _) = stats::load_once(&state.stats).await;
    DashboardView::build(user, &panel)
}
