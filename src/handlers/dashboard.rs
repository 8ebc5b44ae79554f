// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{reports::DashboardStats, sales::SaleFilter},
};

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Reports",
    params(SaleFilter),
    responses((status = 200, description = "Indicadores do painel", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(app_state.report_service.dashboard(&filter).await?))
}
