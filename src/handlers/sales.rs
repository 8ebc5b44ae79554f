// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::inventory::csv_attachment,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOrSeller, RequireRole, SalesStaff},
    },
    models::sales::{CreateSalePayload, SaleDetail, SaleFilter, SaleReceipt, UpdateSaleStatusPayload},
};

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda criada", body = SaleReceipt),
        (status = 400, description = "Dados inválidos ou estoque insuficiente"),
        (status = 404, description = "Cliente ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<AdminOrSeller>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state.sale_service.create_sale(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleFilter),
    responses((status = 200, description = "Vendas, mais recentes primeiro", body = Vec<SaleDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<Vec<SaleDetail>>, AppError> {
    Ok(Json(app_state.sale_service.list_sales(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = i64, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda", body = SaleDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<SaleDetail>, AppError> {
    Ok(Json(app_state.sale_service.get_sale(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/sales/export",
    tag = "Sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "Planilha CSV (uma linha por item)", body = String, content_type = "text/csv"),
        (status = 404, description = "Nenhuma venda no filtro")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_sales(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = app_state.sale_service.export_sales(&filter).await?;
    Ok(csv_attachment("sales.csv", bytes))
}

#[utoipa::path(
    patch,
    path = "/api/sales/{id}/status",
    tag = "Sales",
    params(("id" = i64, Path, description = "ID da venda")),
    request_body = UpdateSaleStatusPayload,
    responses(
        (status = 200, description = "Venda com o novo status", body = SaleDetail),
        (status = 403, description = "Status fora do perfil do usuário"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sale_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<SalesStaff>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSaleStatusPayload>,
) -> Result<Json<SaleDetail>, AppError> {
    let sale = app_state.sale_service.update_status(id, payload.status, &user).await?;
    Ok(Json(sale))
}
