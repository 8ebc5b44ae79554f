// src/handlers/returns.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::returns_repo::ReturnRecord,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, SalesStaff},
    },
    models::{inventory::StockCondition, returns::ReturnedProductDetail},
    services::return_service::ReturnChanges,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnPayload {
    #[schema(example = 1)]
    pub customer: i64,
    #[schema(example = 1)]
    pub product: i64,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    #[schema(example = 3)]
    pub quantity: i32,
    pub condition: StockCondition,
    #[serde(default)]
    pub reason: String,
    /// Padrão: hoje.
    pub returned_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReturnPayload {
    pub customer: Option<i64>,
    pub product: Option<i64>,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    pub quantity: Option<i32>,
    pub condition: Option<StockCondition>,
    pub reason: Option<String>,
    pub returned_at: Option<NaiveDate>,
}

impl From<UpdateReturnPayload> for ReturnChanges {
    fn from(p: UpdateReturnPayload) -> Self {
        ReturnChanges {
            customer: p.customer,
            product: p.product,
            quantity: p.quantity,
            condition: p.condition,
            reason: p.reason,
            returned_at: p.returned_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/returns",
    tag = "Returns",
    responses((status = 200, description = "Devoluções", body = Vec<ReturnedProductDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_returns(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesStaff>,
) -> Result<Json<Vec<ReturnedProductDetail>>, AppError> {
    Ok(Json(app_state.return_service.list_returns().await?))
}

#[utoipa::path(
    post,
    path = "/api/returns",
    tag = "Returns",
    request_body = CreateReturnPayload,
    responses(
        (status = 201, description = "Devolução registrada", body = ReturnedProductDetail),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_return(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<SalesStaff>,
    Json(payload): Json<CreateReturnPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = ReturnRecord {
        customer_id: payload.customer,
        product_id: payload.product,
        quantity: payload.quantity,
        condition: payload.condition,
        reason: &payload.reason,
        returned_at: payload.returned_at.unwrap_or_else(|| Utc::now().date_naive()),
    };
    let created = app_state.return_service.create_return(&record, &user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/returns/{id}",
    tag = "Returns",
    params(("id" = i64, Path, description = "ID da devolução")),
    responses(
        (status = 200, description = "Devolução", body = ReturnedProductDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_return(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesStaff>,
    Path(id): Path<i64>,
) -> Result<Json<ReturnedProductDetail>, AppError> {
    Ok(Json(app_state.return_service.get_return(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/returns/{id}",
    tag = "Returns",
    params(("id" = i64, Path, description = "ID da devolução")),
    request_body = UpdateReturnPayload,
    responses(
        (status = 200, description = "Devolução atualizada", body = ReturnedProductDetail),
        (status = 400, description = "Estoque ficaria negativo"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_return(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesStaff>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateReturnPayload>,
) -> Result<Json<ReturnedProductDetail>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.return_service.update_return(id, &payload.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/returns/{id}",
    tag = "Returns",
    params(("id" = i64, Path, description = "ID da devolução")),
    responses(
        (status = 204, description = "Removida"),
        (status = 400, description = "Estoque já consumido"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_return(
    State(app_state): State<AppState>,
    _guard: RequireRole<SalesStaff>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.return_service.delete_return(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
