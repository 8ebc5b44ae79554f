// src/handlers/crm.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::inventory::{csv_attachment, read_upload, UploadForm},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{Admin, AdminOrSeller, RequireRole},
    },
    models::{
        crm::Customer,
        inventory::ImportSummary,
        reports::{ReconciliationQuery, ReconciliationReport},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 255, message = "O nome completo é obrigatório."))]
    #[schema(example = "Aziz Karimov")]
    pub full_name: String,

    #[validate(length(min = 1, max = 20, message = "O telefone deve ter entre 1 e 20 caracteres."))]
    #[schema(example = "+998901234567")]
    pub phone_number: String,

    #[serde(default)]
    pub address: String,
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Clientes", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(app_state.crm_service.list_customers().await?))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrSeller>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .crm_service
        .create_customer(&payload.full_name, &payload.phone_number, &payload.address)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(app_state.crm_service.get_customer(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrSeller>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;

    let customer = app_state
        .crm_service
        .update_customer(id, &payload.full_name, &payload.phone_number, &payload.address)
        .await?;
    Ok(Json(customer))
}

#[utoipa::path(
    get,
    path = "/api/customers/export",
    tag = "Customers",
    responses(
        (status = 200, description = "Planilha CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "Nenhum cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_customers(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let bytes = app_state.crm_service.export_customers().await?;
    Ok(csv_attachment("customers.csv", bytes))
}

#[utoipa::path(
    post,
    path = "/api/customers/import",
    tag = "Customers",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "Arquivo ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_customers(
    State(app_state): State<AppState>,
    _guard: RequireRole<Admin>,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let bytes = read_upload(multipart).await?;
    Ok(Json(app_state.crm_service.import_customers(&bytes).await?))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/reconciliation",
    tag = "Reports",
    params(("id" = i64, Path, description = "ID do cliente"), ReconciliationQuery),
    responses(
        (status = 200, description = "Ato de conciliação", body = ReconciliationReport),
        (status = 400, description = "Período ausente ou inválido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reconciliation(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<ReconciliationQuery>,
) -> Result<Json<ReconciliationReport>, AppError> {
    let report = app_state
        .report_service
        .reconciliation(id, query.start_date, query.end_date)
        .await?;
    Ok(Json(report))
}
