// src/handlers/documents.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::reports::ReconciliationQuery,
};

#[utoipa::path(
    get,
    path = "/api/customers/{id}/reconciliation/pdf",
    tag = "Reports",
    params(("id" = i64, Path, description = "ID do cliente"), ReconciliationQuery),
    responses(
        (status = 200, description = "Ato de conciliação em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Período ausente ou inválido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_reconciliation_pdf(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<ReconciliationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state
        .report_service
        .reconciliation(id, query.start_date, query.end_date)
        .await?;

    // genpdf é síncrono e pesado: fora do executor
    let documents = app_state.document_service.clone();
    let pdf = tokio::task::spawn_blocking(move || documents.reconciliation_pdf(&report))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de PDF: {}", e))??;

    let filename = format!("attachment; filename=\"reconciliation_{}.pdf\"", id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        pdf,
    ))
}
