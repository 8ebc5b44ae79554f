// src/handlers/finance.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{error::AppError, validation::validate_amount},
    config::AppState,
    middleware::rbac::{AdminOrAccountant, RequireRole},
    models::finance::Payment,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PaymentPayload {
    #[schema(example = 1)]
    pub customer: i64,
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "250.00")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilter {
    pub customer: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = PaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado", body = Payment),
        (status = 400, description = "Valor inválido ou maior que a dívida"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrAccountant>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state
        .finance_service
        .register_payment(payload.customer, payload.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    params(PaymentFilter),
    responses((status = 200, description = "Pagamentos, mais recentes primeiro", body = Vec<Payment>)),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrAccountant>,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(app_state.finance_service.list_payments(filter.customer).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_payment_is_invalid() {
        let payload = PaymentPayload { customer: 1, amount: Decimal::ZERO };
        assert!(payload.validate().is_err());
        let payload = PaymentPayload { customer: 1, amount: Decimal::new(1, 2) };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payment_below_a_cent_or_above_the_column_is_invalid() {
        let payload = PaymentPayload { customer: 1, amount: Decimal::new(5, 3) };
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.field_errors()["amount"][0].code, "scale");

        let payload = PaymentPayload { customer: 1, amount: Decimal::new(1_000_000_000_000, 2) };
        assert!(payload.validate().is_err());
    }
}
