// src/handlers/inventory.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::validate_price},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOrWarehouse, RequireRole},
    },
    models::inventory::{GoodsReceipt, ImportSummary, Product, ProductData, ProductPrice, StockCondition},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(default)]
    #[validate(length(max = 200, message = "A marca deve ter no máximo 200 caracteres."))]
    #[schema(example = "Artel")]
    pub brand: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "A categoria deve ter no máximo 200 caracteres."))]
    #[schema(example = "Eshik")]
    pub category: String,

    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[schema(example = "E-100")]
    pub name: String,

    #[validate(custom(function = "validate_price"))]
    #[schema(example = "120.00")]
    pub price: Decimal,

    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity_healthy: i32,

    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity_defective: i32,
}

impl From<ProductPayload> for ProductData {
    fn from(p: ProductPayload) -> Self {
        ProductData {
            brand: p.brand,
            category: p.category,
            name: p.name,
            price: p.price,
            quantity_healthy: p.quantity_healthy,
            quantity_defective: p.quantity_defective,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub from_condition: StockCondition,
    pub to_condition: StockCondition,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    #[schema(example = 4)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReceiptPayload {
    #[schema(example = 1)]
    pub product: i64,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    #[schema(example = 10)]
    pub quantity: i32,
}

// Formulário multipart com o campo `file`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(format = Binary)]
    file: String,
}

/// Lê o campo `file` de um formulário multipart.
pub async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Formulário inválido: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Falha ao ler o arquivo: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest("Arquivo não enviado (campo 'file').".into()))
}

/// Resposta de download de planilha.
pub fn csv_attachment(filename: &'static str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    )
}

// ---
// Produtos
// ---

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Inventory",
    responses((status = 200, description = "Produtos", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(app_state.inventory_service.list_products().await?))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Inventory",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state.inventory_service.create_product(&payload.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(app_state.inventory_service.get_product(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.inventory_service.update_product(id, &payload.into()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Produto referenciado por vendas, entradas ou devoluções")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.inventory_service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/price",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Preço de tabela", body = ProductPrice),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product_price(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ProductPrice>, AppError> {
    let product = app_state.inventory_service.get_product(id).await?;
    Ok(Json(ProductPrice { price: product.price }))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/transfer",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do produto")),
    request_body = TransferPayload,
    responses(
        (status = 200, description = "Produto após a transferência", body = Product),
        (status = 400, description = "Condições iguais ou saldo insuficiente"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn transfer_condition(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    Path(id): Path<i64>,
    Json(payload): Json<TransferPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    let product = app_state
        .inventory_service
        .transfer(id, payload.from_condition, payload.to_condition, payload.quantity)
        .await?;
    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/products/export",
    tag = "Inventory",
    responses(
        (status = 200, description = "Planilha CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "Nenhum produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_products(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let bytes = app_state.inventory_service.export_products().await?;
    Ok(csv_attachment("products.csv", bytes))
}

#[utoipa::path(
    post,
    path = "/api/products/import",
    tag = "Inventory",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "Arquivo ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_products(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let bytes = read_upload(multipart).await?;
    Ok(Json(app_state.inventory_service.import_products(&bytes).await?))
}

// ---
// Entradas de mercadoria
// ---

#[utoipa::path(
    post,
    path = "/api/receipts",
    tag = "Inventory",
    request_body = ReceiptPayload,
    responses(
        (status = 201, description = "Entrada registrada", body = GoodsReceipt),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_receipt(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
    Json(payload): Json<ReceiptPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state
        .inventory_service
        .receive_goods(payload.product, payload.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/api/receipts",
    tag = "Inventory",
    responses((status = 200, description = "Entradas, mais recentes primeiro", body = Vec<GoodsReceipt>)),
    security(("api_jwt" = []))
)]
pub async fn list_receipts(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOrWarehouse>,
) -> Result<Json<Vec<GoodsReceipt>>, AppError> {
    Ok(Json(app_state.inventory_service.list_receipts().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_payload_rejects_negative_values() {
        let payload: ProductPayload = serde_json::from_value(serde_json::json!({
            "name": "E-100",
            "price": -1,
            "quantityHealthy": -2
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("quantity_healthy"));
    }

    #[test]
    fn product_price_must_fit_the_column() {
        let mut payload: ProductPayload =
            serde_json::from_value(serde_json::json!({ "name": "E-100", "price": 10 })).unwrap();
        payload.price = Decimal::new(10005, 3);
        assert!(payload.validate().unwrap_err().field_errors().contains_key("price"));
        payload.price = Decimal::new(100_000_000, 0);
        assert!(payload.validate().is_err());
        payload.price = Decimal::new(99_999_999_99, 2);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn transfer_payload_uses_condition_names() {
        let payload: TransferPayload = serde_json::from_value(serde_json::json!({
            "fromCondition": "healthy",
            "toCondition": "defective",
            "quantity": 4
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.to_condition, StockCondition::Defective);
    }
}
