// src/models/crm.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Aziz Karimov")]
    pub full_name: String,
    #[schema(example = "+998901234567")]
    pub phone_number: String,
    pub address: String,

    // Dívida corrente em USD. Só muda por vendas, pagamentos e importação.
    #[schema(example = "1200.00")]
    pub debt: Decimal,
}
