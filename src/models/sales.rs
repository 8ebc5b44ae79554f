// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::validation::validate_price,
    models::{
        auth::{Role, UserWithGroups},
        crm::Customer,
    },
};

// --- Status da venda ---
// Valores no fio (JSON) e no banco são os nomes usados pela equipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status")]
pub enum SaleStatus {
    #[serde(rename = "yaratildi")]
    #[sqlx(rename = "yaratildi")]
    Created,
    #[serde(rename = "omborga_yuborildi")]
    #[sqlx(rename = "omborga_yuborildi")]
    SentToWarehouse,
    #[serde(rename = "yigildi")]
    #[sqlx(rename = "yigildi")]
    Assembled,
    #[serde(rename = "yuborildi")]
    #[sqlx(rename = "yuborildi")]
    Shipped,
    #[serde(rename = "bron_qilindi")]
    #[sqlx(rename = "bron_qilindi")]
    Reserved,
    #[serde(rename = "bron_yuborildi")]
    #[sqlx(rename = "bron_yuborildi")]
    ReservationShipped,
    #[serde(rename = "bron_bekor_qilindi")]
    #[sqlx(rename = "bron_bekor_qilindi")]
    ReservationCancelled,
    #[serde(rename = "buyurtma_bekor_qilindi")]
    #[sqlx(rename = "buyurtma_bekor_qilindi")]
    OrderCancelled,
}

/// Quem recebe a notificação quando a venda entra num status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    WarehouseGroup,
    Seller,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 8] = [
        SaleStatus::Created,
        SaleStatus::SentToWarehouse,
        SaleStatus::Assembled,
        SaleStatus::Shipped,
        SaleStatus::Reserved,
        SaleStatus::ReservationShipped,
        SaleStatus::ReservationCancelled,
        SaleStatus::OrderCancelled,
    ];

    const SELLER_SETTABLE: [SaleStatus; 5] = [
        SaleStatus::Created,
        SaleStatus::SentToWarehouse,
        SaleStatus::Reserved,
        SaleStatus::ReservationCancelled,
        SaleStatus::OrderCancelled,
    ];

    const WAREHOUSE_SETTABLE: [SaleStatus; 3] = [
        SaleStatus::Assembled,
        SaleStatus::Shipped,
        SaleStatus::ReservationShipped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Created => "yaratildi",
            SaleStatus::SentToWarehouse => "omborga_yuborildi",
            SaleStatus::Assembled => "yigildi",
            SaleStatus::Shipped => "yuborildi",
            SaleStatus::Reserved => "bron_qilindi",
            SaleStatus::ReservationShipped => "bron_yuborildi",
            SaleStatus::ReservationCancelled => "bron_bekor_qilindi",
            SaleStatus::OrderCancelled => "buyurtma_bekor_qilindi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SaleStatus::Created => "Yaratildi",
            SaleStatus::SentToWarehouse => "Omborga yuborildi",
            SaleStatus::Assembled => "Yig'ildi",
            SaleStatus::Shipped => "Yuborildi",
            SaleStatus::Reserved => "Bron qilindi",
            SaleStatus::ReservationShipped => "Bron yuborildi",
            SaleStatus::ReservationCancelled => "Bron bekor qilindi",
            SaleStatus::OrderCancelled => "Buyurtma bekor qilindi",
        }
    }

    pub fn settable_by_role(self, role: Role) -> bool {
        match role {
            Role::Seller => Self::SELLER_SETTABLE.contains(&self),
            Role::Warehouse => Self::WAREHOUSE_SETTABLE.contains(&self),
            Role::Accountant => false,
        }
    }

    /// Administrador pode tudo; quem está nos dois grupos recebe a união.
    pub fn can_be_set_by(self, user: &UserWithGroups) -> bool {
        user.is_admin()
            || [Role::Seller, Role::Warehouse]
                .into_iter()
                .any(|role| user.has_role(role) && self.settable_by_role(role))
    }

    pub fn notify_target(self) -> Option<NotifyTarget> {
        match self {
            SaleStatus::SentToWarehouse
            | SaleStatus::Reserved
            | SaleStatus::ReservationCancelled
            | SaleStatus::OrderCancelled => Some(NotifyTarget::WarehouseGroup),
            SaleStatus::Assembled | SaleStatus::Shipped | SaleStatus::ReservationShipped => {
                Some(NotifyTarget::Seller)
            }
            SaleStatus::Created => None,
        }
    }
}

// --- Registros ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub status: SaleStatus,
    pub seller_id: Uuid,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    #[serde(rename = "product")]
    pub product_id: i64,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "120.00")]
    pub price: Decimal,
}

impl SaleItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// Linha com o nome do produto (listagens e exportação)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDetail {
    #[serde(skip)]
    pub sale_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl SaleItemDetail {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub id: i64,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub customer: Customer,
    pub seller: UserWithGroups,
    pub items: Vec<SaleItemDetail>,
    pub total: Decimal,
}

// Resposta da criação: a venda e as linhas gravadas
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub sale: Sale,
    pub seller: String,
    pub items: Vec<SaleItem>,
    pub total: Decimal,
}

// Uma linha da exportação: venda x item, já com nomes resolvidos
#[derive(Debug, Clone, FromRow)]
pub struct SaleExportRow {
    pub sale_id: i64,
    pub created_at: DateTime<Utc>,
    pub customer: String,
    pub seller: String,
    pub product: String,
    pub quantity: i32,
    pub price: Decimal,
    pub status: SaleStatus,
}

impl SaleExportRow {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// --- Payloads ---

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    #[schema(example = 1)]
    pub product: i64,
    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    #[schema(example = 2)]
    pub quantity: i32,
    #[validate(custom(function = "validate_price"))]
    #[schema(example = "120.00")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    #[schema(example = 1)]
    pub customer: i64,
    #[validate(length(min = 1, message = "A venda precisa de ao menos um item."), nested)]
    pub items: Vec<SaleItemPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSaleStatusPayload {
    pub status: SaleStatus,
}

// Filtros da listagem (também usados pelo dashboard e pela exportação)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleFilter {
    pub customer: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::user_with;

    #[test]
    fn seller_and_warehouse_subsets_do_not_overlap() {
        for status in SaleStatus::ALL {
            assert!(
                !(status.settable_by_role(Role::Seller) && status.settable_by_role(Role::Warehouse)),
                "{} em dois subconjuntos",
                status.as_str()
            );
        }
    }

    #[test]
    fn every_status_is_settable_by_someone() {
        for status in SaleStatus::ALL {
            assert!(status.settable_by_role(Role::Seller) || status.settable_by_role(Role::Warehouse));
        }
    }

    #[test]
    fn seller_cannot_mark_assembled() {
        let seller = user_with(&["Sotuvchilar"], false);
        assert!(SaleStatus::SentToWarehouse.can_be_set_by(&seller));
        assert!(!SaleStatus::Assembled.can_be_set_by(&seller));
    }

    #[test]
    fn warehouse_cannot_cancel_order() {
        let warehouse = user_with(&["Omborchilar"], false);
        assert!(SaleStatus::Shipped.can_be_set_by(&warehouse));
        assert!(!SaleStatus::OrderCancelled.can_be_set_by(&warehouse));
    }

    #[test]
    fn admin_and_dual_members_get_everything() {
        let admin = user_with(&[], true);
        let both = user_with(&["Sotuvchilar", "Omborchilar"], false);
        let accountant = user_with(&["Buxgalterlar"], false);
        for status in SaleStatus::ALL {
            assert!(status.can_be_set_by(&admin));
            assert!(status.can_be_set_by(&both));
            assert!(!status.can_be_set_by(&accountant));
        }
    }

    #[test]
    fn notifications_flow_between_seller_and_warehouse() {
        assert_eq!(SaleStatus::SentToWarehouse.notify_target(), Some(NotifyTarget::WarehouseGroup));
        assert_eq!(SaleStatus::Shipped.notify_target(), Some(NotifyTarget::Seller));
        assert_eq!(SaleStatus::Created.notify_target(), None);
    }

    #[test]
    fn status_wire_names() {
        for status in SaleStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        let parsed: SaleStatus = serde_json::from_str("\"bron_yuborildi\"").unwrap();
        assert_eq!(parsed, SaleStatus::ReservationShipped);
    }

    #[test]
    fn sale_payload_needs_items_with_positive_quantity() {
        let empty: CreateSalePayload =
            serde_json::from_value(serde_json::json!({ "customer": 1, "items": [] })).unwrap();
        assert!(empty.validate().is_err());

        let zero: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "customer": 1,
            "items": [{ "product": 1, "quantity": 0, "price": 10 }]
        }))
        .unwrap();
        assert!(zero.validate().is_err());

        let ok: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "customer": 1,
            "items": [{ "product": 1, "quantity": 2, "price": 10.5 }]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn line_price_with_three_decimals_is_rejected() {
        let payload = CreateSalePayload {
            customer: 1,
            items: vec![SaleItemPayload { product: 1, quantity: 1, price: Decimal::new(10005, 3) }],
        };
        assert!(payload.validate().is_err());

        let payload = CreateSalePayload {
            customer: 1,
            items: vec![SaleItemPayload { product: 1, quantity: 1, price: Decimal::new(10010, 3) }],
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn line_total_multiplies_quantity_by_price() {
        let item = SaleItem { id: 1, sale_id: 1, product_id: 1, quantity: 3, price: Decimal::new(12050, 2) };
        assert_eq!(item.line_total(), Decimal::new(36150, 2));
    }
}
