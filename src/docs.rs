// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::list_groups,
        handlers::auth::list_users,
        handlers::auth::create_user,
        handlers::auth::get_user,
        handlers::auth::update_user,
        handlers::auth::delete_user,

        // --- INVENTORY ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::get_product_price,
        handlers::inventory::transfer_condition,
        handlers::inventory::export_products,
        handlers::inventory::import_products,
        handlers::inventory::create_receipt,
        handlers::inventory::list_receipts,

        // --- Customers ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::export_customers,
        handlers::crm::import_customers,

        // --- Sales ---
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::export_sales,
        handlers::sales::update_sale_status,

        // --- Payments ---
        handlers::finance::create_payment,
        handlers::finance::list_payments,

        // --- Returns ---
        handlers::returns::list_returns,
        handlers::returns::create_return,
        handlers::returns::get_return,
        handlers::returns::update_return,
        handlers::returns::delete_return,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,

        // --- Reports ---
        handlers::crm::get_reconciliation,
        handlers::documents::download_reconciliation_pdf,
        handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::Group,
            models::auth::UserWithGroups,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,

            // --- Inventory ---
            models::inventory::StockCondition,
            models::inventory::Product,
            models::inventory::ProductPrice,
            models::inventory::GoodsReceipt,
            models::inventory::ImportSummary,
            handlers::inventory::ProductPayload,
            handlers::inventory::TransferPayload,
            handlers::inventory::ReceiptPayload,
            handlers::inventory::UploadForm,

            // --- Customers / Payments ---
            models::crm::Customer,
            handlers::crm::CustomerPayload,
            models::finance::Payment,
            handlers::finance::PaymentPayload,

            // --- Sales ---
            models::sales::SaleStatus,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleItemDetail,
            models::sales::SaleDetail,
            models::sales::SaleReceipt,
            models::sales::SaleItemPayload,
            models::sales::CreateSalePayload,
            models::sales::UpdateSaleStatusPayload,
            models::notifications::Notification,

            // --- Returns ---
            models::returns::ReturnedProduct,
            models::returns::ReturnedProductDetail,
            handlers::returns::CreateReturnPayload,
            handlers::returns::UpdateReturnPayload,

            // --- Reports ---
            models::reports::EntryKind,
            models::reports::StatementEntry,
            models::reports::ReconciliationPeriod,
            models::reports::ReconciliationReport,
            models::reports::StatsCards,
            models::reports::SellerSales,
            models::reports::TopProduct,
            models::reports::DashboardStats,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários e grupos (administrador)"),
        (name = "Inventory", description = "Produtos, condições de estoque e entradas"),
        (name = "Customers", description = "Clientes e planilhas"),
        (name = "Sales", description = "Vendas (cheques) e status"),
        (name = "Payments", description = "Pagamentos de dívida"),
        (name = "Returns", description = "Devoluções de produtos"),
        (name = "Notifications", description = "Avisos de mudança de status"),
        (name = "Reports", description = "Ato de conciliação e painel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_engine_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/sales", "/api/sales/{id}/status", "/api/payments", "/api/returns/{id}"] {
            assert!(doc.paths.paths.contains_key(path), "{} ausente", path);
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
