// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route("/export", get(handlers::inventory::export_products))
        .route("/import", post(handlers::inventory::import_products))
        .route(
            "/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/{id}/price", get(handlers::inventory::get_product_price))
        .route("/{id}/transfer", post(handlers::inventory::transfer_condition));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route("/export", get(handlers::crm::export_customers))
        .route("/import", post(handlers::crm::import_customers))
        .route(
            "/{id}",
            get(handlers::crm::get_customer).put(handlers::crm::update_customer),
        )
        .route("/{id}/reconciliation", get(handlers::crm::get_reconciliation))
        .route(
            "/{id}/reconciliation/pdf",
            get(handlers::documents::download_reconciliation_pdf),
        );

    let sale_routes = Router::new()
        .route(
            "/",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/export", get(handlers::sales::export_sales))
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/status", patch(handlers::sales::update_sale_status));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        .route(
            "/{id}",
            get(handlers::auth::get_user)
                .patch(handlers::auth::update_user)
                .delete(handlers::auth::delete_user),
        );

    let return_routes = Router::new()
        .route(
            "/",
            get(handlers::returns::list_returns).post(handlers::returns::create_return),
        )
        .route(
            "/{id}",
            get(handlers::returns::get_return)
                .patch(handlers::returns::update_return)
                .delete(handlers::returns::delete_return),
        );

    // Tudo abaixo exige Bearer
    let protected = Router::new()
        .route("/user", get(handlers::auth::get_me))
        .route("/groups", get(handlers::auth::list_groups))
        .nest("/users", user_routes)
        .nest("/products", product_routes)
        .route(
            "/receipts",
            get(handlers::inventory::list_receipts).post(handlers::inventory::create_receipt),
        )
        .nest("/customers", customer_routes)
        .nest("/sales", sale_routes)
        .route(
            "/payments",
            get(handlers::finance::list_payments).post(handlers::finance::create_payment),
        )
        .nest("/returns", return_routes)
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route(
            "/notifications/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        .route("/dashboard/stats", get(handlers::dashboard::get_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
