// Regras de estoque, dívida e status contra um Postgres real.
// Rodam só com DATABASE_URL definida; cada teste cria os próprios registros.

use std::{path::PathBuf, str::FromStr};

use chrono::{Days, Utc};
use ombor_backend::{
    common::error::AppError,
    config::{AppState, Config},
    db::returns_repo::ReturnRecord,
    models::{
        auth::{CreateUserPayload, UserWithGroups},
        crm::Customer,
        inventory::{Product, ProductData, StockCondition},
        sales::{CreateSalePayload, SaleFilter, SaleItemPayload, SaleStatus},
    },
    services::return_service::ReturnChanges,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn state() -> Option<AppState> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida, teste ignorado");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("conexão com o banco de teste");
    sqlx::migrate!().run(&pool).await.expect("migrações");

    let config = Config {
        database_url,
        jwt_secret: "segredo-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 5,
        jwt_ttl_hours: 1,
        fonts_dir: PathBuf::from("./fonts"),
        bootstrap_admin: None,
    };
    Some(AppState::from_parts(config, pool))
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn product(state: &AppState, price: &str, healthy: i32, defective: i32) -> Product {
    let data = ProductData {
        brand: "Artel".into(),
        category: "Eshik".into(),
        name: unique("produto"),
        price: dec(price),
        quantity_healthy: healthy,
        quantity_defective: defective,
    };
    state.inventory_service.create_product(&data).await.expect("produto")
}

async fn customer(state: &AppState) -> Customer {
    state
        .crm_service
        .create_customer(&unique("cliente"), "+998900000000", "Toshkent")
        .await
        .expect("cliente")
}

async fn user_in(state: &AppState, group: &str) -> UserWithGroups {
    let groups = state.user_service.list_groups().await.expect("grupos");
    let group_id = groups.iter().find(|g| g.name == group).expect("grupo semeado").id;
    let payload = CreateUserPayload {
        username: unique("usuario"),
        password: "segredo123".into(),
        email: None,
        first_name: String::new(),
        last_name: String::new(),
        is_staff: false,
        groups: vec![group_id],
    };
    state.user_service.create_user(&payload).await.expect("usuário")
}

fn item(product: &Product, quantity: i32, price: &str) -> SaleItemPayload {
    SaleItemPayload { product: product.id, quantity, price: dec(price) }
}

#[tokio::test]
async fn sale_rolls_back_when_a_later_item_is_short() {
    let Some(state) = state().await else { return };
    let seller = user_in(&state, "Sotuvchilar").await;
    let client = customer(&state).await;
    let plenty = product(&state, "10.00", 5, 0).await;
    let scarce = product(&state, "20.00", 1, 4).await;

    let payload = CreateSalePayload {
        customer: client.id,
        items: vec![item(&plenty, 2, "10.50"), item(&scarce, 3, "20.00")],
    };
    let err = state.sale_service.create_sale(&seller, &payload).await.err().expect("estoque insuficiente");
    match err {
        AppError::InsufficientStock { product, available } => {
            assert_eq!(product, scarce.name);
            assert_eq!(available, 1);
        }
        other => panic!("erro inesperado: {:?}", other),
    }

    // Nada da venda ficou: estoque, dívida e cabeçalho
    let plenty_now = state.inventory_service.get_product(plenty.id).await.unwrap();
    assert_eq!(plenty_now.quantity_healthy, 5);
    let scarce_now = state.inventory_service.get_product(scarce.id).await.unwrap();
    assert_eq!((scarce_now.quantity_healthy, scarce_now.quantity_defective), (1, 4));
    assert_eq!(state.crm_service.get_customer(client.id).await.unwrap().debt, Decimal::ZERO);
    let filter = SaleFilter { customer: Some(client.id), ..Default::default() };
    assert!(state.sale_service.list_sales(&filter).await.unwrap().is_empty());

    // A mesma venda sem o item em falta passa inteira
    let payload = CreateSalePayload { customer: client.id, items: vec![item(&plenty, 2, "10.50")] };
    let receipt = state.sale_service.create_sale(&seller, &payload).await.unwrap();
    assert_eq!(receipt.total, dec("21.00"));
    assert_eq!(receipt.items[0].price, dec("10.50"));
    assert_eq!(state.inventory_service.get_product(plenty.id).await.unwrap().quantity_healthy, 3);
    assert_eq!(state.crm_service.get_customer(client.id).await.unwrap().debt, dec("21.00"));
}

#[tokio::test]
async fn payments_never_exceed_debt_and_keep_the_statement_in_step() {
    let Some(state) = state().await else { return };
    let seller = user_in(&state, "Sotuvchilar").await;
    let client = customer(&state).await;
    let door = product(&state, "100.00", 3, 0).await;

    let payload = CreateSalePayload { customer: client.id, items: vec![item(&door, 1, "100.00")] };
    state.sale_service.create_sale(&seller, &payload).await.unwrap();

    let err = state.finance_service.register_payment(client.id, dec("150.00")).await.err().unwrap();
    assert!(matches!(err, AppError::PaymentExceedsDebt { debt, .. } if debt == dec("100.00")));

    // Menos de um centavo seria arredondado pela coluna
    let err = state.finance_service.register_payment(client.id, dec("0.005")).await.err().unwrap();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(state.crm_service.get_customer(client.id).await.unwrap().debt, dec("100.00"));

    let err = state.finance_service.register_payment(i64::MAX, dec("1.00")).await.err().unwrap();
    assert!(matches!(err, AppError::NotFound("Cliente")));

    state.finance_service.register_payment(client.id, dec("40.00")).await.unwrap();
    let debt = state.crm_service.get_customer(client.id).await.unwrap().debt;
    assert_eq!(debt, dec("60.00"));

    let today = Utc::now().date_naive();
    let report = state
        .report_service
        .reconciliation(client.id, today.checked_sub_days(Days::new(1)), today.checked_add_days(Days::new(1)))
        .await
        .unwrap();
    assert_eq!(report.ending_balance, debt);
    assert_eq!(report.total_debit, dec("100.00"));
    assert_eq!(report.total_credit, dec("40.00"));
}

#[tokio::test]
async fn receipts_and_transfers_move_the_right_column() {
    let Some(state) = state().await else { return };
    let panel = product(&state, "55.00", 2, 0).await;

    state.inventory_service.receive_goods(panel.id, 5).await.unwrap();
    assert_eq!(state.inventory_service.get_product(panel.id).await.unwrap().quantity_healthy, 7);

    let moved = state
        .inventory_service
        .transfer(panel.id, StockCondition::Healthy, StockCondition::Defective, 3)
        .await
        .unwrap();
    assert_eq!((moved.quantity_healthy, moved.quantity_defective), (4, 3));

    let err = state
        .inventory_service
        .transfer(panel.id, StockCondition::Defective, StockCondition::Healthy, 10)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::InsufficientStock { available: 3, .. }));
    let unchanged = state.inventory_service.get_product(panel.id).await.unwrap();
    assert_eq!((unchanged.quantity_healthy, unchanged.quantity_defective), (4, 3));

    let err = state.inventory_service.receive_goods(i64::MAX, 1).await.err().unwrap();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn returns_rebalance_stock_and_refuse_consumed_quantities() {
    let Some(state) = state().await else { return };
    let keeper = user_in(&state, "Omborchilar").await;
    let client = customer(&state).await;
    let lock = product(&state, "15.00", 0, 0).await;
    let today = Utc::now().date_naive();

    let record = ReturnRecord {
        customer_id: client.id,
        product_id: lock.id,
        quantity: 3,
        condition: StockCondition::Healthy,
        reason: "Tirnalgan",
        returned_at: today,
    };
    let created = state.return_service.create_return(&record, &keeper).await.unwrap();
    assert_eq!(created.product_detail.quantity_healthy, 3);

    // 3 saudáveis viram 2 defeituosos
    let changes = ReturnChanges {
        quantity: Some(2),
        condition: Some(StockCondition::Defective),
        ..Default::default()
    };
    let updated = state.return_service.update_return(created.record.id, &changes).await.unwrap();
    assert_eq!((updated.product_detail.quantity_healthy, updated.product_detail.quantity_defective), (0, 2));

    // Os defeituosos foram consumidos: desfazer a devolução não cabe mais
    state
        .inventory_service
        .transfer(lock.id, StockCondition::Defective, StockCondition::Healthy, 2)
        .await
        .unwrap();

    let err = state.return_service.delete_return(created.record.id).await.err().unwrap();
    assert!(matches!(err, AppError::NegativeStock(_)));

    let back_to_healthy = ReturnChanges { condition: Some(StockCondition::Healthy), ..Default::default() };
    let err = state
        .return_service
        .update_return(created.record.id, &back_to_healthy)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::NegativeStock(_)));

    let kept = state.return_service.get_return(created.record.id).await.unwrap();
    assert_eq!((kept.record.quantity, kept.record.condition), (2, StockCondition::Defective));
    assert_eq!((kept.product_detail.quantity_healthy, kept.product_detail.quantity_defective), (2, 0));

    // A listagem traz os detalhes já resolvidos
    let listed = state.return_service.list_returns().await.unwrap();
    let row = listed.iter().find(|r| r.record.id == created.record.id).expect("devolução listada");
    assert_eq!(row.customer_detail.id, client.id);
    assert_eq!(row.recorded_by_detail.as_ref().map(|u| u.id), Some(keeper.user.id));
}

#[tokio::test]
async fn returns_with_missing_references_are_not_found() {
    let Some(state) = state().await else { return };
    let keeper = user_in(&state, "Omborchilar").await;
    let client = customer(&state).await;
    let hinge = product(&state, "3.00", 0, 0).await;

    let mut record = ReturnRecord {
        customer_id: i64::MAX,
        product_id: hinge.id,
        quantity: 1,
        condition: StockCondition::Healthy,
        reason: "",
        returned_at: Utc::now().date_naive(),
    };
    let err = state.return_service.create_return(&record, &keeper).await.err().unwrap();
    assert!(matches!(err, AppError::NotFound("Cliente")));

    record.customer_id = client.id;
    record.product_id = i64::MAX;
    let err = state.return_service.create_return(&record, &keeper).await.err().unwrap();
    assert!(matches!(err, AppError::NotFound("Produto")));

    record.product_id = hinge.id;
    let created = state.return_service.create_return(&record, &keeper).await.unwrap();
    let changes = ReturnChanges { product: Some(i64::MAX), ..Default::default() };
    let err = state.return_service.update_return(created.record.id, &changes).await.err().unwrap();
    assert!(matches!(err, AppError::NotFound("Produto")));
    assert_eq!(state.inventory_service.get_product(hinge.id).await.unwrap().quantity_healthy, 1);
}

#[tokio::test]
async fn status_changes_notify_the_other_side() {
    let Some(state) = state().await else { return };
    let seller = user_in(&state, "Sotuvchilar").await;
    let first_keeper = user_in(&state, "Omborchilar").await;
    let second_keeper = user_in(&state, "Omborchilar").await;
    let client = customer(&state).await;
    let frame = product(&state, "80.00", 2, 0).await;

    let payload = CreateSalePayload { customer: client.id, items: vec![item(&frame, 1, "80.00")] };
    let sale_id = state.sale_service.create_sale(&seller, &payload).await.unwrap().sale.id;

    // Vendedor manda para o depósito: todos do depósito são avisados
    state.sale_service.update_status(sale_id, SaleStatus::SentToWarehouse, &seller).await.unwrap();
    for keeper in [&first_keeper, &second_keeper] {
        let inbox = state.notification_service.list_for(keeper, true).await.unwrap();
        assert!(inbox.iter().any(|n| n.sale_id == sale_id && n.status == SaleStatus::SentToWarehouse));
    }
    assert!(state.notification_service.list_for(&seller, false).await.unwrap().is_empty());

    // Depósito não cancela pedido
    let err = state
        .sale_service
        .update_status(sale_id, SaleStatus::OrderCancelled, &first_keeper)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Depósito monta: só o vendedor é avisado, nunca o autor
    let detail = state.sale_service.update_status(sale_id, SaleStatus::Assembled, &first_keeper).await.unwrap();
    assert_eq!(detail.status, SaleStatus::Assembled);
    let seller_inbox = state.notification_service.list_for(&seller, true).await.unwrap();
    assert_eq!(seller_inbox.len(), 1);
    assert_eq!(seller_inbox[0].status, SaleStatus::Assembled);
    let own = state.notification_service.list_for(&first_keeper, false).await.unwrap();
    assert!(own.iter().all(|n| n.status != SaleStatus::Assembled));

    // Mesmo status de novo: ninguém é avisado
    state.sale_service.update_status(sale_id, SaleStatus::Assembled, &first_keeper).await.unwrap();
    assert_eq!(state.notification_service.list_for(&seller, false).await.unwrap().len(), 1);
}
