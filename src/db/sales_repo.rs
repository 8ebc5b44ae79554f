// src/db/sales_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{Sale, SaleExportRow, SaleFilter, SaleItem, SaleItemDetail, SaleStatus},
};

// Filtro comum: cliente opcional e intervalo de dias inclusivo.
const FILTER: &str = r#"
    ($1::BIGINT IS NULL OR s.customer_id = $1)
    AND ($2::DATE IS NULL OR s.created_at >= $2::DATE)
    AND ($3::DATE IS NULL OR s.created_at < $3::DATE + 1)
"#;

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        seller_id: Uuid,
        customer_id: i64,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (seller_id, customer_id, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(seller_id)
        .bind(customer_id)
        .bind(SaleStatus::Created)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        sale_id: i64,
        product_id: i64,
        quantity: i32,
        price: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_sale<'e, E>(&self, executor: E, id: i64) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn find_sale_for_update<'e, E>(&self, executor: E, id: i64) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: i64,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("UPDATE sales SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn list_sales<'e, E>(&self, executor: E, filter: &SaleFilter) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT s.* FROM sales s WHERE {FILTER} ORDER BY s.created_at DESC, s.id DESC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(filter.customer)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(executor)
            .await?;
        Ok(sales)
    }

    /// Itens de várias vendas com o nome do produto.
    pub async fn items_for_sales<'e, E>(
        &self,
        executor: E,
        sale_ids: &[i64],
    ) -> Result<Vec<SaleItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.sale_id, si.product_id, p.name AS product_name, si.quantity, si.price
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ANY($1)
            ORDER BY si.sale_id, si.id
            "#,
        )
        .bind(sale_ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn export_rows(&self, filter: &SaleFilter) -> Result<Vec<SaleExportRow>, AppError> {
        let sql = format!(
            r#"
            SELECT s.id AS sale_id, s.created_at, c.full_name AS customer,
                   u.username AS seller, p.name AS product,
                   si.quantity, si.price, s.status
            FROM sales s
            JOIN customers c ON c.id = s.customer_id
            JOIN users u ON u.id = s.seller_id
            JOIN sale_items si ON si.sale_id = s.id
            JOIN products p ON p.id = si.product_id
            WHERE {FILTER}
            ORDER BY s.created_at DESC, s.id DESC, si.id
            "#
        );
        let rows = sqlx::query_as::<_, SaleExportRow>(&sql)
            .bind(filter.customer)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
