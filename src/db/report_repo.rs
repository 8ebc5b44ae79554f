// src/db/report_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        finance::Payment,
        reports::{SaleTotalRow, SellerSales, TopProduct},
        sales::SaleFilter,
    },
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONCILIAÇÃO (um cliente)
    // =========================================================================

    /// Soma dos cheques do cliente estritamente antes de `before`.
    pub async fn sales_total_before<'e, E>(
        &self,
        executor: E,
        customer_id: i64,
        before: NaiveDate,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.price * si.quantity), 0)
            FROM sales s
            JOIN sale_items si ON si.sale_id = s.id
            WHERE s.customer_id = $1 AND s.created_at < $2::DATE
            "#,
        )
        .bind(customer_id)
        .bind(before)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn payments_total_before<'e, E>(
        &self,
        executor: E,
        customer_id: i64,
        before: NaiveDate,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM payments
            WHERE customer_id = $1 AND created_at < $2::DATE
            "#,
        )
        .bind(customer_id)
        .bind(before)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    /// Cheques do período `[start, end + 1 dia)` com seus totais.
    pub async fn sale_totals_between<'e, E>(
        &self,
        executor: E,
        customer_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, SaleTotalRow>(
            r#"
            SELECT s.id, s.created_at, COALESCE(SUM(si.price * si.quantity), 0) AS total
            FROM sales s
            LEFT JOIN sale_items si ON si.sale_id = s.id
            WHERE s.customer_id = $1
              AND s.created_at >= $2::DATE
              AND s.created_at < $3::DATE + 1
            GROUP BY s.id, s.created_at
            ORDER BY s.created_at, s.id
            "#,
        )
        .bind(customer_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn payments_between<'e, E>(
        &self,
        executor: E,
        customer_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE customer_id = $1
              AND created_at >= $2::DATE
              AND created_at < $3::DATE + 1
            ORDER BY created_at, id
            "#,
        )
        .bind(customer_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    /// (valor total vendido, quantidade de cheques) para o filtro.
    pub async fn sales_summary(&self, filter: &SaleFilter) -> Result<(Decimal, i64), AppError> {
        let row: (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE((
                    SELECT SUM(si.price * si.quantity)
                    FROM sale_items si
                    JOIN sales s ON s.id = si.sale_id
                    WHERE ($1::BIGINT IS NULL OR s.customer_id = $1)
                      AND ($2::DATE IS NULL OR s.created_at >= $2::DATE)
                      AND ($3::DATE IS NULL OR s.created_at < $3::DATE + 1)
                ), 0),
                (
                    SELECT COUNT(*)
                    FROM sales s
                    WHERE ($1::BIGINT IS NULL OR s.customer_id = $1)
                      AND ($2::DATE IS NULL OR s.created_at >= $2::DATE)
                      AND ($3::DATE IS NULL OR s.created_at < $3::DATE + 1)
                )
            "#,
        )
        .bind(filter.customer)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn payments_total(&self, filter: &SaleFilter) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.amount), 0)
            FROM payments p
            WHERE ($1::BIGINT IS NULL OR p.customer_id = $1)
              AND ($2::DATE IS NULL OR p.created_at >= $2::DATE)
              AND ($3::DATE IS NULL OR p.created_at < $3::DATE + 1)
            "#,
        )
        .bind(filter.customer)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn sales_by_seller(&self, filter: &SaleFilter) -> Result<Vec<SellerSales>, AppError> {
        let rows = sqlx::query_as::<_, SellerSales>(
            r#"
            SELECT u.username,
                   COALESCE(SUM(si.price * si.quantity), 0) AS total_amount,
                   COUNT(DISTINCT s.id) AS sales_count
            FROM sales s
            JOIN users u ON u.id = s.seller_id
            LEFT JOIN sale_items si ON si.sale_id = s.id
            WHERE ($1::BIGINT IS NULL OR s.customer_id = $1)
              AND ($2::DATE IS NULL OR s.created_at >= $2::DATE)
              AND ($3::DATE IS NULL OR s.created_at < $3::DATE + 1)
            GROUP BY u.id, u.username
            ORDER BY total_amount DESC, u.username
            "#,
        )
        .bind(filter.customer)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn top_products(&self, filter: &SaleFilter, limit: i64) -> Result<Vec<TopProduct>, AppError> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.name, SUM(si.quantity)::BIGINT AS total_sold
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE ($1::BIGINT IS NULL OR s.customer_id = $1)
              AND ($2::DATE IS NULL OR s.created_at >= $2::DATE)
              AND ($3::DATE IS NULL OR s.created_at < $3::DATE + 1)
            GROUP BY p.id, p.name
            ORDER BY total_sold DESC, p.name
            LIMIT $4
            "#,
        )
        .bind(filter.customer)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Indicadores globais: dívida total, nº de clientes, nº de produtos.
    pub async fn global_totals(&self) -> Result<(Decimal, i64, i64), AppError> {
        let row: (Decimal, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COALESCE(SUM(debt), 0) FROM customers),
                (SELECT COUNT(*) FROM customers),
                (SELECT COUNT(*) FROM products)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
