// src/db/finance_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::finance::Payment};

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        customer_id: i64,
        amount: Decimal,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (customer_id, amount)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn list_payments(&self, customer_id: Option<i64>) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE ($1::BIGINT IS NULL OR customer_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}
