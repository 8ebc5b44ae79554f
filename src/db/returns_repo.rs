// src/db/returns_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{inventory::StockCondition, returns::ReturnedProduct},
};

/// Campos gravados de uma devolução (criação e edição).
#[derive(Debug, Clone)]
pub struct ReturnRecord<'a> {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub condition: StockCondition,
    pub reason: &'a str,
    pub returned_at: NaiveDate,
}

#[derive(Clone)]
pub struct ReturnsRepository {
    pool: PgPool,
}

impl ReturnsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_returns(&self) -> Result<Vec<ReturnedProduct>, AppError> {
        let returns = sqlx::query_as::<_, ReturnedProduct>(
            "SELECT * FROM returned_products ORDER BY returned_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(returns)
    }

    pub async fn find_return<'e, E>(&self, executor: E, id: i64) -> Result<Option<ReturnedProduct>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, ReturnedProduct>("SELECT * FROM returned_products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn find_return_for_update<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<Option<ReturnedProduct>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, ReturnedProduct>(
            "SELECT * FROM returned_products WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn create_return<'e, E>(
        &self,
        executor: E,
        record: &ReturnRecord<'_>,
        recorded_by: Uuid,
    ) -> Result<ReturnedProduct, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ReturnedProduct>(
            r#"
            INSERT INTO returned_products
                (customer_id, product_id, quantity, condition, reason, returned_at, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(record.customer_id)
        .bind(record.product_id)
        .bind(record.quantity)
        .bind(record.condition)
        .bind(record.reason)
        .bind(record.returned_at)
        .bind(recorded_by)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Cliente ou produto inexistente."))
    }

    pub async fn update_return<'e, E>(
        &self,
        executor: E,
        id: i64,
        record: &ReturnRecord<'_>,
    ) -> Result<ReturnedProduct, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ReturnedProduct>(
            r#"
            UPDATE returned_products SET
                customer_id = $2,
                product_id = $3,
                quantity = $4,
                condition = $5,
                reason = $6,
                returned_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.customer_id)
        .bind(record.product_id)
        .bind(record.quantity)
        .bind(record.condition)
        .bind(record.reason)
        .bind(record.returned_at)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Cliente ou produto inexistente."))
    }

    pub async fn delete_return<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM returned_products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
