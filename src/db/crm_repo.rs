// src/db/crm_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::crm::Customer};

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY full_name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn find_customer<'e, E>(&self, executor: E, id: i64) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn find_many<'e, E>(&self, executor: E, ids: &[i64]) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(customers)
    }

    pub async fn find_by_full_name_for_update<'e, E>(
        &self,
        executor: E,
        full_name: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE full_name = $1 ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(full_name)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        full_name: &str,
        phone_number: &str,
        address: &str,
        debt: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (full_name, phone_number, address, debt)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(phone_number)
        .bind(address)
        .bind(debt)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Atualiza apenas os dados de contato; a dívida não é editável por aqui.
    pub async fn update_contact<'e, E>(
        &self,
        executor: E,
        id: i64,
        full_name: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET full_name = $2, phone_number = $3, address = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(phone_number)
        .bind(address)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Usado pela importação de planilha: sobrescreve contato e dívida.
    pub async fn overwrite_from_import<'e, E>(
        &self,
        executor: E,
        id: i64,
        phone_number: &str,
        address: &str,
        debt: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET phone_number = $2, address = $3, debt = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(phone_number)
        .bind(address)
        .bind(debt)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn increase_debt<'e, E>(
        &self,
        executor: E,
        id: i64,
        amount: Decimal,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET debt = debt + $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Abate a dívida só se ela cobrir o valor. `None` = cliente inexistente ou dívida menor.
    pub async fn decrease_debt_guarded<'e, E>(
        &self,
        executor: E,
        id: i64,
        amount: Decimal,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET debt = debt - $2
            WHERE id = $1 AND debt >= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }
}
