// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{GoodsReceipt, Product, ProductData, StockDelta},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Produtos: leitura
    // ---

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: i64) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_many<'e, E>(&self, executor: E, ids: &[i64]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    /// Busca por nome (chave da importação), travando a linha.
    pub async fn find_product_by_name_for_update<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE name = $1 ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    // ---
    // Produtos: escrita
    // ---

    pub async fn create_product<'e, E>(&self, executor: E, data: &ProductData) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (brand, category, name, price, quantity_healthy, quantity_defective)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.brand)
        .bind(&data.category)
        .bind(&data.name)
        .bind(data.price)
        .bind(data.quantity_healthy)
        .bind(data.quantity_defective)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: i64,
        data: &ProductData,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                brand = $2,
                category = $3,
                name = $4,
                price = $5,
                quantity_healthy = $6,
                quantity_defective = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.brand)
        .bind(&data.category)
        .bind(&data.name)
        .bind(data.price)
        .bind(data.quantity_healthy)
        .bind(data.quantity_defective)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                AppError::from_db(
                    e,
                    "O produto possui vendas, entradas ou devoluções e não pode ser removido.",
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Aplica um delta de estoque de forma atômica.
    ///
    /// A condição no `WHERE` impede que qualquer coluna fique negativa: se o
    /// produto não existe ou o saldo não cobre o delta, nenhuma linha volta
    /// e o chamador decide qual erro reportar.
    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        product_id: i64,
        delta: StockDelta,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                quantity_healthy = quantity_healthy + $2,
                quantity_defective = quantity_defective + $3
            WHERE id = $1
              AND quantity_healthy + $2 >= 0
              AND quantity_defective + $3 >= 0
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(delta.healthy)
        .bind(delta.defective)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    // ---
    // Entradas de mercadoria
    // ---

    pub async fn create_receipt<'e, E>(
        &self,
        executor: E,
        product_id: i64,
        quantity: i32,
    ) -> Result<GoodsReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, GoodsReceipt>(
            r#"
            INSERT INTO goods_receipts (product_id, quantity)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(receipt)
    }

    pub async fn list_receipts(&self) -> Result<Vec<GoodsReceipt>, AppError> {
        let receipts = sqlx::query_as::<_, GoodsReceipt>(
            "SELECT * FROM goods_receipts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(receipts)
    }
}
