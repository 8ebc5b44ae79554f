// src/services/inventory_service.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    models::inventory::{GoodsReceipt, ImportSummary, Product, ProductData, StockCondition, StockDelta},
    services::spreadsheet,
};

/// Resultado de um movimento de estoque guardado.
pub enum StockMove {
    Applied(Product),
    /// O saldo atual não cobre o delta; traz o produto como está.
    Rejected(Product),
}

/// Aplica o delta e, se o UPDATE guardado não pegar nenhuma linha, relê o
/// produto para separar "não existe" de "saldo insuficiente".
pub async fn move_stock(
    repo: &InventoryRepository,
    conn: &mut PgConnection,
    product_id: i64,
    delta: StockDelta,
) -> Result<StockMove, AppError> {
    if let Some(product) = repo.adjust_stock(&mut *conn, product_id, delta).await? {
        tracing::debug!(product_id, healthy = delta.healthy, defective = delta.defective, "Estoque movimentado");
        return Ok(StockMove::Applied(product));
    }

    let current = repo
        .find_product(&mut *conn, product_id)
        .await?
        .ok_or(AppError::NotFound("Produto"))?;
    Ok(StockMove::Rejected(current))
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products().await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, AppError> {
        self.inventory_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn create_product(&self, data: &ProductData) -> Result<Product, AppError> {
        let product = self.inventory_repo.create_product(&self.pool, data).await?;
        tracing::info!(product_id = product.id, name = %product.name, "Produto cadastrado");
        Ok(product)
    }

    pub async fn update_product(&self, id: i64, data: &ProductData) -> Result<Product, AppError> {
        self.inventory_repo
            .update_product(&self.pool, id, data)
            .await?
            .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        if !self.inventory_repo.delete_product(&self.pool, id).await? {
            return Err(AppError::NotFound("Produto"));
        }
        tracing::info!(product_id = id, "Produto removido");
        Ok(())
    }

    // ---
    // Transferência entre condições
    // ---

    pub async fn transfer(
        &self,
        product_id: i64,
        from: StockCondition,
        to: StockCondition,
        quantity: i32,
    ) -> Result<Product, AppError> {
        let delta = StockDelta::transfer(from, to, quantity).ok_or_else(|| {
            AppError::BadRequest("As condições de origem e destino devem ser diferentes.".into())
        })?;

        let mut tx = self.pool.begin().await?;

        let product = match move_stock(&self.inventory_repo, &mut tx, product_id, delta).await? {
            StockMove::Applied(product) => product,
            StockMove::Rejected(product) => {
                return Err(AppError::InsufficientStock {
                    available: product.quantity(from),
                    product: product.name,
                });
            }
        };

        tx.commit().await?;

        tracing::info!(product_id, ?from, ?to, quantity, "Transferência de condição");
        Ok(product)
    }

    // ---
    // Entradas de mercadoria
    // ---

    pub async fn receive_goods(&self, product_id: i64, quantity: i32) -> Result<GoodsReceipt, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Soma ao estoque saudável (delta positivo nunca é rejeitado)
        let delta = StockDelta::of(StockCondition::Healthy, quantity);
        if let StockMove::Rejected(product) =
            move_stock(&self.inventory_repo, &mut tx, product_id, delta).await?
        {
            return Err(AppError::NegativeStock(product.name));
        }

        // 2. Registra a entrada
        let receipt = self.inventory_repo.create_receipt(&mut *tx, product_id, quantity).await?;

        tx.commit().await?;

        tracing::info!(receipt_id = receipt.id, product_id, quantity, "Entrada de mercadoria");
        Ok(receipt)
    }

    pub async fn list_receipts(&self) -> Result<Vec<GoodsReceipt>, AppError> {
        self.inventory_repo.list_receipts().await
    }

    // ---
    // Planilhas
    // ---

    /// Importa (upsert por nome) numa única transação.
    pub async fn import_products(&self, bytes: &[u8]) -> Result<ImportSummary, AppError> {
        let rows = spreadsheet::parse_products(bytes)?;

        let mut tx = self.pool.begin().await?;
        let (mut created, mut updated) = (0u32, 0u32);

        for row in &rows {
            match self.inventory_repo.find_product_by_name_for_update(&mut *tx, &row.name).await? {
                Some(existing) => {
                    self.inventory_repo.update_product(&mut *tx, existing.id, row).await?;
                    updated += 1;
                }
                None => {
                    self.inventory_repo.create_product(&mut *tx, row).await?;
                    created += 1;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(created, updated, "Produtos importados");
        Ok(ImportSummary {
            message: format!("{} produto(s) criado(s), {} atualizado(s).", created, updated),
            created,
            updated,
        })
    }

    pub async fn export_products(&self) -> Result<Vec<u8>, AppError> {
        let products = self.inventory_repo.list_products().await?;
        if products.is_empty() {
            return Err(AppError::NotFound("Produto"));
        }
        spreadsheet::products_csv(&products)
    }
}
