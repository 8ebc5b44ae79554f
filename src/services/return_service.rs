// src/services/return_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{returns_repo::ReturnRecord, CrmRepository, InventoryRepository, ReturnsRepository, UserRepository},
    models::{
        auth::{User, UserWithGroups},
        crm::Customer,
        inventory::{Product, StockCondition},
        returns::{rebalance, ReturnEffect, ReturnedProduct, ReturnedProductDetail},
    },
    services::inventory_service::{move_stock, StockMove},
};

/// Alteração parcial de uma devolução: `None` mantém o valor gravado.
#[derive(Debug, Default, Clone)]
pub struct ReturnChanges {
    pub customer: Option<i64>,
    pub product: Option<i64>,
    pub quantity: Option<i32>,
    pub condition: Option<StockCondition>,
    pub reason: Option<String>,
    pub returned_at: Option<NaiveDate>,
}

/// Junta cada devolução aos seus registros relacionados.
/// O autor pode ter sido removido (`ON DELETE SET NULL`).
fn join_details(
    records: Vec<ReturnedProduct>,
    customers: &HashMap<i64, Customer>,
    products: &HashMap<i64, Product>,
    users: &HashMap<Uuid, User>,
) -> Result<Vec<ReturnedProductDetail>, AppError> {
    records
        .into_iter()
        .map(|record| {
            let customer_detail = customers.get(&record.customer_id).cloned().ok_or(AppError::NotFound("Cliente"))?;
            let product_detail = products.get(&record.product_id).cloned().ok_or(AppError::NotFound("Produto"))?;
            let recorded_by_detail = record.recorded_by.and_then(|id| users.get(&id).cloned());
            Ok(ReturnedProductDetail { record, customer_detail, product_detail, recorded_by_detail })
        })
        .collect()
}

#[derive(Clone)]
pub struct ReturnService {
    returns_repo: ReturnsRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ReturnService {
    pub fn new(
        returns_repo: ReturnsRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { returns_repo, inventory_repo, crm_repo, user_repo, pool }
    }

    /// Aplica o plano de rebalanceamento; qualquer saldo negativo aborta.
    async fn apply_plan(
        &self,
        conn: &mut PgConnection,
        old: Option<ReturnEffect>,
        new: Option<ReturnEffect>,
    ) -> Result<(), AppError> {
        for (product_id, delta) in rebalance(old, new) {
            if let StockMove::Rejected(product) =
                move_stock(&self.inventory_repo, &mut *conn, product_id, delta).await?
            {
                return Err(AppError::NegativeStock(format!(
                    "'{}' (saudável: {}, defeituoso: {})",
                    product.name, product.quantity_healthy, product.quantity_defective
                )));
            }
        }
        Ok(())
    }

    /// Cliente e produto precisam existir antes de gravar a devolução.
    async fn ensure_references(&self, conn: &mut PgConnection, customer_id: i64, product_id: i64) -> Result<(), AppError> {
        self.crm_repo
            .find_customer(&mut *conn, customer_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;
        self.inventory_repo
            .find_product(&mut *conn, product_id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;
        Ok(())
    }

    /// Carrega clientes, produtos e autores em lote (três consultas no total).
    async fn with_details(
        &self,
        conn: &mut PgConnection,
        records: Vec<ReturnedProduct>,
    ) -> Result<Vec<ReturnedProductDetail>, AppError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut customer_ids: Vec<i64> = records.iter().map(|r| r.customer_id).collect();
        customer_ids.sort_unstable();
        customer_ids.dedup();
        let mut product_ids: Vec<i64> = records.iter().map(|r| r.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let mut user_ids: Vec<Uuid> = records.iter().filter_map(|r| r.recorded_by).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let customers: HashMap<_, _> = self
            .crm_repo
            .find_many(&mut *conn, &customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let products: HashMap<_, _> = self
            .inventory_repo
            .find_many(&mut *conn, &product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let users: HashMap<_, _> = self
            .user_repo
            .find_users(&mut *conn, &user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        join_details(records, &customers, &products, &users)
    }

    async fn detail(&self, conn: &mut PgConnection, record: ReturnedProduct) -> Result<ReturnedProductDetail, AppError> {
        self.with_details(conn, vec![record])
            .await?
            .pop()
            .ok_or(AppError::NotFound("Devolução"))
    }

    pub async fn list_returns(&self) -> Result<Vec<ReturnedProductDetail>, AppError> {
        let records = self.returns_repo.list_returns().await?;
        let mut conn = self.pool.acquire().await?;
        self.with_details(&mut conn, records).await
    }

    pub async fn get_return(&self, id: i64) -> Result<ReturnedProductDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let record = self
            .returns_repo
            .find_return(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound("Devolução"))?;
        self.detail(&mut conn, record).await
    }

    pub async fn create_return(
        &self,
        record: &ReturnRecord<'_>,
        actor: &UserWithGroups,
    ) -> Result<ReturnedProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Registro
        self.ensure_references(&mut tx, record.customer_id, record.product_id).await?;
        let created = self.returns_repo.create_return(&mut *tx, record, actor.user.id).await?;

        // 2. Estoque da condição devolvida
        self.apply_plan(&mut tx, None, Some(created.effect())).await?;

        let detail = self.detail(&mut tx, created).await?;
        tx.commit().await?;

        tracing::info!(
            return_id = detail.record.id,
            product_id = detail.record.product_id,
            quantity = detail.record.quantity,
            condition = ?detail.record.condition,
            "Devolução registrada"
        );
        Ok(detail)
    }

    pub async fn update_return(&self, id: i64, changes: &ReturnChanges) -> Result<ReturnedProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Estado atual travado
        let current = self
            .returns_repo
            .find_return_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Devolução"))?;

        // 2. Mescla as alterações
        let merged = ReturnRecord {
            customer_id: changes.customer.unwrap_or(current.customer_id),
            product_id: changes.product.unwrap_or(current.product_id),
            quantity: changes.quantity.unwrap_or(current.quantity),
            condition: changes.condition.unwrap_or(current.condition),
            reason: changes.reason.as_deref().unwrap_or(&current.reason),
            returned_at: changes.returned_at.unwrap_or(current.returned_at),
        };
        self.ensure_references(&mut tx, merged.customer_id, merged.product_id).await?;
        let updated = self.returns_repo.update_return(&mut *tx, id, &merged).await?;

        // 3. Reverte o efeito antigo e aplica o novo (delta líquido)
        self.apply_plan(&mut tx, Some(current.effect()), Some(updated.effect())).await?;

        let detail = self.detail(&mut tx, updated).await?;
        tx.commit().await?;

        tracing::info!(return_id = id, "Devolução atualizada");
        Ok(detail)
    }

    pub async fn delete_return(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .returns_repo
            .find_return_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Devolução"))?;

        self.apply_plan(&mut tx, Some(current.effect()), None).await?;
        self.returns_repo.delete_return(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(return_id = id, "Devolução removida");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn record(id: i64, customer_id: i64, product_id: i64, recorded_by: Option<Uuid>) -> ReturnedProduct {
        ReturnedProduct {
            id,
            customer_id,
            product_id,
            quantity: 1,
            condition: StockCondition::Defective,
            reason: String::new(),
            returned_at: Utc::now().date_naive(),
            recorded_by,
            created_at: Utc::now(),
        }
    }

    fn customer(id: i64) -> Customer {
        Customer {
            id,
            full_name: format!("Cliente {}", id),
            phone_number: "1".into(),
            address: String::new(),
            debt: Decimal::ZERO,
        }
    }

    fn product(id: i64) -> Product {
        Product {
            id,
            brand: String::new(),
            category: String::new(),
            name: format!("Produto {}", id),
            price: Decimal::ONE,
            quantity_healthy: 0,
            quantity_defective: 0,
        }
    }

    #[test]
    fn details_are_joined_from_the_batches() {
        let customers = HashMap::from([(1, customer(1)), (2, customer(2))]);
        let products = HashMap::from([(10, product(10))]);
        let gone = Uuid::new_v4();

        let details = join_details(
            vec![record(1, 2, 10, None), record(2, 1, 10, Some(gone))],
            &customers,
            &products,
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].customer_detail.full_name, "Cliente 2");
        assert_eq!(details[1].customer_detail.id, 1);
        assert_eq!(details[1].product_detail.name, "Produto 10");
        // Autor removido: o registro continua, sem detalhe
        assert!(details[1].recorded_by_detail.is_none());
    }

    #[test]
    fn missing_product_is_reported() {
        let customers = HashMap::from([(1, customer(1))]);
        let err = join_details(vec![record(1, 1, 99, None)], &customers, &HashMap::new(), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Produto")));
    }
}
