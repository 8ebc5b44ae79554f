// src/services/sale_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, validation::max_amount},
    db::{CrmRepository, InventoryRepository, NotificationRepository, SalesRepository, UserRepository},
    models::{
        auth::{Role, UserWithGroups},
        inventory::{StockCondition, StockDelta},
        sales::{
            CreateSalePayload, NotifyTarget, Sale, SaleDetail, SaleFilter, SaleReceipt, SaleStatus,
        },
    },
    services::{
        inventory_service::{move_stock, StockMove},
        spreadsheet,
    },
};

/// Destinatários de uma mudança de status: nunca o próprio autor, sem repetição.
pub fn notification_recipients(candidates: Vec<Uuid>, actor: Uuid) -> Vec<Uuid> {
    let mut recipients: Vec<Uuid> = candidates.into_iter().filter(|id| *id != actor).collect();
    recipients.sort_unstable();
    recipients.dedup();
    recipients
}

#[derive(Clone)]
pub struct SaleService {
    sales_repo: SalesRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
    pool: PgPool,
}

impl SaleService {
    pub fn new(
        sales_repo: SalesRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        user_repo: UserRepository,
        notification_repo: NotificationRepository,
        pool: PgPool,
    ) -> Self {
        Self { sales_repo, inventory_repo, crm_repo, user_repo, notification_repo, pool }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    /// Venda inteira numa transação: baixa de estoque saudável item a item,
    /// gravação das linhas e aumento da dívida do cliente.
    pub async fn create_sale(
        &self,
        seller: &UserWithGroups,
        payload: &CreateSalePayload,
    ) -> Result<SaleReceipt, AppError> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        // 1. Cliente
        let customer = self
            .crm_repo
            .find_customer(&mut *tx, payload.customer)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        // 2. Cabeçalho (status inicial: yaratildi)
        let sale = self.sales_repo.create_sale(&mut *tx, seller.user.id, payload.customer).await?;

        // 3. Itens
        let mut items = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let delta = StockDelta::of(StockCondition::Healthy, -item.quantity);
            if let StockMove::Rejected(product) =
                move_stock(&self.inventory_repo, &mut tx, item.product, delta).await?
            {
                return Err(AppError::InsufficientStock {
                    available: product.quantity_healthy,
                    product: product.name,
                });
            }

            let line = self
                .sales_repo
                .add_item(&mut *tx, sale.id, item.product, item.quantity, item.price)
                .await?;
            items.push(line);
        }

        // 4. Dívida
        let total: Decimal = items.iter().map(|i| i.line_total()).sum();
        if customer.debt + total > max_amount() {
            return Err(AppError::BadRequest(format!(
                "A dívida do cliente não pode passar de {}.",
                max_amount()
            )));
        }
        self.crm_repo
            .increase_debt(&mut *tx, payload.customer, total)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        tx.commit().await?;

        tracing::info!(
            sale_id = sale.id,
            customer_id = payload.customer,
            seller = %seller.user.username,
            %total,
            "Venda criada"
        );

        Ok(SaleReceipt { sale, seller: seller.user.username.clone(), items, total })
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<SaleDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sales = self.sales_repo.list_sales(&mut *conn, filter).await?;
        self.with_details(&mut conn, sales).await
    }

    pub async fn get_sale(&self, id: i64) -> Result<SaleDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sale = self
            .sales_repo
            .find_sale(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound("Venda"))?;

        self.with_details(&mut conn, vec![sale])
            .await?
            .pop()
            .ok_or(AppError::NotFound("Venda"))
    }

    /// Resolve cliente, vendedor e itens de várias vendas com três consultas.
    async fn with_details(&self, conn: &mut PgConnection, sales: Vec<Sale>) -> Result<Vec<SaleDetail>, AppError> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let sale_ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
        let mut customer_ids: Vec<i64> = sales.iter().map(|s| s.customer_id).collect();
        customer_ids.sort_unstable();
        customer_ids.dedup();
        let mut seller_ids: Vec<Uuid> = sales.iter().map(|s| s.seller_id).collect();
        seller_ids.sort_unstable();
        seller_ids.dedup();

        let customers: HashMap<_, _> = self
            .crm_repo
            .find_many(&mut *conn, &customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let sellers: HashMap<_, _> = self
            .user_repo
            .find_many(&mut *conn, &seller_ids)
            .await?
            .into_iter()
            .map(|u| (u.user.id, u))
            .collect();

        let mut items_by_sale: HashMap<i64, Vec<_>> = HashMap::new();
        for item in self.sales_repo.items_for_sales(&mut *conn, &sale_ids).await? {
            items_by_sale.entry(item.sale_id).or_default().push(item);
        }

        sales
            .into_iter()
            .map(|sale| {
                let customer = customers.get(&sale.customer_id).cloned().ok_or(AppError::NotFound("Cliente"))?;
                let seller = sellers.get(&sale.seller_id).cloned().ok_or(AppError::UserNotFound)?;
                let items = items_by_sale.remove(&sale.id).unwrap_or_default();
                let total = items.iter().map(|i| i.line_total()).sum();
                Ok(SaleDetail {
                    id: sale.id,
                    status: sale.status,
                    created_at: sale.created_at,
                    customer,
                    seller,
                    items,
                    total,
                })
            })
            .collect()
    }

    pub async fn export_sales(&self, filter: &SaleFilter) -> Result<Vec<u8>, AppError> {
        let rows = self.sales_repo.export_rows(filter).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound("Venda"));
        }
        spreadsheet::sales_csv(&rows)
    }

    // =========================================================================
    //  STATUS
    // =========================================================================

    /// Troca o status (sem grafo de transições) e notifica a outra ponta.
    pub async fn update_status(
        &self,
        id: i64,
        status: SaleStatus,
        actor: &UserWithGroups,
    ) -> Result<SaleDetail, AppError> {
        // 1. O papel do autor precisa permitir o novo valor
        if !status.can_be_set_by(actor) {
            return Err(AppError::Forbidden(format!(
                "Seu perfil não pode definir o status '{}'.",
                status.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales_repo
            .find_sale_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Venda"))?;

        // 2. Mesmo valor: nada muda, ninguém é notificado
        if sale.status != status {
            self.sales_repo.update_status(&mut *tx, id, status).await?;

            // 3. Notificações na mesma transação
            let candidates = match status.notify_target() {
                Some(NotifyTarget::WarehouseGroup) => {
                    self.user_repo.member_ids(&mut *tx, Role::Warehouse.group_name()).await?
                }
                Some(NotifyTarget::Seller) => vec![sale.seller_id],
                None => Vec::new(),
            };
            let recipients = notification_recipients(candidates, actor.user.id);

            if !recipients.is_empty() {
                let message = format!("Chek #{}: {}", id, status.label());
                let sent = self
                    .notification_repo
                    .create_many(&mut *tx, &recipients, id, status, &message)
                    .await?;
                tracing::info!(sale_id = id, sent, "Notificações enfileiradas");
            }

            tracing::info!(
                sale_id = id,
                from = sale.status.as_str(),
                to = status.as_str(),
                actor = %actor.user.username,
                "Status da venda alterado"
            );
        }

        tx.commit().await?;

        self.get_sale(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_is_never_notified() {
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();
        let recipients = notification_recipients(vec![actor, other, other], actor);
        assert_eq!(recipients, vec![other]);
    }

    #[test]
    fn seller_changing_own_sale_notifies_nobody() {
        let seller = Uuid::new_v4();
        assert!(notification_recipients(vec![seller], seller).is_empty());
    }
}
