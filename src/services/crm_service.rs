// src/services/crm_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::{crm::Customer, inventory::ImportSummary},
    services::spreadsheet,
};

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl CrmService {
    pub fn new(crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { crm_repo, pool }
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.crm_repo.list_customers().await
    }

    pub async fn get_customer(&self, id: i64) -> Result<Customer, AppError> {
        self.crm_repo
            .find_customer(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    /// Cliente novo começa sem dívida.
    pub async fn create_customer(
        &self,
        full_name: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<Customer, AppError> {
        let customer = self
            .crm_repo
            .create_customer(&self.pool, full_name, phone_number, address, Decimal::ZERO)
            .await?;
        tracing::info!(customer_id = customer.id, "Cliente cadastrado");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        id: i64,
        full_name: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<Customer, AppError> {
        self.crm_repo
            .update_contact(&self.pool, id, full_name, phone_number, address)
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    /// Upsert por nome completo; a dívida da planilha substitui a atual.
    pub async fn import_customers(&self, bytes: &[u8]) -> Result<ImportSummary, AppError> {
        let rows = spreadsheet::parse_customers(bytes)?;

        let mut tx = self.pool.begin().await?;
        let (mut created, mut updated) = (0u32, 0u32);

        for row in &rows {
            match self.crm_repo.find_by_full_name_for_update(&mut *tx, &row.full_name).await? {
                Some(existing) => {
                    self.crm_repo
                        .overwrite_from_import(&mut *tx, existing.id, &row.phone_number, &row.address, row.debt)
                        .await?;
                    updated += 1;
                }
                None => {
                    self.crm_repo
                        .create_customer(&mut *tx, &row.full_name, &row.phone_number, &row.address, row.debt)
                        .await?;
                    created += 1;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(created, updated, "Clientes importados");
        Ok(ImportSummary {
            message: format!("{} cliente(s) criado(s), {} atualizado(s).", created, updated),
            created,
            updated,
        })
    }

    pub async fn export_customers(&self) -> Result<Vec<u8>, AppError> {
        let customers = self.crm_repo.list_customers().await?;
        if customers.is_empty() {
            return Err(AppError::NotFound("Cliente"));
        }
        spreadsheet::customers_csv(&customers)
    }
}
