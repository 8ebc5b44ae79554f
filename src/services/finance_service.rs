// src/services/finance_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        validation::{check_money, max_amount},
    },
    db::{CrmRepository, FinanceRepository},
    models::finance::Payment,
};

#[derive(Clone)]
pub struct FinanceService {
    finance_repo: FinanceRepository,
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl FinanceService {
    pub fn new(finance_repo: FinanceRepository, crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { finance_repo, crm_repo, pool }
    }

    /// Abate a dívida e grava o pagamento na mesma transação.
    pub async fn register_payment(&self, customer_id: i64, amount: Decimal) -> Result<Payment, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::BadRequest("O valor do pagamento deve ser maior que zero.".into()));
        }
        check_money(&amount, max_amount()).map_err(|e| AppError::BadRequest(e.message()))?;

        let mut tx = self.pool.begin().await?;

        // 1. Débito guardado: só passa se a dívida cobrir o valor
        let updated = self.crm_repo.decrease_debt_guarded(&mut *tx, customer_id, amount).await?;
        if updated.is_none() {
            let customer = self
                .crm_repo
                .find_customer(&mut *tx, customer_id)
                .await?
                .ok_or(AppError::NotFound("Cliente"))?;
            return Err(AppError::PaymentExceedsDebt { amount, debt: customer.debt });
        }

        // 2. Registro do pagamento
        let payment = self.finance_repo.create_payment(&mut *tx, customer_id, amount).await?;

        tx.commit().await?;

        tracing::info!(payment_id = payment.id, customer_id, %amount, "Pagamento registrado");
        Ok(payment)
    }

    pub async fn list_payments(&self, customer_id: Option<i64>) -> Result<Vec<Payment>, AppError> {
        self.finance_repo.list_payments(customer_id).await
    }
}
