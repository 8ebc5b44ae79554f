// src/services/report_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CrmRepository, ReportRepository},
    models::{
        reports::{
            average_check, build_statement, DashboardStats, ReconciliationPeriod, ReconciliationReport,
            StatsCards,
        },
        sales::SaleFilter,
    },
};

const TOP_PRODUCTS: i64 = 5;

/// As duas datas são obrigatórias e o início não pode passar do fim.
pub fn require_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::BadRequest("startDate e endDate são obrigatórios.".into()));
    };
    if start > end {
        return Err(AppError::BadRequest("startDate não pode ser posterior a endDate.".into()));
    }
    Ok((start, end))
}

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository, crm_repo: CrmRepository, pool: PgPool) -> Self {
        Self { report_repo, crm_repo, pool }
    }

    /// Ato de conciliação de um cliente no período `[start, end]` (dias inteiros).
    pub async fn reconciliation(
        &self,
        customer_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReconciliationReport, AppError> {
        let (start, end) = require_period(start, end)?;

        // Leituras num snapshot único
        let mut tx = self.pool.begin().await?;

        let customer = self
            .crm_repo
            .find_customer(&mut *tx, customer_id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))?;

        // 1. Saldo inicial: tudo o que aconteceu antes do período
        let sales_before = self.report_repo.sales_total_before(&mut *tx, customer_id, start).await?;
        let payments_before = self.report_repo.payments_total_before(&mut *tx, customer_id, start).await?;
        let opening = sales_before - payments_before;

        // 2. Movimento do período
        let sales = self.report_repo.sale_totals_between(&mut *tx, customer_id, start, end).await?;
        let payments = self.report_repo.payments_between(&mut *tx, customer_id, start, end).await?;

        tx.commit().await?;

        let statement = build_statement(opening, sales, payments);

        tracing::debug!(customer_id, entries = statement.entries.len(), "Ato de conciliação montado");

        Ok(ReconciliationReport {
            customer,
            period: ReconciliationPeriod { start_date: start, end_date: end },
            starting_balance: opening,
            ending_balance: statement.ending_balance,
            total_debit: statement.total_debit,
            total_credit: statement.total_credit,
            transactions: statement.entries,
        })
    }

    pub async fn dashboard(&self, filter: &SaleFilter) -> Result<DashboardStats, AppError> {
        let (total_sales_amount, total_sales_count) = self.report_repo.sales_summary(filter).await?;
        let total_payments = self.report_repo.payments_total(filter).await?;
        let (total_customer_debt, total_customers_count, total_products_count) =
            self.report_repo.global_totals().await?;

        let sales_by_seller = self.report_repo.sales_by_seller(filter).await?;
        let top_products = self.report_repo.top_products(filter, TOP_PRODUCTS).await?;

        Ok(DashboardStats {
            stats_cards: StatsCards {
                total_sales_amount,
                total_sales_count,
                total_payments,
                average_check: average_check(total_sales_amount, total_sales_count),
                total_customer_debt,
                total_customers_count,
                total_products_count,
            },
            sales_by_seller,
            top_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn period_requires_both_dates() {
        assert!(matches!(require_period(Some(day(1)), None), Err(AppError::BadRequest(_))));
        assert!(matches!(require_period(None, Some(day(1))), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn period_must_be_ordered() {
        assert!(require_period(Some(day(5)), Some(day(1))).is_err());
        assert_eq!(require_period(Some(day(1)), Some(day(1))).unwrap(), (day(1), day(1)));
    }
}
