// src/models/reports.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::{crm::Customer, finance::Payment};

// =========================================================================
//  ATO DE CONCILIAÇÃO
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReconciliationQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// Total de um cheque dentro do período
#[derive(Debug, Clone, FromRow)]
pub struct SaleTotalRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum EntryKind {
    #[serde(rename = "Sotuv")]
    Sale,
    #[serde(rename = "To'lov")]
    Payment,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Sale => "Sotuv",
            EntryKind::Payment => "To'lov",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementEntry {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[schema(example = "Chek #12")]
    pub document: String,
    pub debit: Decimal,
    pub credit: Decimal,
    // Saldo corrente após este lançamento
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub entries: Vec<StatementEntry>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub ending_balance: Decimal,
}

/// Junta vendas (débito) e pagamentos (crédito), ordena por data e calcula
/// o saldo corrente a partir do saldo inicial. Em datas iguais a venda vem
/// antes do pagamento.
pub fn build_statement(opening: Decimal, sales: Vec<SaleTotalRow>, payments: Vec<Payment>) -> Statement {
    let mut entries: Vec<StatementEntry> = sales
        .into_iter()
        .map(|s| StatementEntry {
            date: s.created_at,
            kind: EntryKind::Sale,
            document: format!("Chek #{}", s.id),
            debit: s.total,
            credit: Decimal::ZERO,
            balance: Decimal::ZERO,
        })
        .chain(payments.into_iter().map(|p| StatementEntry {
            date: p.created_at,
            kind: EntryKind::Payment,
            document: format!("To'lov #{}", p.id),
            debit: Decimal::ZERO,
            credit: p.amount,
            balance: Decimal::ZERO,
        }))
        .collect();

    // sort_by_key é estável
    entries.sort_by_key(|e| e.date);

    let mut balance = opening;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    for entry in &mut entries {
        balance += entry.debit - entry.credit;
        total_debit += entry.debit;
        total_credit += entry.credit;
        entry.balance = balance;
    }

    Statement {
        entries,
        total_debit,
        total_credit,
        ending_balance: opening + total_debit - total_credit,
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub customer: Customer,
    pub period: ReconciliationPeriod,
    pub starting_balance: Decimal,
    pub ending_balance: Decimal,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub transactions: Vec<StatementEntry>,
}

// =========================================================================
//  DASHBOARD
// =========================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsCards {
    pub total_sales_amount: Decimal,
    pub total_sales_count: i64,
    pub total_payments: Decimal,
    pub average_check: Decimal,
    // Globais (não filtrados)
    pub total_customer_debt: Decimal,
    pub total_customers_count: i64,
    pub total_products_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSales {
    pub username: String,
    pub total_amount: Decimal,
    pub sales_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub name: String,
    pub total_sold: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats_cards: StatsCards,
    pub sales_by_seller: Vec<SellerSales>,
    pub top_products: Vec<TopProduct>,
}

pub fn average_check(total: Decimal, count: i64) -> Decimal {
    if count > 0 {
        (total / Decimal::from(count)).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn sale(id: i64, when: DateTime<Utc>, total: i64) -> SaleTotalRow {
        SaleTotalRow { id, created_at: when, total: Decimal::from(total) }
    }

    fn payment(id: i64, when: DateTime<Utc>, amount: i64) -> Payment {
        Payment { id, customer_id: 1, amount: Decimal::from(amount), created_at: when }
    }

    #[test]
    fn statement_merges_and_sorts_by_date() {
        let statement = build_statement(
            Decimal::from(100),
            vec![sale(1, at(2, 10), 500), sale(2, at(5, 9), 200)],
            vec![payment(1, at(3, 12), 300)],
        );

        let docs: Vec<&str> = statement.entries.iter().map(|e| e.document.as_str()).collect();
        assert_eq!(docs, vec!["Chek #1", "To'lov #1", "Chek #2"]);

        let balances: Vec<Decimal> = statement.entries.iter().map(|e| e.balance).collect();
        assert_eq!(balances, vec![Decimal::from(600), Decimal::from(300), Decimal::from(500)]);

        assert_eq!(statement.total_debit, Decimal::from(700));
        assert_eq!(statement.total_credit, Decimal::from(300));
        assert_eq!(statement.ending_balance, Decimal::from(500));
    }

    #[test]
    fn empty_period_keeps_opening_balance() {
        let statement = build_statement(Decimal::from(42), vec![], vec![]);
        assert!(statement.entries.is_empty());
        assert_eq!(statement.ending_balance, Decimal::from(42));
    }

    #[test]
    fn sale_precedes_payment_on_same_timestamp() {
        let when = at(4, 8);
        let statement = build_statement(Decimal::ZERO, vec![sale(9, when, 50)], vec![payment(3, when, 50)]);
        assert_eq!(statement.entries[0].kind, EntryKind::Sale);
        assert_eq!(statement.entries[1].balance, Decimal::ZERO);
    }

    #[test]
    fn entry_kind_wire_names() {
        assert_eq!(serde_json::to_string(&EntryKind::Payment).unwrap(), "\"To'lov\"");
    }

    #[test]
    fn average_check_handles_no_sales() {
        assert_eq!(average_check(Decimal::from(100), 0), Decimal::ZERO);
        assert_eq!(average_check(Decimal::from(100), 3), Decimal::new(3333, 2));
    }
}
