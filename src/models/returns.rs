// src/models/returns.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    auth::User,
    crm::Customer,
    inventory::{Product, StockCondition, StockDelta},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedProduct {
    pub id: i64,
    #[serde(rename = "customer")]
    pub customer_id: i64,
    #[serde(rename = "product")]
    pub product_id: i64,
    #[schema(example = 3)]
    pub quantity: i32,
    pub condition: StockCondition,
    #[schema(example = "Tirnalgan")]
    pub reason: String,
    pub returned_at: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ReturnedProduct {
    pub fn effect(&self) -> ReturnEffect {
        ReturnEffect {
            product_id: self.product_id,
            condition: self.condition,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedProductDetail {
    #[serde(flatten)]
    pub record: ReturnedProduct,
    pub customer_detail: Customer,
    pub product_detail: Product,
    pub recorded_by_detail: Option<User>,
}

/// O que uma devolução soma ao estoque de um produto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnEffect {
    pub product_id: i64,
    pub condition: StockCondition,
    pub quantity: i32,
}

/// Delta líquido por produto para sair do efeito `old` e chegar ao `new`.
/// Criação: `(None, Some)`; remoção: `(Some, None)`; edição: ambos.
/// Ordenado por id do produto (ordem estável de lock) e sem deltas nulos.
pub fn rebalance(old: Option<ReturnEffect>, new: Option<ReturnEffect>) -> Vec<(i64, StockDelta)> {
    let mut net: BTreeMap<i64, StockDelta> = BTreeMap::new();

    if let Some(old) = old {
        let entry = net.entry(old.product_id).or_default();
        *entry = *entry + -StockDelta::of(old.condition, old.quantity);
    }
    if let Some(new) = new {
        let entry = net.entry(new.product_id).or_default();
        *entry = *entry + StockDelta::of(new.condition, new.quantity);
    }

    net.into_iter().filter(|(_, delta)| !delta.is_zero()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(product_id: i64, condition: StockCondition, quantity: i32) -> ReturnEffect {
        ReturnEffect { product_id, condition, quantity }
    }

    #[test]
    fn create_adds_to_the_returned_condition() {
        let plan = rebalance(None, Some(effect(1, StockCondition::Healthy, 3)));
        assert_eq!(plan, vec![(1, StockDelta { healthy: 3, defective: 0 })]);
    }

    #[test]
    fn update_reverts_old_and_applies_new() {
        // 4 saudáveis viram 2 defeituosos: 14/2 -> 10/4
        let plan = rebalance(
            Some(effect(1, StockCondition::Healthy, 4)),
            Some(effect(1, StockCondition::Defective, 2)),
        );
        assert_eq!(plan, vec![(1, StockDelta { healthy: -4, defective: 2 })]);
    }

    #[test]
    fn update_to_another_product_touches_both() {
        let plan = rebalance(
            Some(effect(7, StockCondition::Defective, 1)),
            Some(effect(3, StockCondition::Defective, 1)),
        );
        assert_eq!(
            plan,
            vec![
                (3, StockDelta { healthy: 0, defective: 1 }),
                (7, StockDelta { healthy: 0, defective: -1 }),
            ]
        );
    }

    #[test]
    fn unchanged_update_is_a_noop() {
        let same = effect(1, StockCondition::Healthy, 5);
        assert!(rebalance(Some(same), Some(same)).is_empty());
    }

    #[test]
    fn delete_takes_back_the_returned_quantity() {
        let plan = rebalance(Some(effect(1, StockCondition::Healthy, 3)), None);
        assert_eq!(plan, vec![(1, StockDelta { healthy: -3, defective: 0 })]);
    }
}
