// src/models/inventory.rs

use std::ops::{Add, Neg};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- 1. Condição do estoque ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_condition", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockCondition {
    Healthy,
    Defective,
}

// --- 2. Produto ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Mega Door")]
    pub brand: String,
    #[schema(example = "Eshiklar")]
    pub category: String,
    #[schema(example = "Wood Door")]
    pub name: String,
    #[schema(example = "250.50")]
    pub price: Decimal,
    pub quantity_healthy: i32,
    pub quantity_defective: i32,
}

impl Product {
    pub fn quantity(&self, condition: StockCondition) -> i32 {
        match condition {
            StockCondition::Healthy => self.quantity_healthy,
            StockCondition::Defective => self.quantity_defective,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPrice {
    pub price: Decimal,
}

// --- 3. Delta de estoque ---
// Toda movimentação (venda, entrada, transferência, devolução) vira um delta
// aplicado de uma vez sobre as duas colunas do produto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockDelta {
    pub healthy: i32,
    pub defective: i32,
}

impl StockDelta {
    pub fn of(condition: StockCondition, quantity: i32) -> Self {
        match condition {
            StockCondition::Healthy => Self { healthy: quantity, defective: 0 },
            StockCondition::Defective => Self { healthy: 0, defective: quantity },
        }
    }

    /// `None` quando origem e destino são a mesma condição.
    pub fn transfer(from: StockCondition, to: StockCondition, quantity: i32) -> Option<Self> {
        if from == to {
            return None;
        }
        Some(Self::of(from, -quantity) + Self::of(to, quantity))
    }

    pub fn is_zero(&self) -> bool {
        self.healthy == 0 && self.defective == 0
    }
}

impl Add for StockDelta {
    type Output = StockDelta;

    fn add(self, rhs: StockDelta) -> StockDelta {
        StockDelta {
            healthy: self.healthy + rhs.healthy,
            defective: self.defective + rhs.defective,
        }
    }
}

impl Neg for StockDelta {
    type Output = StockDelta;

    fn neg(self) -> StockDelta {
        StockDelta { healthy: -self.healthy, defective: -self.defective }
    }
}

// --- 4. Entrada de mercadoria ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoodsReceipt {
    pub id: i64,
    #[serde(rename = "product")]
    pub product_id: i64,
    #[schema(example = 20)]
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Campos editáveis de um produto (cadastro, edição e importação).
#[derive(Debug, Clone)]
pub struct ProductData {
    pub brand: String,
    pub category: String,
    pub name: String,
    pub price: Decimal,
    pub quantity_healthy: i32,
    pub quantity_defective: i32,
}

// Resultado de uma importação de planilha
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub message: String,
    pub created: u32,
    pub updated: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transfer_moves_between_columns() {
        let delta = StockDelta::transfer(StockCondition::Healthy, StockCondition::Defective, 4).unwrap();
        assert_eq!(delta, StockDelta { healthy: -4, defective: 4 });

        let back = StockDelta::transfer(StockCondition::Defective, StockCondition::Healthy, 2).unwrap();
        assert_eq!(back, StockDelta { healthy: 2, defective: -2 });
    }

    #[test]
    fn transfer_to_same_condition_is_rejected() {
        assert!(StockDelta::transfer(StockCondition::Healthy, StockCondition::Healthy, 1).is_none());
    }

    #[test]
    fn sale_takes_from_healthy_only() {
        let sale = StockDelta::of(StockCondition::Healthy, -5);
        assert_eq!(sale, StockDelta { healthy: -5, defective: 0 });
        assert!(StockDelta::of(StockCondition::Defective, 0).is_zero());
    }

    #[test]
    fn product_quantity_by_condition() {
        let product = Product {
            id: 1,
            brand: "B".into(),
            category: "C".into(),
            name: "N".into(),
            price: Decimal::new(10000, 2),
            quantity_healthy: 10,
            quantity_defective: 2,
        };
        assert_eq!(product.quantity(StockCondition::Healthy), 10);
        assert_eq!(product.quantity(StockCondition::Defective), 2);
    }

    #[test]
    fn condition_wire_format() {
        assert_eq!(serde_json::to_string(&StockCondition::Defective).unwrap(), "\"defective\"");
        let parsed: StockCondition = serde_json::from_str("\"healthy\"").unwrap();
        assert_eq!(parsed, StockCondition::Healthy);
    }

    proptest! {
        #[test]
        fn delta_and_its_negation_cancel(h in -1000i32..1000, d in -1000i32..1000) {
            let delta = StockDelta { healthy: h, defective: d };
            prop_assert!((delta + -delta).is_zero());
        }

        #[test]
        fn transfer_preserves_total_stock(qty in 1i32..500) {
            let delta = StockDelta::transfer(StockCondition::Healthy, StockCondition::Defective, qty).unwrap();
            prop_assert_eq!(delta.healthy + delta.defective, 0);
            prop_assert_eq!(delta.healthy, -qty);
        }

        #[test]
        fn transfer_back_cancels(qty in 1i32..500) {
            let there = StockDelta::transfer(StockCondition::Healthy, StockCondition::Defective, qty).unwrap();
            let back = StockDelta::transfer(StockCondition::Defective, StockCondition::Healthy, qty).unwrap();
            prop_assert!((there + back).is_zero());
        }
    }
}
