// src/common/validation.rs

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Casas decimais das colunas monetárias.
pub const MONEY_SCALE: u32 = 2;

/// Maior preço que cabe em `NUMERIC(10,2)`.
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999_99, MONEY_SCALE)
}

/// Maior valor que cabe em `NUMERIC(12,2)` (dívidas e pagamentos).
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999_99, MONEY_SCALE)
}

/// Falha quando o valor seria arredondado ou estouraria a coluna.
/// Zeros à direita ("10.500") não contam como casas.
pub fn check_money(val: &Decimal, max: Decimal) -> Result<(), MoneyError> {
    if val.normalize().scale() > MONEY_SCALE {
        return Err(MoneyError::Scale);
    }
    if val.abs() > max {
        return Err(MoneyError::TooLarge(max));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoneyError {
    Scale,
    TooLarge(Decimal),
}

impl MoneyError {
    pub fn message(&self) -> String {
        match self {
            MoneyError::Scale => "O valor deve ter no máximo duas casas decimais.".to_string(),
            MoneyError::TooLarge(max) => format!("O valor não pode passar de {}.", max),
        }
    }

    fn into_validation_error(self) -> ValidationError {
        let mut err = match self {
            MoneyError::Scale => ValidationError::new("scale"),
            MoneyError::TooLarge(max) => {
                let mut err = ValidationError::new("range");
                err.add_param("max".into(), &max.to_string());
                err
            }
        };
        err.message = Some(self.message().into());
        err
    }
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

/// Preço de produto ou de linha de venda.
pub fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    check_money(val, max_price()).map_err(MoneyError::into_validation_error)
}

/// Valor de pagamento.
pub fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    check_money(val, max_amount()).map_err(MoneyError::into_validation_error)
}

/// Monta um `ValidationErrors` para regras que o derive não cobre,
/// mantendo o mesmo formato de resposta.
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn not_negative_accepts_zero_and_rejects_negatives() {
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&dec("10.50")).is_ok());
        assert!(validate_not_negative(&dec("-0.01")).is_err());
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&dec("0.01")).is_ok());
    }

    #[test]
    fn money_with_three_decimals_is_rejected() {
        assert_eq!(check_money(&dec("0.005"), max_amount()), Err(MoneyError::Scale));
        assert_eq!(check_money(&dec("10.005"), max_price()), Err(MoneyError::Scale));
        assert!(check_money(&dec("10.500"), max_price()).is_ok());
        assert!(check_money(&dec("10.5"), max_price()).is_ok());

        let err = validate_amount(&dec("0.005")).unwrap_err();
        assert_eq!(err.code, "scale");
        let err = validate_price(&dec("10.005")).unwrap_err();
        assert_eq!(err.code, "scale");
    }

    #[test]
    fn money_above_the_column_limit_is_rejected() {
        assert!(validate_price(&dec("99999999.99")).is_ok());
        assert_eq!(validate_price(&dec("100000000")).unwrap_err().code, "range");
        assert!(validate_amount(&dec("9999999999.99")).is_ok());
        assert_eq!(validate_amount(&dec("10000000000")).unwrap_err().code, "range");
    }

    #[test]
    fn price_and_amount_keep_the_sign_rules() {
        assert!(validate_price(&Decimal::ZERO).is_ok());
        assert!(validate_price(&dec("-1")).is_err());
        assert!(validate_amount(&Decimal::ZERO).is_err());
    }

    #[test]
    fn field_error_is_attached_to_the_field() {
        let errors = field_error("toCondition", "same_condition", "Condições iguais.");
        assert!(errors.field_errors().contains_key("toCondition"));
    }
}
