// src/services/spreadsheet.rs
//
// Leitura e escrita das planilhas CSV de importação / exportação.

use std::{collections::HashMap, str::FromStr};

use csv::{ReaderBuilder, StringRecord, Writer};
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{
    common::{
        error::{AppError, AppResult},
        validation::{check_money, max_amount, max_price},
    },
    models::{
        crm::Customer,
        inventory::{Product, ProductData},
        sales::SaleExportRow,
    },
};

pub const PRODUCT_COLUMNS: [&str; 6] =
    ["brand", "category", "name", "price", "quantity_healthy", "quantity_defective"];
const PRODUCT_REQUIRED: [&str; 3] = ["name", "price", "quantity_healthy"];

pub const CUSTOMER_COLUMNS: [&str; 4] = ["full_name", "phone_number", "address", "debt"];
const CUSTOMER_REQUIRED: [&str; 2] = ["full_name", "phone_number"];

pub const SALE_COLUMNS: [&str; 9] = [
    "sale_id", "date", "customer", "seller", "product", "quantity", "price", "line_total", "status",
];

/// Uma linha de cliente vinda da planilha.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub debt: Decimal,
}

// ---
// Leitura
// ---

struct Sheet {
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl Sheet {
    fn read(bytes: &[u8], required: &[&str]) -> AppResult<Self> {
        let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_lowercase(), i))
            .collect();

        if let Some(missing) = required.iter().find(|c| !columns.contains_key(**c)) {
            return Err(AppError::BadRequest(format!(
                "A coluna '{}' não foi encontrada na planilha.",
                missing
            )));
        }

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns, records })
    }

    fn text<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.columns
            .get(column)
            .and_then(|i| record.get(*i))
            .filter(|v| !v.is_empty())
    }

    fn required<'r>(&self, record: &'r StringRecord, line: usize, column: &str) -> AppResult<&'r str> {
        self.text(record, column).ok_or_else(|| {
            AppError::BadRequest(format!("Linha {}: '{}' está vazio.", line, column))
        })
    }
}

fn parse_decimal(raw: &str, line: usize, column: &str) -> AppResult<Decimal> {
    let value = Decimal::from_str(&raw.replace(',', "."))
        .map_err(|_| AppError::BadRequest(format!("Linha {}: '{}' não é um número válido.", line, column)))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::BadRequest(format!("Linha {}: '{}' não pode ser negativo.", line, column)));
    }
    Ok(value)
}

fn parse_money(raw: &str, line: usize, column: &str, max: Decimal) -> AppResult<Decimal> {
    let value = parse_decimal(raw, line, column)?;
    check_money(&value, max)
        .map_err(|e| AppError::BadRequest(format!("Linha {}: '{}': {}", line, column, e.message())))?;
    Ok(value)
}

fn parse_quantity(raw: &str, line: usize, column: &str) -> AppResult<i32> {
    // Planilhas costumam gravar inteiros como "10.0"
    let value = parse_decimal(raw, line, column)?;
    if !value.fract().is_zero() {
        return Err(AppError::BadRequest(format!("Linha {}: '{}' deve ser inteiro.", line, column)));
    }
    value
        .to_i32()
        .ok_or_else(|| AppError::BadRequest(format!("Linha {}: '{}' é grande demais.", line, column)))
}

/// Linhas de produto; a primeira linha de dados é a linha 2 da planilha.
pub fn parse_products(bytes: &[u8]) -> AppResult<Vec<ProductData>> {
    let sheet = Sheet::read(bytes, &PRODUCT_REQUIRED)?;

    sheet
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let line = i + 2;
            Ok(ProductData {
                brand: sheet.text(record, "brand").unwrap_or_default().to_string(),
                category: sheet.text(record, "category").unwrap_or_default().to_string(),
                name: sheet.required(record, line, "name")?.to_string(),
                price: parse_money(sheet.required(record, line, "price")?, line, "price", max_price())?,
                quantity_healthy: parse_quantity(
                    sheet.required(record, line, "quantity_healthy")?,
                    line,
                    "quantity_healthy",
                )?,
                quantity_defective: sheet
                    .text(record, "quantity_defective")
                    .map(|raw| parse_quantity(raw, line, "quantity_defective"))
                    .transpose()?
                    .unwrap_or(0),
            })
        })
        .collect()
}

pub fn parse_customers(bytes: &[u8]) -> AppResult<Vec<CustomerRow>> {
    let sheet = Sheet::read(bytes, &CUSTOMER_REQUIRED)?;

    sheet
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let line = i + 2;
            Ok(CustomerRow {
                full_name: sheet.required(record, line, "full_name")?.to_string(),
                phone_number: sheet.required(record, line, "phone_number")?.to_string(),
                address: sheet.text(record, "address").unwrap_or_default().to_string(),
                debt: sheet
                    .text(record, "debt")
                    .map(|raw| parse_money(raw, line, "debt", max_amount()))
                    .transpose()?
                    .unwrap_or(Decimal::ZERO),
            })
        })
        .collect()
}

// ---
// Escrita
// ---

fn finish(writer: Writer<Vec<u8>>) -> AppResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar o CSV: {}", e).into())
}

pub fn products_csv(products: &[Product]) -> AppResult<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(PRODUCT_COLUMNS)?;
    for p in products {
        writer.write_record([
            p.brand.clone(),
            p.category.clone(),
            p.name.clone(),
            p.price.to_string(),
            p.quantity_healthy.to_string(),
            p.quantity_defective.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn customers_csv(customers: &[Customer]) -> AppResult<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CUSTOMER_COLUMNS)?;
    for c in customers {
        writer.write_record([
            c.full_name.clone(),
            c.phone_number.clone(),
            c.address.clone(),
            c.debt.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn sales_csv(rows: &[SaleExportRow]) -> AppResult<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(SALE_COLUMNS)?;
    for r in rows {
        writer.write_record([
            r.sale_id.to_string(),
            r.created_at.format("%Y-%m-%d %H:%M").to_string(),
            r.customer.clone(),
            r.seller.clone(),
            r.product.clone(),
            r.quantity.to_string(),
            r.price.to_string(),
            r.line_total().to_string(),
            r.status.as_str().to_string(),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_need_the_required_columns() {
        let err = parse_products(b"name,price\nEshik,10\n").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("quantity_healthy")));
    }

    #[test]
    fn optional_product_columns_default() {
        let rows = parse_products(b"name,price,quantity_healthy\nEshik,120.50,10.0\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Eshik");
        assert_eq!(rows[0].brand, "");
        assert_eq!(rows[0].price, Decimal::new(12050, 2));
        assert_eq!(rows[0].quantity_healthy, 10);
        assert_eq!(rows[0].quantity_defective, 0);
    }

    #[test]
    fn bad_numbers_point_at_the_line() {
        let csv = b"name,price,quantity_healthy\nA,1,1\nB,abc,1\n";
        let err = parse_products(csv).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.starts_with("Linha 3")));

        let csv = b"name,price,quantity_healthy\nA,1,-2\n";
        assert!(parse_products(csv).is_err());

        let csv = b"name,price,quantity_healthy\nA,1,2.5\n";
        assert!(parse_products(csv).is_err());
    }

    #[test]
    fn money_columns_keep_two_decimals_and_the_column_limit() {
        let csv = b"name,price,quantity_healthy\nA,10.005,1\n";
        let err = parse_products(csv).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.starts_with("Linha 2") && m.contains("duas casas")));

        let csv = b"name,price,quantity_healthy\nA,100000000,1\n";
        assert!(parse_products(csv).is_err());

        let csv = b"full_name,phone_number,debt\nAziz,1,0.001\n";
        assert!(parse_customers(csv).is_err());
    }

    #[test]
    fn headers_are_case_insensitive_and_trimmed() {
        let rows = parse_customers(b" Full_Name , phone_number\n Aziz , +998 \n").unwrap();
        assert_eq!(
            rows,
            vec![CustomerRow {
                full_name: "Aziz".into(),
                phone_number: "+998".into(),
                address: String::new(),
                debt: Decimal::ZERO,
            }]
        );
    }

    #[test]
    fn customer_debt_is_read_when_present() {
        let rows = parse_customers(b"full_name,phone_number,address,debt\nAziz,1,Toshkent,\"1200,5\"\n").unwrap();
        assert_eq!(rows[0].debt, Decimal::new(12005, 1));
        assert_eq!(rows[0].address, "Toshkent");
    }

    #[test]
    fn product_export_has_header_and_rows() {
        let product = Product {
            id: 1,
            brand: "Artel".into(),
            category: "Eshik".into(),
            name: "E-100".into(),
            price: Decimal::new(9900, 2),
            quantity_healthy: 4,
            quantity_defective: 1,
        };
        let out = String::from_utf8(products_csv(&[product]).unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("brand,category,name,price,quantity_healthy,quantity_defective"));
        assert_eq!(lines.next(), Some("Artel,Eshik,E-100,99.00,4,1"));
    }
}
