// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Alignment, Element};
use rust_decimal::Decimal;

use crate::{common::error::AppError, models::reports::ReconciliationReport};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

fn money(value: Decimal) -> String {
    format!("$ {:.2}", value)
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self { fonts_dir: fonts_dir.into() }
    }

    /// Renderiza o ato de conciliação em PDF.
    pub fn reconciliation_pdf(&self, report: &ReconciliationReport) -> Result<Vec<u8>, AppError> {
        // 1. Fonte
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|e| {
            AppError::DocumentError(format!(
                "Fonte '{}' não encontrada em {}: {}",
                FONT_FAMILY,
                self.fonts_dir.display(),
                e
            ))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Solishtirma dalolatnomasi #{}", report.customer.id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new("SOLISHTIRMA DALOLATNOMASI")
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(elements::Paragraph::new(format!("Mijoz: {}", report.customer.full_name)));
        doc.push(elements::Paragraph::new(format!("Telefon: {}", report.customer.phone_number)));
        doc.push(elements::Paragraph::new(format!(
            "Davr: {} - {}",
            report.period.start_date.format("%d.%m.%Y"),
            report.period.end_date.format("%d.%m.%Y")
        )));
        doc.push(elements::Break::new(1));
        doc.push(elements::Paragraph::new(format!(
            "Boshlang'ich qoldiq: {}",
            money(report.starting_balance)
        )));
        doc.push(elements::Break::new(1));

        // --- TABELA ---
        // Pesos: Data (2), Tipo (2), Documento (3), Débito (2), Crédito (2), Saldo (2)
        let mut table = elements::TableLayout::new(vec![2, 2, 3, 2, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Sana").styled(bold))
            .element(elements::Paragraph::new("Turi").styled(bold))
            .element(elements::Paragraph::new("Hujjat").styled(bold))
            .element(elements::Paragraph::new("Debet").styled(bold))
            .element(elements::Paragraph::new("Kredit").styled(bold))
            .element(elements::Paragraph::new("Qoldiq").styled(bold))
            .push()
            .map_err(|e| AppError::DocumentError(e.to_string()))?;

        for entry in &report.transactions {
            table
                .row()
                .element(elements::Paragraph::new(entry.date.format("%d.%m.%Y %H:%M").to_string()))
                .element(elements::Paragraph::new(entry.kind.label()))
                .element(elements::Paragraph::new(entry.document.clone()))
                .element(elements::Paragraph::new(money(entry.debit)))
                .element(elements::Paragraph::new(money(entry.credit)))
                .element(elements::Paragraph::new(money(entry.balance)))
                .push()
                .map_err(|e| AppError::DocumentError(e.to_string()))?;
        }

        doc.push(table);
        doc.push(elements::Break::new(1));

        // --- TOTAIS ---
        for line in [
            format!("Jami debet: {}", money(report.total_debit)),
            format!("Jami kredit: {}", money(report.total_credit)),
        ] {
            let mut paragraph = elements::Paragraph::new(line);
            paragraph.set_alignment(Alignment::Right);
            doc.push(paragraph);
        }
        let mut closing = elements::Paragraph::new(format!("Yakuniy qoldiq: {}", money(report.ending_balance)));
        closing.set_alignment(Alignment::Right);
        doc.push(closing.styled(style::Style::new().bold().with_font_size(12)));

        // 2. Renderiza em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::DocumentError(format!("Falha ao renderizar PDF: {}", e)))?;

        Ok(buffer)
    }
}
