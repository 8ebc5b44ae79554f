pub mod auth;
pub mod crm_service;
pub mod document_service;
pub mod finance_service;
pub mod inventory_service;
pub mod notification_service;
pub mod report_service;
pub mod return_service;
pub mod sale_service;
pub mod spreadsheet;
pub mod user_service;
