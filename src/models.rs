pub mod auth;
pub mod crm;
pub mod finance;
pub mod inventory;
pub mod notifications;
pub mod reports;
pub mod returns;
pub mod sales;
