pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod documents;
pub mod finance;
pub mod inventory;
pub mod notifications;
pub mod returns;
pub mod sales;
