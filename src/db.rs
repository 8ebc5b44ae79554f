pub mod crm_repo;
pub mod finance_repo;
pub mod inventory_repo;
pub mod notification_repo;
pub mod report_repo;
pub mod returns_repo;
pub mod sales_repo;
pub mod user_repo;

pub use crm_repo::CrmRepository;
pub use finance_repo::FinanceRepository;
pub use inventory_repo::InventoryRepository;
pub use notification_repo::NotificationRepository;
pub use report_repo::ReportRepository;
pub use returns_repo::ReturnsRepository;
pub use sales_repo::SalesRepository;
pub use user_repo::UserRepository;
