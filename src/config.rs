// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CrmRepository, FinanceRepository, InventoryRepository, NotificationRepository, ReportRepository,
        ReturnsRepository, SalesRepository, UserRepository,
    },
    services::{
        auth::AuthService, crm_service::CrmService, document_service::DocumentService,
        finance_service::FinanceService, inventory_service::InventoryService,
        notification_service::NotificationService, report_service::ReportService,
        return_service::ReturnService, sale_service::SaleService, user_service::UserService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub jwt_ttl_hours: i64,
    pub fonts_dir: PathBuf,
    /// Administrador inicial (usuário, senha), criado só com o banco vazio.
    pub bootstrap_admin: Option<(String, String)>,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} tem um valor inválido: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bootstrap_admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(user), Ok(password)) if !user.is_empty() && !password.is_empty() => Some((user, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 5)?,
            jwt_ttl_hours: var_or("JWT_TTL_HOURS", 24 * 7)?,
            fonts_dir: var_or("FONTS_DIR", PathBuf::from("./fonts"))?,
            bootstrap_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
    pub sale_service: SaleService,
    pub finance_service: FinanceService,
    pub return_service: ReturnService,
    pub report_service: ReportService,
    pub notification_service: NotificationService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(config, db_pool))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn from_parts(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let returns_repo = ReturnsRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let crm_service = CrmService::new(crm_repo.clone(), db_pool.clone());
        let sale_service = SaleService::new(
            sales_repo,
            inventory_repo.clone(),
            crm_repo.clone(),
            user_repo.clone(),
            notification_repo.clone(),
            db_pool.clone(),
        );
        let finance_service = FinanceService::new(finance_repo, crm_repo.clone(), db_pool.clone());
        let return_service =
            ReturnService::new(returns_repo, inventory_repo, crm_repo.clone(), user_repo, db_pool.clone());
        let report_service = ReportService::new(report_repo, crm_repo, db_pool.clone());
        let notification_service = NotificationService::new(notification_repo, db_pool.clone());
        let document_service = DocumentService::new(config.fonts_dir.clone());

        Self {
            db_pool,
            config,
            auth_service,
            user_service,
            inventory_service,
            crm_service,
            sale_service,
            finance_service,
            return_service,
            report_service,
            notification_service,
            document_service,
        }
    }
}
