// src/db/notification_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{notifications::Notification, sales::SaleStatus},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Uma notificação por destinatário, num único INSERT.
    pub async fn create_many<'e, E>(
        &self,
        executor: E,
        recipients: &[Uuid],
        sale_id: i64,
        status: SaleStatus,
        message: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, sale_id, status, message)
            SELECT unnest($1::uuid[]), $2, $3, $4
            "#,
        )
        .bind(recipients)
        .bind(sale_id)
        .bind(status)
        .bind(message)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for(&self, recipient: Uuid, only_unread: bool) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(recipient)
        .bind(only_unread)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i64) -> Result<Option<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(notification)
    }

    pub async fn mark_read<'e, E>(&self, executor: E, id: i64) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(notification)
    }
}
