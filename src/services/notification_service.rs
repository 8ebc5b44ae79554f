// src/services/notification_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    models::{auth::UserWithGroups, notifications::Notification},
};

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    pool: PgPool,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository, pool: PgPool) -> Self {
        Self { notification_repo, pool }
    }

    pub async fn list_for(&self, user: &UserWithGroups, only_unread: bool) -> Result<Vec<Notification>, AppError> {
        self.notification_repo.list_for(user.user.id, only_unread).await
    }

    /// Só o destinatário pode marcar como lida.
    pub async fn mark_read(&self, id: i64, user: &UserWithGroups) -> Result<Notification, AppError> {
        let notification = self
            .notification_repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Notificação"))?;

        if notification.recipient_id != user.user.id {
            return Err(AppError::Forbidden("A notificação pertence a outro usuário.".into()));
        }
        if notification.is_read {
            return Ok(notification);
        }

        self.notification_repo.mark_read(&self.pool, id).await
    }
}
