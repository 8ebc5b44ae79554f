// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::field_error},
    db::UserRepository,
    models::auth::{CreateUserPayload, Group, UpdateUserPayload, UserWithGroups},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, AppError> {
        self.user_repo.list_groups().await
    }

    pub async fn list_users(&self) -> Result<Vec<UserWithGroups>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let users = self.user_repo.list_users(&mut *conn).await?;
        self.user_repo.attach_groups(&mut conn, users).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserWithGroups, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo
            .find_with_groups(&mut conn, id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<UserWithGroups, AppError> {
        let hashed = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        // 1. Grupos informados precisam existir
        self.ensure_groups_exist(&mut tx, &payload.groups).await?;

        // 2. Usuário
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                &payload.username,
                &hashed,
                payload.email.as_deref().unwrap_or_default(),
                &payload.first_name,
                &payload.last_name,
                payload.is_staff,
            )
            .await?;

        // 3. Filiações
        self.user_repo.set_groups(&mut tx, user.id, &payload.groups).await?;
        let result = self
            .user_repo
            .find_with_groups(&mut tx, user.id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Usuário criado");
        Ok(result)
    }

    pub async fn update_user(&self, id: Uuid, payload: &UpdateUserPayload) -> Result<UserWithGroups, AppError> {
        let hashed = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        self.user_repo
            .update_user(
                &mut *tx,
                id,
                payload.username.as_deref(),
                hashed.as_deref(),
                payload.email.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                payload.is_staff,
            )
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(groups) = &payload.groups {
            self.ensure_groups_exist(&mut tx, groups).await?;
            self.user_repo.set_groups(&mut tx, id, groups).await?;
        }

        let result = self
            .user_repo
            .find_with_groups(&mut tx, id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tx.commit().await?;

        tracing::info!(user_id = %id, "Usuário atualizado");
        Ok(result)
    }

    pub async fn delete_user(&self, id: Uuid, actor: &UserWithGroups) -> Result<(), AppError> {
        if actor.user.id == id {
            return Err(AppError::BadRequest("Não é possível remover o próprio usuário.".into()));
        }
        if !self.user_repo.delete_user(&self.pool, id).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!(user_id = %id, "Usuário removido");
        Ok(())
    }

    async fn ensure_groups_exist(&self, conn: &mut sqlx::PgConnection, groups: &[i32]) -> Result<(), AppError> {
        let mut unique = groups.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let found = self.user_repo.count_existing_groups(&mut *conn, &unique).await?;
        if found != unique.len() as i64 {
            return Err(field_error("groups", "unknown_group", "Um ou mais grupos não existem.").into());
        }
        Ok(())
    }
}
