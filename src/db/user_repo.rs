// src/db/user_repo.rs

use std::collections::HashMap;

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Group, User, UserWithGroups},
};

// O repositório de usuários: tabelas 'users', 'groups' e 'user_groups'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Usuário + grupos numa mesma conexão.
    pub async fn find_with_groups(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<UserWithGroups>, AppError> {
        let Some(user) = self.find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let groups = self.groups_of(&mut *conn, id).await?;
        Ok(Some(UserWithGroups { user, groups }))
    }

    pub async fn groups_of<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Group>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name
            FROM groups g
            JOIN user_groups ug ON ug.group_id = g.id
            WHERE ug.user_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(groups)
    }

    /// Carrega os grupos de vários usuários de uma vez (evita N+1 nas listagens).
    pub async fn attach_groups(
        &self,
        conn: &mut PgConnection,
        users: Vec<User>,
    ) -> Result<Vec<UserWithGroups>, AppError> {
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let rows = sqlx::query_as::<_, (Uuid, i32, String)>(
            r#"
            SELECT ug.user_id, g.id, g.name
            FROM user_groups ug
            JOIN groups g ON g.id = ug.group_id
            WHERE ug.user_id = ANY($1)
            ORDER BY g.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut by_user: HashMap<Uuid, Vec<Group>> = HashMap::new();
        for (user_id, id, name) in rows {
            by_user.entry(user_id).or_default().push(Group { id, name });
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let groups = by_user.remove(&user.id).unwrap_or_default();
                UserWithGroups { user, groups }
            })
            .collect())
    }

    /// Usuários sem grupos, para detalhes que só exibem o perfil.
    pub async fn find_users<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    pub async fn find_many(
        &self,
        conn: &mut PgConnection,
        ids: &[Uuid],
    ) -> Result<Vec<UserWithGroups>, AppError> {
        let users = self.find_users(&mut *conn, ids).await?;
        self.attach_groups(conn, users).await
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, username")
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, AppError> {
        let groups = sqlx::query_as::<_, Group>("SELECT id, name FROM groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    pub async fn count_existing_groups<'e, E>(&self, executor: E, ids: &[i32]) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// IDs de todos os membros de um grupo (destinatários de notificação).
    pub async fn member_ids<'e, E>(&self, executor: E, group_name: &str) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT ug.user_id
            FROM user_groups ug
            JOIN groups g ON g.id = ug.group_id
            WHERE g.name = $1
            "#,
        )
        .bind(group_name)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        password_hash: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        is_staff: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, email, first_name, last_name, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(is_staff)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_db(e, &format!("O usuário '{}' já existe.", username)))
    }

    /// Atualização parcial: campos `None` mantêm o valor atual.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        username: Option<&str>,
        password_hash: Option<&str>,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        is_staff: Option<bool>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                email = COALESCE($4, email),
                first_name = COALESCE($5, first_name),
                last_name = COALESCE($6, last_name),
                is_staff = COALESCE($7, is_staff),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(is_staff)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_db(e, "Já existe um usuário com esse nome."))
    }

    /// Substitui o conjunto de grupos do usuário.
    pub async fn set_groups(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        group_ids: &[i32],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_groups (user_id, group_id)
            SELECT $1, unnest($2::int[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(group_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| AppError::from_db(e, "O usuário possui vendas registradas."))?;
        Ok(result.rows_affected() > 0)
    }
}
