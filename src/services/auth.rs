// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User, UserWithGroups},
};

/// bcrypt é caro: roda fora do executor assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_hours: i64, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, token_ttl_hours, pool }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(username = %username, "Tentativa de login com senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Login efetuado");
        self.create_token(user.id)
    }

    /// Valida o token e carrega o usuário com seus grupos.
    pub async fn validate_token(&self, token: &str) -> Result<UserWithGroups, AppError> {
        let claims = self.decode_token(token)?;

        let mut conn = self.pool.acquire().await?;
        self.user_repo
            .find_with_groups(&mut conn, claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Cria o primeiro administrador quando o banco ainda não tem usuários.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<Option<User>, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(None);
        }

        let hashed = hash_password(password).await?;
        let admin = self
            .user_repo
            .create_user(&self.pool, username, &hashed, "", "", "", true)
            .await?;

        tracing::info!(username = %admin.username, "Administrador inicial criado");
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str, ttl_hours: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/ombor_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), secret.into(), ttl_hours, pool)
    }

    #[tokio::test]
    async fn token_round_trip_keeps_the_user_id() {
        let auth = service("segredo", 1);
        let user_id = Uuid::new_v4();
        let token = auth.create_token(user_id).unwrap();
        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = service("a", 1).create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(service("b", 1).decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let auth = service("segredo", -2);
        let token = auth.create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("parol123").await.unwrap();
        assert!(verify("parol123", &hashed).unwrap());
        assert!(!verify("boshqa", &hashed).unwrap());
    }
}
