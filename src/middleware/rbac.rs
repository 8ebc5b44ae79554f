// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::Role,
};

/// Um conjunto de papéis aceitos por uma rota. Administrador sempre passa.
pub trait RoleDef: Send + Sync + 'static {
    fn roles() -> &'static [Role];
    fn describe() -> &'static str;
}

/// Guardião: `_guard: RequireRole<AdminOrWarehouse>` na assinatura do handler.
pub struct RequireRole<R>(pub PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if user.is_admin() || R::roles().iter().any(|role| user.has_role(*role)) {
            return Ok(RequireRole(PhantomData));
        }

        Err(AppError::Forbidden(format!("Ação restrita a: {}.", R::describe())))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct Admin;
impl RoleDef for Admin {
    fn roles() -> &'static [Role] { &[] }
    fn describe() -> &'static str { "administradores" }
}

pub struct AdminOrSeller;
impl RoleDef for AdminOrSeller {
    fn roles() -> &'static [Role] { &[Role::Seller] }
    fn describe() -> &'static str { "administradores e vendedores" }
}

pub struct AdminOrWarehouse;
impl RoleDef for AdminOrWarehouse {
    fn roles() -> &'static [Role] { &[Role::Warehouse] }
    fn describe() -> &'static str { "administradores e almoxarifes" }
}

pub struct AdminOrAccountant;
impl RoleDef for AdminOrAccountant {
    fn roles() -> &'static [Role] { &[Role::Accountant] }
    fn describe() -> &'static str { "administradores e contadores" }
}

/// Vendedores e almoxarifes (status de venda, devoluções).
pub struct SalesStaff;
impl RoleDef for SalesStaff {
    fn roles() -> &'static [Role] { &[Role::Seller, Role::Warehouse] }
    fn describe() -> &'static str { "administradores, vendedores e almoxarifes" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::user_with;
    use axum::http::Request;

    async fn check<R: RoleDef>(user: Option<crate::models::auth::UserWithGroups>) -> Result<(), AppError> {
        let mut request = Request::new(());
        if let Some(user) = user {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
        let (mut parts, _) = request.into_parts();
        RequireRole::<R>::from_request_parts(&mut parts, &()).await.map(|_| ())
    }

    #[tokio::test]
    async fn admin_passes_every_guard() {
        assert!(check::<Admin>(Some(user_with(&[], true))).await.is_ok());
        assert!(check::<AdminOrAccountant>(Some(user_with(&[], true))).await.is_ok());
    }

    #[tokio::test]
    async fn group_members_pass_their_guard_only() {
        assert!(check::<AdminOrWarehouse>(Some(user_with(&["Omborchilar"], false))).await.is_ok());
        assert!(check::<SalesStaff>(Some(user_with(&["Sotuvchilar"], false))).await.is_ok());
        assert!(matches!(
            check::<AdminOrSeller>(Some(user_with(&["Omborchilar"], false))).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check::<Admin>(Some(user_with(&["Sotuvchilar", "Omborchilar"], false))).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        assert!(matches!(check::<SalesStaff>(None).await, Err(AppError::InvalidToken)));
    }
}
