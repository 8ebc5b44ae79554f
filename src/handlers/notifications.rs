// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::notifications::{Notification, NotificationFilter},
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationFilter),
    responses((status = 200, description = "Notificações do usuário", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(app_state.notification_service.list_for(&user, filter.unread).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = i64, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida", body = Notification),
        (status = 403, description = "Pertence a outro usuário"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(app_state.notification_service.mark_read(id, &user).await?))
}
