// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "dilshod")]
    pub username: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub email: String,
    pub first_name: String,
    pub last_name: String,

    // Administrador: passa por qualquer guarda de papel
    pub is_staff: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Group {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Sotuvchilar")]
    pub name: String,
}

/// Papéis de negócio. Cada papel é a filiação a um grupo com nome fixo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Seller,
    Warehouse,
    Accountant,
}

impl Role {
    pub const fn group_name(self) -> &'static str {
        match self {
            Role::Seller => "Sotuvchilar",
            Role::Warehouse => "Omborchilar",
            Role::Accountant => "Buxgalterlar",
        }
    }
}

// Usuário + grupos (o que a API devolve e o que o middleware carrega)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithGroups {
    #[serde(flatten)]
    pub user: User,
    pub groups: Vec<Group>,
}

impl UserWithGroups {
    pub fn is_admin(&self) -> bool {
        self.user.is_staff
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.groups.iter().any(|g| g.name == role.group_name())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    #[schema(example = "admin")]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// --- Cadastro de usuários (somente administrador) ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 150, message = "O usuário deve ter entre 1 e 150 caracteres."))]
    #[schema(example = "sotuvchi1")]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    #[schema(example = json!([1]))]
    pub groups: Vec<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 150, message = "O usuário deve ter entre 1 e 150 caracteres."))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub groups: Option<Vec<i32>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do usuário
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn user_with(groups: &[&str], is_staff: bool) -> UserWithGroups {
        let now = Utc::now();
        UserWithGroups {
            user: User {
                id: Uuid::new_v4(),
                username: "tester".into(),
                password_hash: String::new(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                is_staff,
                created_at: now,
                updated_at: now,
            },
            groups: groups
                .iter()
                .enumerate()
                .map(|(i, name)| Group { id: i as i32 + 1, name: name.to_string() })
                .collect(),
        }
    }

    #[test]
    fn roles_come_from_group_names() {
        let user = user_with(&["Sotuvchilar"], false);
        assert!(user.has_role(Role::Seller));
        assert!(!user.has_role(Role::Warehouse));
        assert!(!user.is_admin());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut user = user_with(&[], true);
        user.user.password_hash = "$2b$12$segredo".into();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isStaff"], true);
        assert!(json["groups"].as_array().unwrap().is_empty());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let payload: CreateUserPayload =
            serde_json::from_value(serde_json::json!({ "username": "ali", "password": "123" })).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let update = UpdateUserPayload { password: Some("12345".into()), ..Default::default() };
        assert!(update.validate().is_err());
        assert!(UpdateUserPayload::default().validate().is_ok());
    }
}

#[cfg(test)]
pub(crate) use tests::user_with;
