// src/models/auth.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Idade a partir da qual um filme fica bloqueado para o perfil Infantil.
pub const CHILD_CENSURE_AGE: i32 = 14;

/// Papéis conhecidos, derivados dos grupos do usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
pub enum Role {
    Seller,
    Child,
}

impl Role {
    pub fn group_name(self) -> &'static str {
        match self {
            Role::Seller => "Vendedor",
            Role::Child => "Infantil",
        }
    }

    /// Grupos desconhecidos não viram papel.
    pub fn from_group_name(name: &str) -> Option<Self> {
        match name {
            "Vendedor" => Some(Role::Seller),
            "Infantil" => Some(Role::Child),
            _ => None,
        }
    }
}

/// O ator autenticado de uma requisição.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_seller(&self) -> bool {
        self.has_role(Role::Seller)
    }

    /// Perfil Infantil não acessa filmes com censura >= 14.
    pub fn may_watch(&self, censure: i32) -> bool {
        !(self.has_role(Role::Child) && censure >= CHILD_CENSURE_AGE)
    }
}

// Usuário completo, como está no banco. Nunca é serializado.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// Perfil público do usuário (o sub-recurso aninhado do cliente).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

// Entrada do repositório para criar um usuário
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalView {
    pub id: i64,
    pub username: String,
    pub roles: Vec<Role>,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username.clone(),
            roles: principal.roles.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 150, message = "Informe um nome de usuário de até 150 caracteres."))]
    #[schema(example = "jordan")]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "Informe o nome de usuário."))]
    pub username: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // ID do usuário
    pub exp: usize, // Expiração
    pub iat: usize, // Emissão
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_map_to_roles() {
        assert_eq!(Role::from_group_name("Vendedor"), Some(Role::Seller));
        assert_eq!(Role::from_group_name("Infantil"), Some(Role::Child));
        assert_eq!(Role::from_group_name("vendedor"), None);
        assert_eq!(Role::Seller.group_name(), "Vendedor");
    }

    #[test]
    fn child_is_blocked_from_age_fourteen() {
        let child = Principal {
            id: 1,
            username: "kid".into(),
            roles: [Role::Child].into_iter().collect(),
        };
        assert!(child.may_watch(13));
        assert!(!child.may_watch(14));
        assert!(!child.may_watch(18));

        let adult = Principal {
            id: 2,
            username: "adult".into(),
            roles: BTreeSet::new(),
        };
        assert!(adult.may_watch(18));
    }
}
