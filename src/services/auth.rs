// src/services/auth.rs

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, NewUser, Principal, RegisterUserPayload},
};

/// Quem resolve o token de uma requisição em um principal com papéis.
/// Injetado no `AppState`; os serviços só enxergam `Principal`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Principal, AppError>;
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            users,
            jwt_secret,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<String, AppError> {
        let password = payload.password;
        let cost = self.hash_cost;

        // Hashing é CPU-bound: roda fora do executor
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .users
            .create_user(NewUser {
                username: payload.username,
                first_name: payload.first_name.unwrap_or_default(),
                last_name: payload.last_name.unwrap_or_default(),
                email: payload.email.unwrap_or_default(),
                password_hash: Some(hashed_password),
            })
            .await?;

        tracing::info!(user_id = user.id, "Usuário registrado");

        self.create_token(user.id)
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Usuários criados como sub-recurso de cliente não têm senha
        let password_hash = user.password_hash.clone().ok_or(AppError::InvalidCredentials)?;
        let password = password.to_owned();

        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub fn create_token(&self, user_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

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
}

#[async_trait]
impl IdentityProvider for AuthService {
    async fn resolve(&self, token: &str) -> Result<Principal, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Token de usuário removido também é inválido
        let user = self
            .users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let roles = self.users.roles_of(user.id).await?;

        Ok(Principal {
            id: user.id,
            username: user.username,
            roles,
        })
    }
}
