// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::Storage,
    models::auth::{Claims, NewUser, RegisterUserPayload, RequestContext, Role, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

// Custo mínimo nos testes, senão cada registro leva segundos em debug
const BCRYPT_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

#[derive(Clone)]
pub struct AuthService {
    storage: Arc<dyn Storage>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(storage: Arc<dyn Storage>, jwt_secret: String) -> Self {
        Self { storage, jwt_secret }
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<String, AppError> {
        // Hashing é CPU-bound: fora do runtime
        let password = payload.password;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, BCRYPT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .storage
            .create_user(NewUser {
                email: payload.email.trim().to_lowercase(),
                name: payload.name.trim().to_string(),
                role: payload.role.unwrap_or(Role::Customer),
                password_hash: hashed_password,
            })
            .await?;

        tracing::info!("👤 Usuário {} registrado ({:?})", user.id, user.role);
        self.create_token(&user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .storage
            .find_user_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Decodifica o token e confere que o usuário ainda existe.
    pub async fn validate_token(&self, token: &str) -> Result<RequestContext, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .storage
            .find_user_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // O papel vem do banco, não do token (pode ter mudado)
        Ok(RequestContext { user_id: user.id, role: user.role })
    }

    pub async fn me(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.storage
            .find_user_by_id(ctx.user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user.id,
            role: user.role,
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

// Só para testes de outras camadas que precisam de um token válido.
#[cfg(test)]
pub(crate) fn token_for(secret: &str, user_id: uuid::Uuid, role: Role) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        exp: (now + chrono::Duration::days(1)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStorage;
    use uuid::Uuid;

    fn service() -> AuthService {
        AuthService::new(Arc::new(InMemoryStorage::new()), "segredo-de-teste".into())
    }

    fn payload(email: &str, role: Option<Role>) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.into(),
            password: "senha123".into(),
            name: "Ana".into(),
            role,
        }
    }

    #[tokio::test]
    async fn register_then_login_yields_valid_tokens() {
        let auth = service();
        let token = auth.register_user(payload("Ana@Email.com", Some(Role::ShopOwner))).await.unwrap();
        let ctx = auth.validate_token(&token).await.unwrap();
        assert_eq!(ctx.role, Role::ShopOwner);

        let again = auth.login_user("ana@email.com", "senha123").await.unwrap();
        assert_eq!(auth.validate_token(&again).await.unwrap(), ctx);
        assert_eq!(auth.me(&ctx).await.unwrap().email, "ana@email.com");
    }

    #[tokio::test]
    async fn role_defaults_to_customer() {
        let auth = service();
        let token = auth.register_user(payload("bia@email.com", None)).await.unwrap();
        assert_eq!(auth.validate_token(&token).await.unwrap().role, Role::Customer);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service();
        auth.register_user(payload("ana@email.com", None)).await.unwrap();
        assert!(matches!(
            auth.register_user(payload("ANA@email.com", None)).await,
            Err(AppError::EmailAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_email_are_invalid_credentials() {
        let auth = service();
        auth.register_user(payload("ana@email.com", None)).await.unwrap();
        assert!(matches!(
            auth.login_user("ana@email.com", "errada99").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login_user("ninguem@email.com", "senha123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let auth = service();
        assert!(matches!(auth.validate_token("lixo").await, Err(AppError::InvalidToken)));

        let foreign = token_for("outro-segredo", Uuid::new_v4(), Role::Customer);
        assert!(matches!(auth.validate_token(&foreign).await, Err(AppError::InvalidToken)));

        // assinatura certa, usuário inexistente
        let orphan = token_for("segredo-de-teste", Uuid::new_v4(), Role::Customer);
        assert!(matches!(auth.validate_token(&orphan).await, Err(AppError::UserNotFound)));
    }
}
