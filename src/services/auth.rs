use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;

use crate::{
    config::AuthConfig,
    dto::auth::{Claims, LoginRequest, RegisterRequest},
    error::{AppError, AppResult},
    models::user::{AuthUser, User},
    store::{StoreError, UserStore},
};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    token_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            jwt_secret: config.secret.clone(),
            token_hours: config.token_hours,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let id = user
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot issue a token for an unsaved user"))?;
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_hours);

        let claims = Claims {
            id: id.to_hex(),
            role: user.role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .context("Token generation failed")?;

        Ok(token)
    }

    /// Verifies signature and expiry and returns the identity the token carries.
    pub fn validate_token(&self, token: &str) -> AppResult<AuthUser> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        let id = ObjectId::parse_str(&token_data.claims.id)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(AuthUser {
            id,
            role: token_data.claims.role,
        })
    }

    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("Password hashing task failed")?
            .context("Password hashing failed")?;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let (password, hash) = (password.to_string(), hash.to_string());
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("Password verification task failed")?
            // an unparsable stored hash simply does not match
            .unwrap_or(false);
        Ok(matched)
    }

    /// Creates a `user` account. A client-supplied role is ignored.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_string();
        if name.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "User validation failed: name, email and password are required".to_string(),
            ));
        }
        if let Some(role) = request.role.as_deref() {
            tracing::warn!("Ignoring requested role {:?} for {}", role, email);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let hash = self.hash_password(&request.password).await?;
        let user = self
            .users
            .insert(User::new(name, email, hash))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::Conflict("Email already registered".to_string()),
                other => other.into(),
            })?;

        tracing::info!("User registered: {}", user.email);
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, User)> {
        let email = request.email.trim();
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.verify_password(&request.password, &user.password).await? {
            tracing::debug!("Login failed: password mismatch for {}", email);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.generate_token(&user)?;
        tracing::info!("Login successful for {}", user.email);
        Ok((token, user))
    }

    pub async fn profile(&self, caller: &AuthUser) -> AppResult<User> {
        self.users
            .find_by_id(&caller.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, models::user::Role, store::memory::MemoryUserStore};

    fn service() -> AuthService {
        let mut config = AppConfig::default().auth;
        config.bcrypt_cost = 4;
        AuthService::new(Arc::new(MemoryUserStore::default()), &config)
    }

    #[tokio::test]
    async fn token_roundtrip_carries_id_and_role() {
        let auth = service();
        let mut user = User::new("Ann".into(), "ann@example.com".into(), "x".into());
        user.id = Some(ObjectId::new());
        user.role = Role::Admin;

        let token = auth.generate_token(&user).unwrap();
        let identity = auth.validate_token(&token).unwrap();
        assert_eq!(Some(identity.id), user.id);
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn expired_or_foreign_tokens_are_rejected() {
        let auth = service();
        let claims = Claims {
            id: ObjectId::new().to_hex(),
            role: Role::User,
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
            iat: (Utc::now() - Duration::hours(26)).timestamp() as usize,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"library-server-dev-secret"),
        )
        .unwrap();
        assert!(matches!(auth.validate_token(&expired), Err(AppError::Unauthorized(_))));

        let foreign = encode(
            &Header::default(),
            &Claims { exp: (Utc::now() + Duration::hours(1)).timestamp() as usize, ..claims },
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();
        assert!(matches!(auth.validate_token(&foreign), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn register_ignores_requested_role() {
        let auth = service();
        let user = auth
            .register(RegisterRequest {
                name: "Eve".into(),
                email: "eve@example.com".into(),
                password: "secret".into(),
                role: Some("admin".into()),
            })
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password, "secret");
    }
}
