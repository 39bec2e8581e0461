//! JWT authentication
//!
//! Issues HS256 access tokens on registration and login, and checks them on
//! protected routes. Logout revokes a token by its `jti`.

use anyhow::{anyhow, bail, Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::server::ServerState;
use crate::types::{Role, UserStatus};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Token ID for revocation
    pub jti: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }

    /// The caller must be `user_id` or an admin
    pub fn require_self_or_admin(&self, user_id: &str) -> ApiResult<()> {
        if self.sub == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not allowed to act for another user"))
        }
    }
}

/// Authentication settings resolved at startup
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT secret key (should be 256-bit for HS256)
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
    /// Failed logins before an email is locked out
    pub max_login_attempts: u32,
    pub lockout_duration_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_jwt_secret(),
            access_token_expiry_minutes: 60,
            max_login_attempts: 5,
            lockout_duration_minutes: 30,
        }
    }
}

/// Token issuing, revocation and login throttling
pub struct AuthState {
    config: AuthConfig,
    /// Revoked token IDs (for logout)
    revoked_tokens: RwLock<HashMap<String, DateTime<Utc>>>,
    /// Failed login attempts keyed by email
    login_attempts: RwLock<HashMap<String, (u32, DateTime<Utc>)>>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            revoked_tokens: RwLock::new(HashMap::new()),
            login_attempts: RwLock::new(HashMap::new()),
        })
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::minutes(self.config.access_token_expiry_minutes)
    }

    /// Sign an access token for `user`
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.token_lifetime()).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .context("Failed to encode JWT")
    }

    /// Validate and decode token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .context("Invalid token")?;

        if self.is_token_revoked(&token_data.claims.jti) {
            bail!("Token has been revoked");
        }
        Ok(token_data.claims)
    }

    /// Revoke a token (logout). Entries older than a token's lifetime are
    /// dropped since those tokens have expired anyway.
    pub fn revoke_token(&self, jti: &str) {
        let now = Utc::now();
        let lifetime = self.token_lifetime();
        let mut revoked = self.revoked_tokens.write().unwrap_or_else(PoisonError::into_inner);
        revoked.retain(|_, revoked_at| now - *revoked_at <= lifetime);
        revoked.insert(jti.to_string(), now);
    }

    fn is_token_revoked(&self, jti: &str) -> bool {
        let revoked = self.revoked_tokens.read().unwrap_or_else(PoisonError::into_inner);
        revoked.contains_key(jti)
    }

    /// Record failed login attempt. Attempts older than the lockout window
    /// are forgotten, so a lockout that has run out starts the count again.
    pub fn record_failed_login(&self, identifier: &str) {
        let now = Utc::now();
        let lockout = Duration::minutes(self.config.lockout_duration_minutes);
        let mut attempts = self.login_attempts.write().unwrap_or_else(PoisonError::into_inner);
        attempts.retain(|_, (_, last_attempt)| now - *last_attempt < lockout);
        let entry = attempts.entry(identifier.to_string()).or_insert((0, now));
        entry.0 += 1;
        entry.1 = now;
    }

    /// Remaining lockout time, if the identifier is locked
    pub fn is_locked(&self, identifier: &str) -> Option<Duration> {
        let attempts = self.login_attempts.read().unwrap_or_else(PoisonError::into_inner);
        let (count, last_attempt) = attempts.get(identifier)?;
        if *count < self.config.max_login_attempts {
            return None;
        }
        let lockout_end = *last_attempt + Duration::minutes(self.config.lockout_duration_minutes);
        let now = Utc::now();
        (now < lockout_end).then(|| lockout_end - now)
    }

    /// Clear login attempts (on successful login)
    pub fn clear_login_attempts(&self, identifier: &str) {
        let mut attempts = self.login_attempts.write().unwrap_or_else(PoisonError::into_inner);
        attempts.remove(identifier);
    }
}

/// Generate a secure JWT secret
pub fn generate_jwt_secret() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Argon2id hash in PHC string form
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid hash format: {}", e))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => bail!("Failed to verify password: {}", e),
    }
}

/// Pull the bearer token out of a request
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Axum middleware for JWT authentication. The token's account must still
/// exist and be active. Valid claims are added to the request extensions
/// for handlers.
pub async fn auth_middleware(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    let claims = state.auth_state.validate_token(token).map_err(|e| {
        tracing::debug!("Rejected token: {:#}", e);
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    match state.store.user_by_id(&claims.sub).await? {
        None => return Err(ApiError::Unauthorized("Invalid or expired token".into())),
        Some(user) if user.status == UserStatus::Inactive => {
            return Err(ApiError::forbidden("Account is inactive"));
        }
        Some(_) => {}
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::account;

    #[test]
    fn test_jwt_generation_and_validation() {
        let state = AuthState::new(AuthConfig::default());
        let user = account("sarah", Role::Instructor);

        let token = state.issue_token(&user).unwrap();
        let claims = state.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "sarah");
        assert_eq!(claims.email, "sarah@example.com");
        assert_eq!(claims.role, Role::Instructor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_revocation() {
        let state = AuthState::new(AuthConfig::default());
        let token = state.issue_token(&account("lee", Role::Learner)).unwrap();
        let claims = state.validate_token(&token).unwrap();

        state.revoke_token(&claims.jti);
        assert!(state.validate_token(&token).is_err());
    }

    #[test]
    fn test_foreign_and_expired_tokens_rejected() {
        let state = AuthState::new(AuthConfig::default());
        let other = AuthState::new(AuthConfig::default());
        let token = other.issue_token(&account("lee", Role::Learner)).unwrap();
        assert!(state.validate_token(&token).is_err());

        let stale = AuthState::new(AuthConfig {
            access_token_expiry_minutes: -10,
            ..AuthConfig::default()
        });
        let token = stale.issue_token(&account("lee", Role::Learner)).unwrap();
        assert!(stale.validate_token(&token).is_err());
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let state = AuthState::new(AuthConfig {
            max_login_attempts: 3,
            ..AuthConfig::default()
        });

        for _ in 0..2 {
            state.record_failed_login("lee@example.com");
        }
        assert!(state.is_locked("lee@example.com").is_none());

        state.record_failed_login("lee@example.com");
        assert!(state.is_locked("lee@example.com").is_some());
        assert!(state.is_locked("other@example.com").is_none());

        state.clear_login_attempts("lee@example.com");
        assert!(state.is_locked("lee@example.com").is_none());
    }

    #[test]
    fn test_stale_login_attempts_are_pruned() {
        let state = AuthState::new(AuthConfig::default());
        let long_ago = Utc::now() - Duration::minutes(31);
        {
            let mut attempts = state.login_attempts.write().unwrap();
            for i in 0..100 {
                attempts.insert(format!("ghost{}@example.com", i), (1, long_ago));
            }
            attempts.insert("locked@example.com".into(), (5, long_ago));
        }

        state.record_failed_login("lee@example.com");
        let attempts = state.login_attempts.read().unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts.get("lee@example.com").map(|a| a.0), Some(1));
    }

    #[test]
    fn test_expired_lockout_starts_count_again() {
        let state = AuthState::new(AuthConfig {
            max_login_attempts: 2,
            ..AuthConfig::default()
        });
        state
            .login_attempts
            .write()
            .unwrap()
            .insert("lee@example.com".into(), (2, Utc::now() - Duration::minutes(45)));
        assert!(state.is_locked("lee@example.com").is_none());

        state.record_failed_login("lee@example.com");
        assert!(state.is_locked("lee@example.com").is_none());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("my_secure_password").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("my_secure_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert_ne!(hash, hash_password("my_secure_password").unwrap());
        assert!(verify_password("x", "salt$hash").is_err());
    }

    #[test]
    fn test_claim_permissions() {
        let state = AuthState::new(AuthConfig::default());
        let admin = state
            .validate_token(&state.issue_token(&account("root", Role::Admin)).unwrap())
            .unwrap();
        let learner = state
            .validate_token(&state.issue_token(&account("lee", Role::Learner)).unwrap())
            .unwrap();

        assert!(admin.require_admin().is_ok());
        assert!(admin.require_self_or_admin("lee").is_ok());
        assert!(learner.require_self_or_admin("lee").is_ok());
        assert!(matches!(learner.require_self_or_admin("sam"), Err(ApiError::Forbidden(_))));
        assert!(matches!(learner.require_admin(), Err(ApiError::Forbidden(_))));
    }
}
