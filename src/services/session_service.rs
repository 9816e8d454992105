use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{dummy_hash, hash_password_task, verify_password_task, JwtError, TokenIssuer};
use crate::database::models::User;
use crate::database::RepositoryState;
use crate::middleware::AuthUser;
use crate::types::Role;

use super::{is_blank, ServiceError, ServiceResult};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    /// Parsed leniently so the legacy `patiente` spelling is accepted
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Registration, login and token verification
#[derive(Clone)]
pub struct SessionService {
    repo: RepositoryState,
    tokens: TokenIssuer,
}

impl SessionService {
    pub fn new(repo: RepositoryState, tokens: TokenIssuer) -> Self {
        Self { repo, tokens }
    }

    pub async fn register(&self, input: RegisterInput) -> ServiceResult<Session> {
        let username = input.username.trim().to_string();
        let name = input.name.trim().to_string();
        let email = input.email.trim().to_string();

        if is_blank(&username) || is_blank(&input.password) || is_blank(&name) || is_blank(&email) {
            return Err(ServiceError::Validation(
                "Username, password, name and email are required".to_string(),
            ));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ServiceError::Validation(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let role: Role = input
            .role
            .parse()
            .map_err(|_| ServiceError::Validation("Role must be 'psychologist' or 'patient'".to_string()))?;

        let password_hash = hash_password_task(input.password).await?;
        let user = self
            .repo
            .insert_user(User::new(username, password_hash, name, email, role))
            .await?;

        info!(user_id = %user.id, role = %user.role, "registered user '{}'", user.username);
        self.session_for(user)
    }

    pub async fn login(&self, input: LoginInput) -> ServiceResult<Session> {
        let user = self.repo.find_user_by_username(input.username.trim()).await?;

        // Unknown usernames still pay for a hash check.
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| dummy_hash().to_string());
        let matched = verify_password_task(input.password, stored_hash).await;

        match user {
            Some(user) if matched => {
                info!(user_id = %user.id, "login succeeded for '{}'", user.username);
                self.session_for(user)
            }
            _ => {
                warn!("login failed for '{}'", input.username.trim());
                Err(ServiceError::Auth("Invalid credentials".to_string()))
            }
        }
    }

    /// Resolves a bearer token into the caller context used by every protected call.
    pub async fn verify(&self, token: &str) -> ServiceResult<AuthUser> {
        let claims = self.tokens.verify(token).map_err(|e| match e {
            JwtError::Expired => ServiceError::Auth("Token expired".to_string()),
            JwtError::InvalidSecret => ServiceError::Token(e),
            _ => ServiceError::Auth("Invalid token".to_string()),
        })?;

        let user = self
            .repo
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Auth("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }

    pub async fn whoami(&self, caller: &AuthUser) -> ServiceResult<User> {
        self.repo
            .find_user(caller.id)
            .await?
            .ok_or_else(|| ServiceError::Auth("User not found".to_string()))
    }

    fn session_for(&self, user: User) -> ServiceResult<Session> {
        let access_token = self.tokens.issue(&user)?;
        Ok(Session {
            access_token,
            expires_in: self.tokens.expires_in_secs(),
            user,
        })
    }
}
