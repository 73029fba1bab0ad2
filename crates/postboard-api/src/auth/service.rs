//! Authentication service layer
//!
//! Signup and login. Neither keeps session state: signup stores a user with
//! a hashed password, login checks the password and hands out a token.

use super::jwt::TokenService;
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use postboard_core::{CoreError, NewUser, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Returned for every failed login so callers cannot tell which accounts exist
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// User signup request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "Please enter a valid email."))]
    #[schema(example = "test@test.com")]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters long."))]
    pub password: String,

    #[validate(length(min = 1, message = "Name must not be empty."))]
    #[schema(example = "Test")]
    pub name: String,
}

impl SignupRequest {
    /// Trim fields and lowercase the email before validation
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_lowercase(),
            password: self.password.trim().to_string(),
            name: self.name.trim().to_string(),
        }
    }
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "test@test.com")]
    pub email: String,
    pub password: String,
}

/// Signup response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

/// Login response with the access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    password_config: PasswordConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, password_config: PasswordConfig) -> Self {
        Self {
            store,
            tokens,
            password_config,
        }
    }

    /// Register a new user
    ///
    /// * `ValidationFailed` - malformed email, short password or empty name
    /// * `Conflict` - the email is already registered
    pub async fn signup(
        &self,
        request: SignupRequest,
        client: &ClientInfo,
    ) -> Result<SignupResponse, AppError> {
        let request = request.normalized();

        if let Err(errors) = request.validate() {
            audit_log(&AuditEvent::SignupFailure {
                email: request.email.clone(),
                reason: "validation failed".to_string(),
                ip_address: client.ip_address.clone(),
                user_agent: client.user_agent.clone(),
            });
            return Err(AppError::invalid_input(&errors));
        }

        let config = self.password_config.clone();
        let password = request.password;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
                .await
                .map_err(|e| AppError::Unexpected(format!("Hashing task failed: {e}")))?
                .map_err(|e| AppError::Unexpected(e.to_string()))?;

        let user = match self
            .store
            .insert_user(NewUser {
                email: request.email.clone(),
                name: request.name,
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(e) => {
                if matches!(e, CoreError::DuplicateEmail(_)) {
                    audit_log(&AuditEvent::SignupFailure {
                        email: request.email,
                        reason: "email already exists".to_string(),
                        ip_address: client.ip_address.clone(),
                        user_agent: client.user_agent.clone(),
                    });
                }
                return Err(e.into());
            }
        };

        audit_log(&AuditEvent::SignupSuccess {
            user_id: user.id,
            email: user.email.clone(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(SignupResponse {
            message: "User created!".to_string(),
            user_id: user.id,
        })
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password both fail with the same
    /// `Unauthorized` message; only the audit log records which it was.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<LoginResponse, AppError> {
        let email = request.email.trim().to_lowercase();

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(self.login_failed(email, "user not found", client));
        };

        let password = request.password.trim().to_string();
        let stored_hash = user.password_hash.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| AppError::Unexpected(format!("Verification task failed: {e}")))?
                .map_err(|e| AppError::Unexpected(e.to_string()))?;

        if !password_valid {
            return Err(self.login_failed(email, "wrong password", client));
        }

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(|e| AppError::Unexpected(format!("Failed to issue token: {e}")))?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            email: user.email,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });

        Ok(LoginResponse {
            token,
            user_id: user.id,
        })
    }

    fn login_failed(&self, email: String, reason: &str, client: &ClientInfo) -> AppError {
        audit_log(&AuditEvent::LoginFailure {
            email,
            reason: reason.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        });
        AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }
}
