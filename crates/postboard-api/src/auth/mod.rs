//! Authentication and identity
//!
//! This module provides token-based authentication with the following components:
//! - Password hashing with Argon2
//! - Token issuance and verification
//! - Signup and login flow
//! - Middleware resolving the caller's identity per request

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtConfig, TokenError, TokenService};
pub use middleware::{auth_middleware, authenticate, AuthError, AuthenticatedUser};
pub use password::{hash_password, hash_password_with_config, verify_password, PasswordConfig};
pub use service::{AuthService, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
