/// Identity middleware for protecting routes
///
/// Extracts and verifies the token from the Authorization header.
/// On success, adds the authenticated user to request extensions; on
/// failure the request is answered with 401 before reaching a handler.
use super::jwt::TokenService;
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Message returned when no usable credential was sent
pub const NO_TOKEN_MESSAGE: &str = "No token provided!";

/// Authenticated user information extracted from the token
///
/// Handlers extract it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub user_id: Uuid,
    /// User's email address
    pub email: String,
}

/// Identity middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => {
                AppError::Unauthenticated(NO_TOKEN_MESSAGE.to_string())
            }
            AuthError::InvalidToken => AppError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Resolve the caller's identity from request headers
///
/// 1. The Authorization header must be present
/// 2. Its value must be exactly two space-separated parts (scheme, credential)
/// 3. The credential must verify and carry a user id as subject
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parts: Vec<&str> = auth_header.split(' ').collect();
    let [_scheme, token] = parts.as_slice() else {
        return Err(AuthError::InvalidAuthHeader);
    };

    let claims = tokens.verify(token).map_err(|_| AuthError::InvalidToken)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
    })
}

/// Authentication middleware that requires a valid token
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use postboard_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match authenticate(request.headers(), &state.tokens) {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AuthError::InvalidToken) {
                audit_log(&AuditEvent::InvalidToken {
                    ip_address: extract_ip_address(request.headers()),
                    user_agent: extract_user_agent(request.headers()),
                    reason: e.to_string(),
                });
            }
            return Err(e);
        }
    };

    tracing::debug!(user_id = %user.user_id, "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use axum::http::HeaderValue;

    fn headers_with(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    fn tokens() -> TokenService {
        TokenService::new(JwtConfig::default())
    }

    #[test]
    fn test_rejects_missing_header() {
        let err = authenticate(&headers_with(None), &tokens()).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthHeader));

        let app_err = AppError::from(err);
        assert_eq!(app_err.to_string(), "No token provided!");
    }

    #[test]
    fn test_rejects_single_word_header() {
        let err = authenticate(&headers_with(Some("xyz")), &tokens()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthHeader));

        let app_err = AppError::from(err);
        assert_eq!(app_err.to_string(), "No token provided!");
    }

    #[test]
    fn test_rejects_three_part_header() {
        let err = authenticate(&headers_with(Some("Bearer a b")), &tokens()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthHeader));
    }

    #[test]
    fn test_rejects_unverifiable_token() {
        let err =
            authenticate(&headers_with(Some("Bearer invalidtoken")), &tokens()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        assert!(matches!(AppError::from(err), AppError::InvalidToken));
    }

    #[test]
    fn test_yields_user_id_for_valid_token() {
        let service = tokens();
        let user_id = Uuid::new_v4();
        let token = service.issue(user_id, "test@test.com").unwrap();

        let user = authenticate(&headers_with(Some(&format!("Bearer {token}"))), &service)
            .expect("token should verify");

        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "test@test.com");
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let config = JwtConfig::default();
        let claims = crate::auth::jwt::Claims {
            iss: config.issuer.clone(),
            sub: "abc".to_string(),
            email: "test@test.com".to_string(),
            iat: 0,
            exp: u64::MAX / 2,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let err = authenticate(&headers_with(Some(&format!("Bearer {token}"))), &tokens())
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
