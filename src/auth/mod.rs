/*!
 * # Session Module
 *
 * The inventory endpoints never authenticate anyone themselves. They consume a
 * [`SessionValidator`] that turns request headers into a [`SessionIdentity`]
 * (the caller's hospital) or a [`SessionError`] whose status and message are
 * returned to the client unchanged.
 *
 * The default validator checks HS256 session tokens carried either as
 * `Authorization: Bearer <token>` or as a `session` cookie.
 */

use crate::config::AppConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Name of the cookie checked when no bearer token is present.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller. `user_id` doubles as the hospital id that scopes
/// list, update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub hospital_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SessionError {
    pub status: StatusCode,
    pub message: String,
}

impl SessionError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        ServiceError::Session {
            status: err.status,
            message: err.message,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, headers: &HeaderMap) -> Result<SessionIdentity, SessionError>;
}

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,           // hospital / user id
    pub hospital_name: String, // display and lookup name
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtSessionValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtSessionValidator {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            &cfg.session_secret,
            cfg.session_issuer.clone(),
            cfg.session_audience.clone(),
        )
    }

    /// Mints a token for `user_id`. Used by the CLI and by tests; the HTTP
    /// surface never issues sessions.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        hospital_name: &str,
        ttl: Duration,
    ) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            hospital_name: hospital_name.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            SessionError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to sign session token: {}", e),
            )
        })
    }

    fn decode_token(&self, token: &str) -> Result<SessionIdentity, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    SessionError::unauthorized("Session expired")
                }
                _ => {
                    debug!(error = %e, "Session token rejected");
                    SessionError::unauthorized("Invalid session")
                }
            })?
            .claims;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| SessionError::unauthorized("Invalid session"))?;

        Ok(SessionIdentity {
            user_id,
            hospital_name: claims.hospital_name,
        })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, headers: &HeaderMap) -> Result<SessionIdentity, SessionError> {
        let token = extract_token(headers).ok_or_else(|| SessionError::unauthorized("Unauthorized"))?;
        self.decode_token(&token)
    }
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolves the session and stores the identity in request extensions.
/// Rejections are returned verbatim.
pub async fn session_middleware(
    State(validator): State<Arc<dyn SessionValidator>>,
    mut request: Request,
    next: Next,
) -> Response {
    match validator.validate(request.headers()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            warn!(status = %err.status, message = %err.message, "Session rejected");
            counter!("hospital_inventory.session.rejected", 1);
            ServiceError::from(err).into_response()
        }
    }
}

pub trait AuthRouterExt {
    fn with_session(self, validator: Arc<dyn SessionValidator>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_session(self, validator: Arc<dyn SessionValidator>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            validator,
            session_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Extension, Router};
    use http::HeaderValue;
    use tower::ServiceExt;

    const SECRET: &str = "a_session_secret_that_is_long_enough_for_hs256";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(SECRET, "hospital-inventory-auth", "hospital-inventory-api")
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn bearer_token_round_trips_identity() {
        let v = validator();
        let id = Uuid::new_v4();
        let token = v.issue_token(id, "St. Mary", Duration::hours(1)).unwrap();

        let identity = v.validate(&bearer(&token)).await.unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.hospital_name, "St. Mary");
    }

    #[tokio::test]
    async fn session_cookie_is_accepted() {
        let v = validator();
        let id = Uuid::new_v4();
        let token = v.issue_token(id, "General", Duration::hours(1)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={}", token)).unwrap(),
        );

        assert_eq!(v.validate(&headers).await.unwrap().user_id, id);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let err = validator().validate(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Unauthorized");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let v = validator();
        let token = v
            .issue_token(Uuid::new_v4(), "General", Duration::minutes(-10))
            .unwrap();

        let err = v.validate(&bearer(&token)).await.unwrap_err();
        assert_eq!(err.message, "Session expired");
    }

    #[tokio::test]
    async fn foreign_audience_is_rejected() {
        let other = JwtSessionValidator::new(SECRET, "hospital-inventory-auth", "billing");
        let token = other
            .issue_token(Uuid::new_v4(), "General", Duration::hours(1))
            .unwrap();

        let err = validator().validate(&bearer(&token)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid session");
    }

    async fn whoami(Extension(identity): Extension<SessionIdentity>) -> String {
        identity.hospital_name
    }

    #[tokio::test]
    async fn middleware_passes_rejection_through() {
        let mut mock = MockSessionValidator::new();
        mock.expect_validate()
            .times(1)
            .returning(|_| Err(SessionError::new(StatusCode::FORBIDDEN, "Session revoked")));

        let app = Router::new()
            .route("/whoami", get(whoami))
            .with_session(Arc::new(mock));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Session revoked");
    }

    #[tokio::test]
    async fn middleware_exposes_identity_to_handlers() {
        let mut mock = MockSessionValidator::new();
        mock.expect_validate().returning(|_| {
            Ok(SessionIdentity {
                user_id: Uuid::nil(),
                hospital_name: "Riverside".into(),
            })
        });

        let app = Router::new()
            .route("/whoami", get(whoami))
            .with_session(Arc::new(mock));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Riverside");
    }
}
