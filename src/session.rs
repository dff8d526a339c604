use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::{AppConfig, Env};

/// Headers accepted by the local development bypass.
pub const DEV_EMAIL_HEADER: &str = "x-user-email";
pub const DEV_ROLE_HEADER: &str = "x-user-role";

/// Claims
///
/// Payload of a session token. `roleName` is the authorization tier checked by the gate.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's identifier at the auth provider.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, rename = "roleName", skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Session
///
/// Request-scoped identity handed to the gate. Read only; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<SessionUser>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: Option<String>,
    pub role_name: Option<String>,
}

impl Session {
    pub fn for_user(email: Option<String>, role_name: Option<String>) -> Self {
        Self {
            user: Some(SessionUser { email, role_name }),
            expires_at: None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.email.as_deref())
    }

    pub fn role_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.role_name.as_deref())
    }
}

/// Why a session could not be resolved. Logged only; callers see a denial.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("session token has expired")]
    Expired,
    #[error("session token is invalid: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// SessionResolver
///
/// Contract consumed by the access gate. `Ok(None)` means the request carries no session.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, ResolveError>;
}

pub type SessionResolverState = Arc<dyn SessionResolver>;

/// JwtSessionResolver
///
/// Resolves sessions from HS256 tokens, taken from `Authorization: Bearer` first and the
/// session cookie second.
///
/// The `x-user-email`/`x-user-role` development bypass is off unless explicitly enabled,
/// is never honoured in `Env::Production`, and is skipped whenever the request carries an
/// `Authorization` header or the session cookie.
pub struct JwtSessionResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    env: Env,
    dev_bypass: bool,
}

impl JwtSessionResolver {
    pub fn new(secret: &str, cookie_name: impl Into<String>, env: Env) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.into(),
            env,
            dev_bypass: false,
        }
    }

    /// Opts into the header bypass. Has no effect in production.
    pub fn with_dev_bypass(mut self, enabled: bool) -> Self {
        self.dev_bypass = enabled && !self.env.is_production();
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.session_cookie.clone(), config.env)
            .with_dev_bypass(config.dev_bypass)
    }

    fn dev_session(&self, headers: &HeaderMap) -> Option<Session> {
        if !self.dev_bypass {
            return None;
        }
        let email = header_str(headers, DEV_EMAIL_HEADER);
        let role = header_str(headers, DEV_ROLE_HEADER);
        if email.is_none() && role.is_none() {
            return None;
        }
        tracing::debug!(email = ?email, role = ?role, "session synthesized from dev headers");
        Some(Session::for_user(email, role))
    }

    fn token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if let Some(bearer) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        {
            return Some(bearer);
        }

        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, ResolveError> {
        let Some(token) = self.token(headers) else {
            // Credentials of any kind rule out the bypass, even when they are unusable.
            if headers.contains_key(header::AUTHORIZATION) {
                return Ok(None);
            }
            return Ok(self.dev_session(headers));
        };

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ResolveError::Expired,
                _ => ResolveError::InvalidToken(e),
            }
        })?;

        let claims = data.claims;
        Ok(Some(Session {
            user: Some(SessionUser {
                email: claims.email,
                role_name: claims.role_name,
            }),
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0),
        }))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
