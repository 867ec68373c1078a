//! Bearer-token authentication.

use crate::{AppState, error::AppError};
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::Utc;
use configuration::AuthSettings;
use core_types::{User, UserRole};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// The claims the server reads from an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
    admin_uids: HashSet<String>,
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        let key = if settings.jwt_secret.is_empty() {
            tracing::warn!("No JWT secret configured; every authenticated route will answer 401.");
            None
        } else {
            Some(DecodingKey::from_secret(settings.jwt_secret.as_bytes()))
        };

        let mut validation = Validation::new(Algorithm::HS256);
        match &settings.project_id {
            Some(project) => {
                validation.set_audience(&[project]);
                validation.set_issuer(&[format!("https://securetoken.google.com/{project}")]);
            }
            None => validation.validate_aud = false,
        }

        Self {
            key,
            validation,
            admin_uids: settings.admin_uids.iter().cloned().collect(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("authentication is not configured".into()))?;
        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token.");
            AppError::Unauthorized("invalid or expired token".into())
        })?;
        Ok(data.claims)
    }

    fn is_admin_uid(&self, uid: &str) -> bool {
        self.admin_uids.contains(uid)
    }
}

/// The authenticated caller. The matching user row is created on first sight.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub is_admin: bool,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".into()))?;

        let claims = state.verifier.verify(token.trim())?;
        let user = match state.store.get_user(&claims.sub).await? {
            Some(user) => user,
            None => {
                let user = User {
                    id: claims.sub.clone(),
                    email: claims.email.clone(),
                    display_name: claims.name.clone(),
                    role: UserRole::User,
                    created_at: Utc::now(),
                };
                tracing::info!(user_id = %user.id, "Registering new user.");
                state.store.upsert_user(&user).await?
            }
        };

        let is_admin =
            claims.admin || user.role == UserRole::Admin || state.verifier.is_admin_uid(&user.id);
        Ok(AuthUser { id: user.id, is_admin })
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("admin role required".into()));
        }
        Ok(AdminUser(user))
    }
}
