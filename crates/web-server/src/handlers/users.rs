use crate::{AppState, auth::AuthUser, error::AppError};
use crate::extract::Json;
use axum::extract::State;
use core_types::User;
use core_types::requests::UpdateProfile;
use std::sync::Arc;

/// # GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<User>, AppError> {
    let stored = state
        .store
        .get_user(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(stored))
}

/// # PUT /api/users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(update): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    update.validate()?;
    let mut stored = state
        .store
        .get_user(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if let Some(name) = update.display_name {
        stored.display_name = Some(name.trim().to_string());
    }
    Ok(Json(state.store.upsert_user(&stored).await?))
}
