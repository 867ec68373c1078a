use super::saves::owned_save;
use crate::{
    AppState,
    auth::{AdminUser, AuthUser},
    error::AppError,
};
use crate::extract::{Json, Path, Query};
use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use core_types::requests::{GoalProgress, NewChallenge, StartChallenge};
use core_types::{Challenge, SaveChallenge};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub game_id: Option<i32>,
}

/// # GET /api/challenges?game_id=
pub async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChallengeQuery>,
) -> Result<Json<Vec<Challenge>>, AppError> {
    Ok(Json(state.store.list_challenges(query.game_id).await?))
}

/// # GET /api/challenges/:challenge_id
pub async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<Challenge>, AppError> {
    let challenge = state
        .store
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::not_found("Challenge"))?;
    Ok(Json(challenge))
}

/// # POST /api/challenges (admin)
pub async fn create_challenge(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<NewChallenge>,
) -> Result<(StatusCode, Json<Challenge>), AppError> {
    request.validate()?;
    if let Some(game_id) = request.game_id {
        if state.store.get_game(game_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("unknown game {game_id}")));
        }
    }
    for group_id in request.goals.iter().filter_map(|g| g.competition_group_id) {
        if state.store.get_competition_group(group_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("unknown competition {group_id}")));
        }
    }

    let challenge = request.into_challenge(Utc::now());
    state.store.create_challenge(&challenge).await?;
    tracing::info!(admin = %admin.id, challenge_id = %challenge.id, "Created challenge.");
    Ok((StatusCode::CREATED, Json(challenge)))
}

/// # DELETE /api/challenges/:challenge_id (admin)
pub async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(challenge_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_challenge(challenge_id).await? {
        return Err(AppError::not_found("Challenge"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/saves/:save_id/challenges
pub async fn list_save_challenges(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<Json<Vec<SaveChallenge>>, AppError> {
    owned_save(&state, &user, save_id).await?;
    Ok(Json(state.store.list_save_challenges(save_id).await?))
}

/// # POST /api/saves/:save_id/challenges
pub async fn start_challenge(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
    Json(request): Json<StartChallenge>,
) -> Result<(StatusCode, Json<SaveChallenge>), AppError> {
    let save = owned_save(&state, &user, save_id).await?;
    let challenge = state
        .store
        .get_challenge(request.challenge_id)
        .await?
        .ok_or_else(|| AppError::not_found("Challenge"))?;
    if challenge.game_id.is_some_and(|game_id| game_id != save.game_id) {
        return Err(AppError::BadRequest("challenge is for a different game".into()));
    }
    if state.store.get_save_challenge(save_id, challenge.id).await?.is_some() {
        return Err(AppError::Conflict("challenge already started for this save".into()));
    }

    let progress = SaveChallenge::start(save_id, challenge.id, Utc::now());
    state.store.upsert_save_challenge(&progress).await?;
    Ok((StatusCode::CREATED, Json(progress)))
}

/// # PUT /api/saves/:save_id/challenges/:challenge_id/goals/:goal_id
pub async fn set_goal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((save_id, challenge_id, goal_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(request): Json<GoalProgress>,
) -> Result<Json<SaveChallenge>, AppError> {
    owned_save(&state, &user, save_id).await?;
    let mut progress = state
        .store
        .get_save_challenge(save_id, challenge_id)
        .await?
        .ok_or_else(|| AppError::not_found("Challenge progress"))?;
    let challenge = state
        .store
        .get_challenge(challenge_id)
        .await?
        .ok_or_else(|| AppError::not_found("Challenge"))?;

    progress.set_goal(&challenge, goal_id, request.completed, Utc::now())?;
    state.store.upsert_save_challenge(&progress).await?;
    Ok(Json(progress))
}
