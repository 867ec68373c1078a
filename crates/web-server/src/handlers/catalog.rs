//! Reference data: games, countries, teams and the competition taxonomy.

use super::SearchQuery;
use crate::{AppState, auth::AdminUser, error::AppError};
use crate::extract::{Json, Path, Query};
use axum::{extract::State, http::StatusCode};
use core_types::competition::group_by_country;
use core_types::requests::{NewCompetitionGroup, UpdateCompetitionGroup};
use core_types::{
    Competition, CompetitionGroup, CompetitionGroupDetail, CompetitionGroupFilter,
    CountryCompetitions, Country, Game, Team,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// # GET /api/games
pub async fn list_games(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Game>>, AppError> {
    Ok(Json(state.store.list_games().await?))
}

/// # GET /api/countries
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Country>>, AppError> {
    Ok(Json(state.store.list_countries().await?))
}

/// # GET /api/teams?q=&limit=
pub async fn search_teams(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Team>>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("query parameter q is required".into()));
    }
    Ok(Json(state.store.search_teams(q, query.limit()).await?))
}

/// # GET /api/teams/:team_id
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<i32>,
) -> Result<Json<Team>, AppError> {
    let team = state
        .store
        .get_team(team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team"))?;
    Ok(Json(team))
}

/// # GET /api/competitions?country=&type=&include_inactive=
/// Active competition groups, bucketed by country for dropdowns.
pub async fn list_competitions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CompetitionGroupFilter>,
) -> Result<Json<Vec<CountryCompetitions>>, AppError> {
    let groups = state.store.list_competition_groups(&filter).await?;
    Ok(Json(group_by_country(groups)))
}

/// # GET /api/competitions/:group_id
pub async fn get_competition_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i32>,
) -> Result<Json<CompetitionGroupDetail>, AppError> {
    let group = state
        .store
        .get_competition_group(group_id)
        .await?
        .ok_or_else(|| AppError::not_found("Competition"))?;
    let competitions = state.store.list_group_members(group_id).await?;
    Ok(Json(CompetitionGroupDetail { group, competitions }))
}

/// # POST /api/competitions (admin)
pub async fn create_competition_group(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(request): Json<NewCompetitionGroup>,
) -> Result<(StatusCode, Json<CompetitionGroup>), AppError> {
    request.validate()?;
    let group = state.store.create_competition_group(&request).await?;
    tracing::info!(admin = %admin.id, group_id = group.id, "Created competition group.");
    Ok((StatusCode::CREATED, Json(group)))
}

/// # PATCH /api/competitions/:group_id (admin)
pub async fn update_competition_group(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(group_id): Path<i32>,
    Json(update): Json<UpdateCompetitionGroup>,
) -> Result<Json<CompetitionGroup>, AppError> {
    update.validate()?;
    let group = state
        .store
        .update_competition_group(group_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("Competition"))?;
    Ok(Json(group))
}

/// # PUT /api/competitions/:group_id/members/:competition_id (admin)
/// Moves a raw competition into the group.
pub async fn assign_competition(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path((group_id, competition_id)): Path<(i32, i32)>,
) -> Result<Json<Competition>, AppError> {
    if state.store.get_competition_group(group_id).await?.is_none() {
        return Err(AppError::not_found("Competition"));
    }
    if !state.store.assign_competition(competition_id, Some(group_id)).await? {
        return Err(AppError::not_found("Raw competition"));
    }
    let competition = state
        .store
        .get_competition(competition_id)
        .await?
        .ok_or_else(|| AppError::not_found("Raw competition"))?;
    Ok(Json(competition))
}
