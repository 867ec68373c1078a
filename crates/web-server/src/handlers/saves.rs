//! Saves and the career data hanging off them: stints, trophies, seasons.

use crate::{AppState, auth::AuthUser, error::AppError};
use crate::extract::{Json, Path};
use axum::{extract::State, http::StatusCode};
use chrono::{NaiveDate, Utc};
use core_types::requests::{NewSave, NewSeason, NewStint, NewTrophy, UpdateSave, UpdateStint};
use core_types::{CareerStint, Save, SaveDetail, Season, Trophy};
use database::Store;
use std::sync::Arc;
use uuid::Uuid;

/// Loads a save on behalf of `user`: 404 if missing, 403 if someone else's.
pub(crate) async fn owned_save(state: &AppState, user: &AuthUser, save_id: Uuid) -> Result<Save, AppError> {
    let save = state
        .store
        .get_save(save_id)
        .await?
        .ok_or_else(|| AppError::not_found("Save"))?;
    if !save.is_owned_by(&user.id) {
        return Err(AppError::Forbidden("this save belongs to another user".into()));
    }
    Ok(save)
}

async fn require_team(store: &dyn Store, team_id: i32) -> Result<(), AppError> {
    if store.get_team(team_id).await?.is_none() {
        return Err(AppError::BadRequest(format!("unknown team {team_id}")));
    }
    Ok(())
}

// --- Saves ---

/// # GET /api/saves
pub async fn list_saves(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Save>>, AppError> {
    Ok(Json(state.store.list_saves(&user.id).await?))
}

/// # POST /api/saves
/// Creates a save and opens the first career stint at the chosen team and/or nation.
pub async fn create_save(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<NewSave>,
) -> Result<(StatusCode, Json<SaveDetail>), AppError> {
    request.validate()?;
    let store = state.store.as_ref();
    if store.get_game(request.game_id).await?.is_none() {
        return Err(AppError::BadRequest(format!("unknown game {}", request.game_id)));
    }
    for team_id in [request.team_id, request.nation_id].into_iter().flatten() {
        require_team(store, team_id).await?;
    }

    let now = Utc::now();
    let save = Save {
        id: Uuid::new_v4(),
        user_id: user.id.clone(),
        game_id: request.game_id,
        name: request.name.trim().to_string(),
        current_team_id: request.team_id,
        current_nation_id: request.nation_id,
        created_at: now,
        updated_at: now,
    };
    store.create_save(&save).await?;

    let start_date = request.start_date.unwrap_or_else(|| now.date_naive());
    let openings = [(request.team_id, false), (request.nation_id, true)];
    for (team_id, is_national) in openings {
        let Some(team_id) = team_id else { continue };
        let stint = NewStint {
            team_id,
            start_date,
            end_date: None,
            is_national,
        }
        .into_stint(save.id);
        store.create_stint(&stint).await?;
    }

    tracing::info!(save_id = %save.id, user_id = %user.id, "Created save.");
    let detail = store
        .get_save_detail(save.id)
        .await?
        .ok_or_else(|| AppError::Internal("save vanished after creation".into()))?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// # GET /api/saves/:save_id
pub async fn get_save(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<Json<SaveDetail>, AppError> {
    owned_save(&state, &user, save_id).await?;
    let detail = state
        .store
        .get_save_detail(save_id)
        .await?
        .ok_or_else(|| AppError::not_found("Save"))?;
    Ok(Json(detail))
}

/// # PATCH /api/saves/:save_id
pub async fn update_save(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
    Json(update): Json<UpdateSave>,
) -> Result<Json<Save>, AppError> {
    update.validate()?;
    let mut save = owned_save(&state, &user, save_id).await?;
    if let Some(name) = update.name {
        save.name = name.trim().to_string();
    }
    if let Some(team_id) = update.current_team_id {
        require_team(state.store.as_ref(), team_id).await?;
        save.current_team_id = Some(team_id);
    }
    if let Some(nation_id) = update.current_nation_id {
        require_team(state.store.as_ref(), nation_id).await?;
        save.current_nation_id = Some(nation_id);
    }
    save.updated_at = Utc::now();
    state.store.update_save(&save).await?;
    Ok(Json(save))
}

/// # DELETE /api/saves/:save_id
pub async fn delete_save(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_save(&state, &user, save_id).await?;
    state.store.delete_save(save_id).await?;
    tracing::info!(%save_id, "Deleted save.");
    Ok(StatusCode::NO_CONTENT)
}

// --- Career stints ---

/// # GET /api/saves/:save_id/stints
pub async fn list_stints(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<Json<Vec<CareerStint>>, AppError> {
    owned_save(&state, &user, save_id).await?;
    Ok(Json(state.store.list_stints(save_id).await?))
}

/// Start of the earliest other open stint of the same kind beginning after `stint`.
async fn later_open_start(store: &dyn Store, stint: &CareerStint) -> Result<Option<NaiveDate>, AppError> {
    Ok(store
        .list_stints(stint.save_id)
        .await?
        .into_iter()
        .filter(|other| {
            other.id != stint.id
                && other.is_national == stint.is_national
                && other.is_current()
                && other.start_date > stint.start_date
        })
        .map(|other| other.start_date)
        .min())
}

/// Ends every other open stint of the same kind on `start_date` and points
/// the save at the new team. Callers make sure no other open stint of that
/// kind starts later.
async fn make_current(
    store: &dyn Store,
    mut save: Save,
    stint: &CareerStint,
) -> Result<(), AppError> {
    for mut other in store.list_stints(save.id).await? {
        let same_kind = other.is_national == stint.is_national;
        if other.id != stint.id && same_kind && other.is_current() {
            other.end_date = Some(stint.start_date);
            store.update_stint(&other).await?;
        }
    }
    if stint.is_national {
        save.current_nation_id = Some(stint.team_id);
    } else {
        save.current_team_id = Some(stint.team_id);
    }
    save.updated_at = Utc::now();
    store.update_save(&save).await?;
    Ok(())
}

/// Clears the save's current team or nation when it came from `stint`.
async fn release_current(store: &dyn Store, mut save: Save, stint: &CareerStint) -> Result<(), AppError> {
    let current = if stint.is_national {
        &mut save.current_nation_id
    } else {
        &mut save.current_team_id
    };
    if *current != Some(stint.team_id) {
        return Ok(());
    }
    *current = None;
    save.updated_at = Utc::now();
    store.update_save(&save).await?;
    Ok(())
}

/// # POST /api/saves/:save_id/stints
/// An open stint that starts before the current one of the same kind is
/// recorded as history: it ends where the current one begins.
pub async fn create_stint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
    Json(request): Json<NewStint>,
) -> Result<(StatusCode, Json<CareerStint>), AppError> {
    request.validate()?;
    let save = owned_save(&state, &user, save_id).await?;
    let store = state.store.as_ref();
    require_team(store, request.team_id).await?;

    let mut stint = request.into_stint(save_id);
    if stint.is_current() {
        stint.end_date = later_open_start(store, &stint).await?;
    }
    store.create_stint(&stint).await?;
    if stint.is_current() {
        make_current(store, save, &stint).await?;
    }
    Ok((StatusCode::CREATED, Json(stint)))
}

async fn stint_of(store: &dyn Store, save_id: Uuid, stint_id: Uuid) -> Result<CareerStint, AppError> {
    match store.get_stint(stint_id).await? {
        Some(stint) if stint.save_id == save_id => Ok(stint),
        _ => Err(AppError::not_found("Career stint")),
    }
}

/// # PATCH /api/saves/:save_id/stints/:stint_id
/// Closing the current stint releases the save's current team; reopening a
/// stint makes it current again.
pub async fn update_stint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((save_id, stint_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<UpdateStint>,
) -> Result<Json<CareerStint>, AppError> {
    let save = owned_save(&state, &user, save_id).await?;
    let store = state.store.as_ref();
    let mut stint = stint_of(store, save_id, stint_id).await?;
    let was_current = stint.is_current();
    update.apply(&mut stint)?;

    if stint.is_current() && later_open_start(store, &stint).await?.is_some() {
        return Err(AppError::BadRequest(
            "another open stint of the same kind starts later".into(),
        ));
    }
    store.update_stint(&stint).await?;

    match (was_current, stint.is_current()) {
        (true, false) => release_current(store, save, &stint).await?,
        (false, true) => make_current(store, save, &stint).await?,
        _ => {}
    }
    Ok(Json(stint))
}

/// # DELETE /api/saves/:save_id/stints/:stint_id
pub async fn delete_stint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((save_id, stint_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let save = owned_save(&state, &user, save_id).await?;
    let store = state.store.as_ref();
    let stint = stint_of(store, save_id, stint_id).await?;
    store.delete_stint(stint_id).await?;
    if stint.is_current() {
        release_current(store, save, &stint).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- Trophies ---

/// # GET /api/saves/:save_id/trophies
pub async fn list_trophies(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<Json<Vec<Trophy>>, AppError> {
    owned_save(&state, &user, save_id).await?;
    Ok(Json(state.store.list_trophies(save_id).await?))
}

/// # POST /api/saves/:save_id/trophies
/// The season is inferred from `date_won` when not given.
pub async fn create_trophy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
    Json(request): Json<NewTrophy>,
) -> Result<(StatusCode, Json<Trophy>), AppError> {
    request.validate()?;
    owned_save(&state, &user, save_id).await?;
    let store = state.store.as_ref();
    require_team(store, request.team_id).await?;
    if store.get_competition_group(request.competition_group_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "unknown competition {}",
            request.competition_group_id
        )));
    }

    let trophy = request.into_trophy(save_id, Utc::now());
    store.create_trophy(&trophy).await?;
    Ok((StatusCode::CREATED, Json(trophy)))
}

/// # DELETE /api/saves/:save_id/trophies/:trophy_id
pub async fn delete_trophy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((save_id, trophy_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    owned_save(&state, &user, save_id).await?;
    match state.store.get_trophy(trophy_id).await? {
        Some(trophy) if trophy.save_id == save_id => {}
        _ => return Err(AppError::not_found("Trophy")),
    }
    state.store.delete_trophy(trophy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Seasons ---

/// # GET /api/saves/:save_id/seasons
pub async fn list_seasons(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
) -> Result<Json<Vec<Season>>, AppError> {
    owned_save(&state, &user, save_id).await?;
    Ok(Json(state.store.list_seasons(save_id).await?))
}

/// # POST /api/saves/:save_id/seasons
/// One entry per season; a second one for the same season is a 409.
pub async fn create_season(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(save_id): Path<Uuid>,
    Json(request): Json<NewSeason>,
) -> Result<(StatusCode, Json<Season>), AppError> {
    request.validate()?;
    owned_save(&state, &user, save_id).await?;
    require_team(state.store.as_ref(), request.team_id).await?;

    let season = request.into_season(save_id, Utc::now())?;
    match state.store.create_season(&season).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(season))),
        Err(database::DbError::Conflict(_)) => Err(AppError::Conflict(format!(
            "season {} is already recorded for this save",
            season.season
        ))),
        Err(e) => Err(e.into()),
    }
}

/// # DELETE /api/saves/:save_id/seasons/:season_id
pub async fn delete_season(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((save_id, season_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    owned_save(&state, &user, save_id).await?;
    match state.store.get_season(season_id).await? {
        Some(season) if season.save_id == save_id => {}
        _ => return Err(AppError::not_found("Season")),
    }
    state.store.delete_season(season_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
