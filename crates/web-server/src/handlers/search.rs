//! Name search backed by the hosted index, or by the database when the
//! index is not configured. Both paths answer with the same record shape.

use super::SearchQuery;
use crate::{AppState, error::AppError};
use crate::extract::{Json, Query};
use axum::extract::State;
use core_types::CompetitionGroupFilter;
use core_types::competition::normalize_competition_name;
use search::{CompetitionRecord, TeamRecord, to_objects};
use serde_json::Value;
use std::sync::Arc;

/// # GET /api/search/teams?q=
pub async fn search_teams(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let limit = query.limit();

    if let Some(backend) = &state.search {
        let hits = backend
            .search(&state.search_settings.teams_index, q, limit as usize)
            .await?;
        return Ok(Json(hits));
    }

    let teams = state.store.search_teams(q, limit).await?;
    let records: Vec<TeamRecord> = teams.iter().map(TeamRecord::from).collect();
    Ok(Json(to_objects(&records)?))
}

/// # GET /api/search/competitions?q=
pub async fn search_competitions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let limit = query.limit();

    if let Some(backend) = &state.search {
        let hits = backend
            .search(&state.search_settings.competitions_index, q, limit as usize)
            .await?;
        return Ok(Json(hits));
    }

    let needle = normalize_competition_name(q);
    let records: Vec<CompetitionRecord> = state
        .store
        .list_competition_groups(&CompetitionGroupFilter::default())
        .await?
        .iter()
        .filter(|g| normalize_competition_name(&g.name).contains(&needle))
        .take(limit as usize)
        .map(CompetitionRecord::from)
        .collect();
    Ok(Json(to_objects(&records)?))
}
