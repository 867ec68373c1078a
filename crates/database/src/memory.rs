use crate::error::DbError;
use crate::store::Store;
use async_trait::async_trait;
use core_types::competition::CompetitionGroupFilter;
use core_types::requests::{NewCompetitionGroup, UpdateCompetitionGroup};
use core_types::{
    CareerStint, Challenge, Competition, CompetitionGroup, Country, Game, Save, SaveChallenge,
    Season, Team, Trophy, User,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    games: BTreeMap<i32, Game>,
    countries: BTreeMap<String, Country>,
    teams: BTreeMap<i32, Team>,
    groups: BTreeMap<i32, CompetitionGroup>,
    next_group_id: i32,
    competitions: BTreeMap<i32, Competition>,
    saves: HashMap<Uuid, Save>,
    stints: HashMap<Uuid, CareerStint>,
    trophies: HashMap<Uuid, Trophy>,
    seasons: HashMap<Uuid, Season>,
    challenges: HashMap<Uuid, Challenge>,
    save_challenges: HashMap<(Uuid, Uuid), SaveChallenge>,
}

impl Tables {
    fn require_save(&self, id: Uuid) -> Result<(), DbError> {
        if !self.saves.contains_key(&id) {
            return Err(DbError::InvalidReference("save_id".into()));
        }
        Ok(())
    }

    fn require_team(&self, id: i32) -> Result<(), DbError> {
        if !self.teams.contains_key(&id) {
            return Err(DbError::InvalidReference("team_id".into()));
        }
        Ok(())
    }

    fn require_country(&self, code: Option<&String>) -> Result<(), DbError> {
        match code {
            Some(code) if !self.countries.contains_key(code) => {
                Err(DbError::InvalidReference("country_code".into()))
            }
            _ => Ok(()),
        }
    }
}

/// A `Store` kept entirely in process memory.
///
/// Mirrors the PostgreSQL schema's keys, foreign keys, unique constraints
/// and cascading deletes. Starts with the same seeded games as the migrations.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut tables = Tables {
            next_group_id: 1,
            ..Tables::default()
        };
        for (id, name, version, is_active) in [(1, "FM23", "23.4", false), (2, "FM24", "24.3", true)] {
            tables.games.insert(
                id,
                Game {
                    id,
                    name: name.to_string(),
                    version: version.to_string(),
                    is_active,
                },
            );
        }
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<User, DbError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .entry(user.id.clone())
            .and_modify(|existing| {
                if user.email.is_some() {
                    existing.email = user.email.clone();
                }
                if user.display_name.is_some() {
                    existing.display_name = user.display_name.clone();
                }
            })
            .or_insert_with(|| user.clone());
        Ok(stored.clone())
    }

    async fn list_games(&self) -> Result<Vec<Game>, DbError> {
        let mut games: Vec<Game> = self.tables.read().await.games.values().cloned().collect();
        games.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(games)
    }

    async fn get_game(&self, id: i32) -> Result<Option<Game>, DbError> {
        Ok(self.tables.read().await.games.get(&id).cloned())
    }

    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, DbError> {
        Ok(self
            .tables
            .read()
            .await
            .games
            .values()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_countries(&self) -> Result<Vec<Country>, DbError> {
        let mut countries: Vec<Country> = self.tables.read().await.countries.values().cloned().collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(countries)
    }

    async fn upsert_country(&self, country: &Country) -> Result<(), DbError> {
        self.tables
            .write()
            .await
            .countries
            .insert(country.code.clone(), country.clone());
        Ok(())
    }

    async fn search_teams(&self, query: &str, limit: i64) -> Result<Vec<Team>, DbError> {
        let needle = query.trim().to_lowercase();
        let tables = self.tables.read().await;
        let mut hits: Vec<(bool, Team)> = tables
            .teams
            .values()
            .filter_map(|team| {
                let position = team.name.to_lowercase().find(&needle)?;
                Some((position != 0, team.clone()))
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        Ok(hits
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, team)| team)
            .collect())
    }

    async fn get_team(&self, id: i32) -> Result<Option<Team>, DbError> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DbError> {
        Ok(self.tables.read().await.teams.values().cloned().collect())
    }

    async fn upsert_team(&self, team: &Team) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_country(team.country_code.as_ref())?;
        tables.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn list_competition_groups(
        &self,
        filter: &CompetitionGroupFilter,
    ) -> Result<Vec<CompetitionGroup>, DbError> {
        Ok(self
            .tables
            .read()
            .await
            .groups
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect())
    }

    async fn get_competition_group(&self, id: i32) -> Result<Option<CompetitionGroup>, DbError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn create_competition_group(
        &self,
        group: &NewCompetitionGroup,
    ) -> Result<CompetitionGroup, DbError> {
        let mut tables = self.tables.write().await;
        tables.require_country(group.country_code.as_ref())?;
        let id = tables.next_group_id;
        tables.next_group_id += 1;
        let created = CompetitionGroup {
            id,
            name: group.name.trim().to_string(),
            country_code: group.country_code.clone(),
            competition_type: group.competition_type,
            tier: group.tier,
            is_active: group.is_active,
            logo_url: group.logo_url.clone(),
        };
        tables.groups.insert(id, created.clone());
        Ok(created)
    }

    async fn update_competition_group(
        &self,
        id: i32,
        update: &UpdateCompetitionGroup,
    ) -> Result<Option<CompetitionGroup>, DbError> {
        let mut tables = self.tables.write().await;
        let Some(group) = tables.groups.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            group.name = name.clone();
        }
        if update.tier.is_some() {
            group.tier = update.tier;
        }
        if let Some(active) = update.is_active {
            group.is_active = active;
        }
        if update.logo_url.is_some() {
            group.logo_url = update.logo_url.clone();
        }
        Ok(Some(group.clone()))
    }

    async fn list_group_members(&self, group_id: i32) -> Result<Vec<Competition>, DbError> {
        Ok(self
            .tables
            .read()
            .await
            .competitions
            .values()
            .filter(|c| c.group_id == Some(group_id))
            .cloned()
            .collect())
    }

    async fn get_competition(&self, id: i32) -> Result<Option<Competition>, DbError> {
        Ok(self.tables.read().await.competitions.get(&id).cloned())
    }

    async fn list_competitions(&self) -> Result<Vec<Competition>, DbError> {
        Ok(self.tables.read().await.competitions.values().cloned().collect())
    }

    async fn upsert_competition(&self, competition: &Competition) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_country(competition.country_code.as_ref())?;
        let mut stored = competition.clone();
        if let Some(existing) = tables.competitions.get(&competition.id) {
            stored.group_id = existing.group_id.or(competition.group_id);
        }
        tables.competitions.insert(stored.id, stored);
        Ok(())
    }

    async fn assign_competition(&self, competition_id: i32, group_id: Option<i32>) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if let Some(group_id) = group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(DbError::InvalidReference("group_id".into()));
            }
        }
        match tables.competitions.get_mut(&competition_id) {
            Some(competition) => {
                competition.group_id = group_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_saves(&self, user_id: &str) -> Result<Vec<Save>, DbError> {
        let mut saves: Vec<Save> = self
            .tables
            .read()
            .await
            .saves
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        saves.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(saves)
    }

    async fn get_save(&self, id: Uuid) -> Result<Option<Save>, DbError> {
        Ok(self.tables.read().await.saves.get(&id).cloned())
    }

    async fn create_save(&self, save: &Save) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        if tables.saves.contains_key(&save.id) {
            return Err(DbError::Conflict("saves_pkey".into()));
        }
        if !tables.users.contains_key(&save.user_id) {
            return Err(DbError::InvalidReference("user_id".into()));
        }
        if !tables.games.contains_key(&save.game_id) {
            return Err(DbError::InvalidReference("game_id".into()));
        }
        for team_id in [save.current_team_id, save.current_nation_id].into_iter().flatten() {
            tables.require_team(team_id)?;
        }
        tables.saves.insert(save.id, save.clone());
        Ok(())
    }

    async fn update_save(&self, save: &Save) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        for team_id in [save.current_team_id, save.current_nation_id].into_iter().flatten() {
            tables.require_team(team_id)?;
        }
        match tables.saves.get_mut(&save.id) {
            Some(existing) => {
                existing.name = save.name.clone();
                existing.current_team_id = save.current_team_id;
                existing.current_nation_id = save.current_nation_id;
                existing.updated_at = save.updated_at;
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn delete_save(&self, id: Uuid) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if tables.saves.remove(&id).is_none() {
            return Ok(false);
        }
        tables.stints.retain(|_, s| s.save_id != id);
        tables.trophies.retain(|_, t| t.save_id != id);
        tables.seasons.retain(|_, s| s.save_id != id);
        tables.save_challenges.retain(|(save_id, _), _| *save_id != id);
        Ok(true)
    }

    async fn list_stints(&self, save_id: Uuid) -> Result<Vec<CareerStint>, DbError> {
        let mut stints: Vec<CareerStint> = self
            .tables
            .read()
            .await
            .stints
            .values()
            .filter(|s| s.save_id == save_id)
            .cloned()
            .collect();
        stints.sort_by_key(|s| s.start_date);
        Ok(stints)
    }

    async fn get_stint(&self, id: Uuid) -> Result<Option<CareerStint>, DbError> {
        Ok(self.tables.read().await.stints.get(&id).cloned())
    }

    async fn create_stint(&self, stint: &CareerStint) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_save(stint.save_id)?;
        tables.require_team(stint.team_id)?;
        if tables.stints.contains_key(&stint.id) {
            return Err(DbError::Conflict("career_stints_pkey".into()));
        }
        tables.stints.insert(stint.id, stint.clone());
        Ok(())
    }

    async fn update_stint(&self, stint: &CareerStint) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_team(stint.team_id)?;
        match tables.stints.get_mut(&stint.id) {
            Some(existing) => {
                *existing = stint.clone();
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn delete_stint(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.tables.write().await.stints.remove(&id).is_some())
    }

    async fn list_trophies(&self, save_id: Uuid) -> Result<Vec<Trophy>, DbError> {
        let mut trophies: Vec<Trophy> = self
            .tables
            .read()
            .await
            .trophies
            .values()
            .filter(|t| t.save_id == save_id)
            .cloned()
            .collect();
        trophies.sort_by_key(|t| t.date_won);
        Ok(trophies)
    }

    async fn get_trophy(&self, id: Uuid) -> Result<Option<Trophy>, DbError> {
        Ok(self.tables.read().await.trophies.get(&id).cloned())
    }

    async fn create_trophy(&self, trophy: &Trophy) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_save(trophy.save_id)?;
        tables.require_team(trophy.team_id)?;
        if !tables.groups.contains_key(&trophy.competition_group_id) {
            return Err(DbError::InvalidReference("competition_group_id".into()));
        }
        if tables.trophies.contains_key(&trophy.id) {
            return Err(DbError::Conflict("trophies_pkey".into()));
        }
        tables.trophies.insert(trophy.id, trophy.clone());
        Ok(())
    }

    async fn delete_trophy(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.tables.write().await.trophies.remove(&id).is_some())
    }

    async fn list_seasons(&self, save_id: Uuid) -> Result<Vec<Season>, DbError> {
        let mut seasons: Vec<Season> = self
            .tables
            .read()
            .await
            .seasons
            .values()
            .filter(|s| s.save_id == save_id)
            .cloned()
            .collect();
        seasons.sort_by(|a, b| a.season.cmp(&b.season));
        Ok(seasons)
    }

    async fn get_season(&self, id: Uuid) -> Result<Option<Season>, DbError> {
        Ok(self.tables.read().await.seasons.get(&id).cloned())
    }

    async fn create_season(&self, season: &Season) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_save(season.save_id)?;
        tables.require_team(season.team_id)?;
        let duplicate = tables
            .seasons
            .values()
            .any(|s| s.save_id == season.save_id && s.season == season.season);
        if duplicate || tables.seasons.contains_key(&season.id) {
            return Err(DbError::Conflict("seasons_save_id_season_key".into()));
        }
        tables.seasons.insert(season.id, season.clone());
        Ok(())
    }

    async fn delete_season(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.tables.write().await.seasons.remove(&id).is_some())
    }

    async fn list_challenges(&self, game_id: Option<i32>) -> Result<Vec<Challenge>, DbError> {
        let mut challenges: Vec<Challenge> = self
            .tables
            .read()
            .await
            .challenges
            .values()
            .filter(|c| match (game_id, c.game_id) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .cloned()
            .collect();
        challenges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(challenges)
    }

    async fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>, DbError> {
        Ok(self.tables.read().await.challenges.get(&id).cloned())
    }

    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        if let Some(game_id) = challenge.game_id {
            if !tables.games.contains_key(&game_id) {
                return Err(DbError::InvalidReference("game_id".into()));
            }
        }
        if tables.challenges.contains_key(&challenge.id) {
            return Err(DbError::Conflict("challenges_pkey".into()));
        }
        tables.challenges.insert(challenge.id, challenge.clone());
        Ok(())
    }

    async fn delete_challenge(&self, id: Uuid) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if tables.challenges.remove(&id).is_none() {
            return Ok(false);
        }
        tables.save_challenges.retain(|(_, challenge_id), _| *challenge_id != id);
        Ok(true)
    }

    async fn list_save_challenges(&self, save_id: Uuid) -> Result<Vec<SaveChallenge>, DbError> {
        let mut progress: Vec<SaveChallenge> = self
            .tables
            .read()
            .await
            .save_challenges
            .values()
            .filter(|p| p.save_id == save_id)
            .cloned()
            .collect();
        progress.sort_by_key(|p| p.started_at);
        Ok(progress)
    }

    async fn get_save_challenge(
        &self,
        save_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<SaveChallenge>, DbError> {
        Ok(self
            .tables
            .read()
            .await
            .save_challenges
            .get(&(save_id, challenge_id))
            .cloned())
    }

    async fn upsert_save_challenge(&self, progress: &SaveChallenge) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.require_save(progress.save_id)?;
        if !tables.challenges.contains_key(&progress.challenge_id) {
            return Err(DbError::InvalidReference("challenge_id".into()));
        }
        tables
            .save_challenges
            .entry((progress.save_id, progress.challenge_id))
            .and_modify(|existing| {
                existing.completed_goal_ids = progress.completed_goal_ids.clone();
                existing.status = progress.status;
                existing.completed_at = progress.completed_at;
            })
            .or_insert_with(|| progress.clone());
        Ok(())
    }
}
