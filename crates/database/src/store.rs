use crate::error::DbError;
use async_trait::async_trait;
use core_types::competition::CompetitionGroupFilter;
use core_types::requests::{NewCompetitionGroup, UpdateCompetitionGroup};
use core_types::{
    CareerStint, Challenge, Competition, CompetitionGroup, Country, Game, Save, SaveChallenge,
    SaveDetail, Season, Team, Trophy, User,
};
use uuid::Uuid;

/// The data-access interface the API and batch layers are written against.
///
/// `DbRepository` is the PostgreSQL implementation; `MemoryStore` keeps
/// everything in process memory with the same constraint semantics.
/// Lookups return `Ok(None)` for missing rows; deletes return whether a row
/// was removed.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: &str) -> Result<Option<User>, DbError>;
    async fn upsert_user(&self, user: &User) -> Result<User, DbError>;

    // --- Games & countries ---
    async fn list_games(&self) -> Result<Vec<Game>, DbError>;
    async fn get_game(&self, id: i32) -> Result<Option<Game>, DbError>;
    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, DbError>;
    async fn list_countries(&self) -> Result<Vec<Country>, DbError>;
    async fn upsert_country(&self, country: &Country) -> Result<(), DbError>;

    // --- Teams ---
    /// Case-insensitive substring match on the name, prefix matches first.
    async fn search_teams(&self, query: &str, limit: i64) -> Result<Vec<Team>, DbError>;
    async fn get_team(&self, id: i32) -> Result<Option<Team>, DbError>;
    async fn list_teams(&self) -> Result<Vec<Team>, DbError>;
    async fn upsert_team(&self, team: &Team) -> Result<(), DbError>;

    // --- Competitions ---
    async fn list_competition_groups(
        &self,
        filter: &CompetitionGroupFilter,
    ) -> Result<Vec<CompetitionGroup>, DbError>;
    async fn get_competition_group(&self, id: i32) -> Result<Option<CompetitionGroup>, DbError>;
    async fn create_competition_group(
        &self,
        group: &NewCompetitionGroup,
    ) -> Result<CompetitionGroup, DbError>;
    async fn update_competition_group(
        &self,
        id: i32,
        update: &UpdateCompetitionGroup,
    ) -> Result<Option<CompetitionGroup>, DbError>;
    async fn list_group_members(&self, group_id: i32) -> Result<Vec<Competition>, DbError>;
    async fn get_competition(&self, id: i32) -> Result<Option<Competition>, DbError>;
    async fn list_competitions(&self) -> Result<Vec<Competition>, DbError>;
    /// Inserts or refreshes a raw competition. An existing group assignment is kept.
    async fn upsert_competition(&self, competition: &Competition) -> Result<(), DbError>;
    async fn assign_competition(&self, competition_id: i32, group_id: Option<i32>) -> Result<bool, DbError>;

    // --- Saves ---
    async fn list_saves(&self, user_id: &str) -> Result<Vec<Save>, DbError>;
    async fn get_save(&self, id: Uuid) -> Result<Option<Save>, DbError>;
    async fn create_save(&self, save: &Save) -> Result<(), DbError>;
    async fn update_save(&self, save: &Save) -> Result<(), DbError>;
    /// Removes the save and, by cascade, everything hanging off it.
    async fn delete_save(&self, id: Uuid) -> Result<bool, DbError>;

    // --- Career stints ---
    async fn list_stints(&self, save_id: Uuid) -> Result<Vec<CareerStint>, DbError>;
    async fn get_stint(&self, id: Uuid) -> Result<Option<CareerStint>, DbError>;
    async fn create_stint(&self, stint: &CareerStint) -> Result<(), DbError>;
    async fn update_stint(&self, stint: &CareerStint) -> Result<(), DbError>;
    async fn delete_stint(&self, id: Uuid) -> Result<bool, DbError>;

    // --- Trophies ---
    async fn list_trophies(&self, save_id: Uuid) -> Result<Vec<Trophy>, DbError>;
    async fn get_trophy(&self, id: Uuid) -> Result<Option<Trophy>, DbError>;
    async fn create_trophy(&self, trophy: &Trophy) -> Result<(), DbError>;
    async fn delete_trophy(&self, id: Uuid) -> Result<bool, DbError>;

    // --- Seasons ---
    async fn list_seasons(&self, save_id: Uuid) -> Result<Vec<Season>, DbError>;
    async fn get_season(&self, id: Uuid) -> Result<Option<Season>, DbError>;
    /// Fails with `DbError::Conflict` when the save already has this season.
    async fn create_season(&self, season: &Season) -> Result<(), DbError>;
    async fn delete_season(&self, id: Uuid) -> Result<bool, DbError>;

    // --- Challenges ---
    async fn list_challenges(&self, game_id: Option<i32>) -> Result<Vec<Challenge>, DbError>;
    async fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>, DbError>;
    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), DbError>;
    async fn delete_challenge(&self, id: Uuid) -> Result<bool, DbError>;
    async fn list_save_challenges(&self, save_id: Uuid) -> Result<Vec<SaveChallenge>, DbError>;
    async fn get_save_challenge(
        &self,
        save_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<SaveChallenge>, DbError>;
    async fn upsert_save_challenge(&self, progress: &SaveChallenge) -> Result<(), DbError>;

    /// Loads a save together with its stints, trophies, seasons and challenges.
    async fn get_save_detail(&self, id: Uuid) -> Result<Option<SaveDetail>, DbError> {
        let Some(save) = self.get_save(id).await? else {
            return Ok(None);
        };
        let (stints, trophies, seasons, challenges) = tokio::try_join!(
            self.list_stints(id),
            self.list_trophies(id),
            self.list_seasons(id),
            self.list_save_challenges(id),
        )?;
        Ok(Some(SaveDetail {
            save,
            stints,
            trophies,
            seasons,
            challenges,
        }))
    }
}
