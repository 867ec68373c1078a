use crate::error::DbError;
use crate::rows::{
    convert_all, DbCareerStint, DbChallenge, DbCompetition, DbCompetitionGroup, DbCountry, DbGame,
    DbSave, DbSaveChallenge, DbSeason, DbTeam, DbTrophy, DbUser,
};
use crate::store::Store;
use async_trait::async_trait;
use core_types::competition::CompetitionGroupFilter;
use core_types::requests::{NewCompetitionGroup, UpdateCompetitionGroup};
use core_types::{
    CareerStint, Challenge, Competition, CompetitionGroup, Country, Game, Save, SaveChallenge,
    Season, Team, Trophy, User,
};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

const COMPETITION_GROUP_COLUMNS: &str =
    "id, name, country_code, competition_type, tier, is_active, logo_url";
const COMPETITION_COLUMNS: &str = "id, name, country_code, competition_type, logo_url, group_id";
const SAVE_COLUMNS: &str =
    "id, user_id, game_id, name, current_team_id, current_nation_id, created_at, updated_at";
const STINT_COLUMNS: &str = "id, save_id, team_id, start_date, end_date, is_national";
const TROPHY_COLUMNS: &str = "id, save_id, team_id, competition_group_id, season, date_won, created_at";
const SEASON_COLUMNS: &str = "id, save_id, season, team_id, league_position, notes, created_at";
const CHALLENGE_COLUMNS: &str = "id, name, description, game_id, goals, created_at";
const SAVE_CHALLENGE_COLUMNS: &str =
    "save_id, challenge_id, completed_goal_ids, status, started_at, completed_at";

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for DbRepository {
    async fn get_user(&self, id: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, email, display_name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Email and display name follow the latest login; role and creation time are kept.
    async fn upsert_user(&self, user: &User) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, email, display_name, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET email = COALESCE(EXCLUDED.email, users.email),
                    display_name = COALESCE(EXCLUDED.display_name, users.display_name)
            RETURNING id, email, display_name, role, created_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        User::try_from(row)
    }

    async fn list_games(&self) -> Result<Vec<Game>, DbError> {
        let rows = sqlx::query_as::<_, DbGame>(
            "SELECT id, name, version, is_active FROM games ORDER BY name DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Game::from).collect())
    }

    async fn get_game(&self, id: i32) -> Result<Option<Game>, DbError> {
        let row = sqlx::query_as::<_, DbGame>("SELECT id, name, version, is_active FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Game::from))
    }

    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, DbError> {
        let row = sqlx::query_as::<_, DbGame>(
            "SELECT id, name, version, is_active FROM games WHERE upper(name) = upper($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Game::from))
    }

    async fn list_countries(&self) -> Result<Vec<Country>, DbError> {
        let rows = sqlx::query_as::<_, DbCountry>("SELECT code, name, flag_url FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Country::from).collect())
    }

    async fn upsert_country(&self, country: &Country) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO countries (code, name, flag_url) VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, flag_url = EXCLUDED.flag_url
            "#,
        )
        .bind(&country.code)
        .bind(&country.name)
        .bind(&country.flag_url)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn search_teams(&self, query: &str, limit: i64) -> Result<Vec<Team>, DbError> {
        let needle = query.trim().to_lowercase();
        let rows = sqlx::query_as::<_, DbTeam>(
            r#"
            SELECT id, name, country_code, logo_url, is_national
            FROM teams
            WHERE strpos(lower(name), $1) > 0
            ORDER BY strpos(lower(name), $1) <> 1, name
            LIMIT $2
            "#,
        )
        .bind(&needle)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn get_team(&self, id: i32) -> Result<Option<Team>, DbError> {
        let row = sqlx::query_as::<_, DbTeam>(
            "SELECT id, name, country_code, logo_url, is_national FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Team::from))
    }

    async fn list_teams(&self) -> Result<Vec<Team>, DbError> {
        let rows = sqlx::query_as::<_, DbTeam>(
            "SELECT id, name, country_code, logo_url, is_national FROM teams ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn upsert_team(&self, team: &Team) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO teams (id, name, country_code, logo_url, is_national)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    country_code = EXCLUDED.country_code,
                    logo_url = EXCLUDED.logo_url,
                    is_national = EXCLUDED.is_national
            "#,
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.country_code)
        .bind(&team.logo_url)
        .bind(team.is_national)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn list_competition_groups(
        &self,
        filter: &CompetitionGroupFilter,
    ) -> Result<Vec<CompetitionGroup>, DbError> {
        let sql = format!(
            r#"
            SELECT {COMPETITION_GROUP_COLUMNS}
            FROM competition_groups
            WHERE ($1::text IS NULL OR country_code = $1)
              AND ($2::text IS NULL OR competition_type = $2)
              AND (is_active OR $3)
            ORDER BY country_code NULLS FIRST, tier NULLS LAST, name
            "#
        );
        let rows = sqlx::query_as::<_, DbCompetitionGroup>(&sql)
            .bind(&filter.country)
            .bind(filter.competition_type.map(|t| t.as_str()))
            .bind(filter.include_inactive)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn get_competition_group(&self, id: i32) -> Result<Option<CompetitionGroup>, DbError> {
        let sql = format!("SELECT {COMPETITION_GROUP_COLUMNS} FROM competition_groups WHERE id = $1");
        let row = sqlx::query_as::<_, DbCompetitionGroup>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CompetitionGroup::try_from).transpose()
    }

    async fn create_competition_group(
        &self,
        group: &NewCompetitionGroup,
    ) -> Result<CompetitionGroup, DbError> {
        let sql = format!(
            r#"
            INSERT INTO competition_groups (name, country_code, competition_type, tier, is_active, logo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMPETITION_GROUP_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DbCompetitionGroup>(&sql)
            .bind(group.name.trim())
            .bind(&group.country_code)
            .bind(group.competition_type.as_str())
            .bind(group.tier)
            .bind(group.is_active)
            .bind(&group.logo_url)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_sqlx)?;
        CompetitionGroup::try_from(row)
    }

    async fn update_competition_group(
        &self,
        id: i32,
        update: &UpdateCompetitionGroup,
    ) -> Result<Option<CompetitionGroup>, DbError> {
        let sql = format!(
            r#"
            UPDATE competition_groups
            SET name = COALESCE($2, name),
                tier = COALESCE($3, tier),
                is_active = COALESCE($4, is_active),
                logo_url = COALESCE($5, logo_url)
            WHERE id = $1
            RETURNING {COMPETITION_GROUP_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DbCompetitionGroup>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(update.tier)
            .bind(update.is_active)
            .bind(&update.logo_url)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CompetitionGroup::try_from).transpose()
    }

    async fn list_group_members(&self, group_id: i32) -> Result<Vec<Competition>, DbError> {
        let sql = format!("SELECT {COMPETITION_COLUMNS} FROM competitions WHERE group_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, DbCompetition>(&sql)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn get_competition(&self, id: i32) -> Result<Option<Competition>, DbError> {
        let sql = format!("SELECT {COMPETITION_COLUMNS} FROM competitions WHERE id = $1");
        let row = sqlx::query_as::<_, DbCompetition>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Competition::try_from).transpose()
    }

    async fn list_competitions(&self) -> Result<Vec<Competition>, DbError> {
        let sql = format!("SELECT {COMPETITION_COLUMNS} FROM competitions ORDER BY id");
        let rows = sqlx::query_as::<_, DbCompetition>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn upsert_competition(&self, competition: &Competition) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO competitions (id, name, country_code, competition_type, logo_url, group_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    country_code = EXCLUDED.country_code,
                    competition_type = EXCLUDED.competition_type,
                    logo_url = EXCLUDED.logo_url,
                    group_id = COALESCE(competitions.group_id, EXCLUDED.group_id)
            "#,
        )
        .bind(competition.id)
        .bind(&competition.name)
        .bind(&competition.country_code)
        .bind(competition.competition_type.as_str())
        .bind(&competition.logo_url)
        .bind(competition.group_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn assign_competition(&self, competition_id: i32, group_id: Option<i32>) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE competitions SET group_id = $2 WHERE id = $1")
            .bind(competition_id)
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_saves(&self, user_id: &str) -> Result<Vec<Save>, DbError> {
        let sql = format!("SELECT {SAVE_COLUMNS} FROM saves WHERE user_id = $1 ORDER BY updated_at DESC");
        let rows = sqlx::query_as::<_, DbSave>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Save::from).collect())
    }

    async fn get_save(&self, id: Uuid) -> Result<Option<Save>, DbError> {
        let sql = format!("SELECT {SAVE_COLUMNS} FROM saves WHERE id = $1");
        let row = sqlx::query_as::<_, DbSave>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Save::from))
    }

    async fn create_save(&self, save: &Save) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO saves (id, user_id, game_id, name, current_team_id, current_nation_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(save.id)
        .bind(&save.user_id)
        .bind(save.game_id)
        .bind(&save.name)
        .bind(save.current_team_id)
        .bind(save.current_nation_id)
        .bind(save.created_at)
        .bind(save.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn update_save(&self, save: &Save) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE saves
            SET name = $2, current_team_id = $3, current_nation_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(save.id)
        .bind(&save.name)
        .bind(save.current_team_id)
        .bind(save.current_nation_id)
        .bind(save.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_save(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM saves WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_stints(&self, save_id: Uuid) -> Result<Vec<CareerStint>, DbError> {
        let sql = format!("SELECT {STINT_COLUMNS} FROM career_stints WHERE save_id = $1 ORDER BY start_date ASC");
        let rows = sqlx::query_as::<_, DbCareerStint>(&sql)
            .bind(save_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CareerStint::from).collect())
    }

    async fn get_stint(&self, id: Uuid) -> Result<Option<CareerStint>, DbError> {
        let sql = format!("SELECT {STINT_COLUMNS} FROM career_stints WHERE id = $1");
        let row = sqlx::query_as::<_, DbCareerStint>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CareerStint::from))
    }

    async fn create_stint(&self, stint: &CareerStint) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO career_stints (id, save_id, team_id, start_date, end_date, is_national)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(stint.id)
        .bind(stint.save_id)
        .bind(stint.team_id)
        .bind(stint.start_date)
        .bind(stint.end_date)
        .bind(stint.is_national)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn update_stint(&self, stint: &CareerStint) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE career_stints SET team_id = $2, start_date = $3, end_date = $4, is_national = $5 WHERE id = $1",
        )
        .bind(stint.id)
        .bind(stint.team_id)
        .bind(stint.start_date)
        .bind(stint.end_date)
        .bind(stint.is_national)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_stint(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM career_stints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_trophies(&self, save_id: Uuid) -> Result<Vec<Trophy>, DbError> {
        let sql = format!("SELECT {TROPHY_COLUMNS} FROM trophies WHERE save_id = $1 ORDER BY date_won ASC");
        let rows = sqlx::query_as::<_, DbTrophy>(&sql)
            .bind(save_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Trophy::from).collect())
    }

    async fn get_trophy(&self, id: Uuid) -> Result<Option<Trophy>, DbError> {
        let sql = format!("SELECT {TROPHY_COLUMNS} FROM trophies WHERE id = $1");
        let row = sqlx::query_as::<_, DbTrophy>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Trophy::from))
    }

    async fn create_trophy(&self, trophy: &Trophy) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO trophies (id, save_id, team_id, competition_group_id, season, date_won, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(trophy.id)
        .bind(trophy.save_id)
        .bind(trophy.team_id)
        .bind(trophy.competition_group_id)
        .bind(&trophy.season)
        .bind(trophy.date_won)
        .bind(trophy.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn delete_trophy(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM trophies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_seasons(&self, save_id: Uuid) -> Result<Vec<Season>, DbError> {
        let sql = format!("SELECT {SEASON_COLUMNS} FROM seasons WHERE save_id = $1 ORDER BY season ASC");
        let rows = sqlx::query_as::<_, DbSeason>(&sql)
            .bind(save_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Season::from).collect())
    }

    async fn get_season(&self, id: Uuid) -> Result<Option<Season>, DbError> {
        let sql = format!("SELECT {SEASON_COLUMNS} FROM seasons WHERE id = $1");
        let row = sqlx::query_as::<_, DbSeason>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Season::from))
    }

    async fn create_season(&self, season: &Season) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO seasons (id, save_id, season, team_id, league_position, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(season.id)
        .bind(season.save_id)
        .bind(&season.season)
        .bind(season.team_id)
        .bind(season.league_position)
        .bind(&season.notes)
        .bind(season.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn delete_season(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM seasons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_challenges(&self, game_id: Option<i32>) -> Result<Vec<Challenge>, DbError> {
        let sql = format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE ($1::int IS NULL OR game_id IS NULL OR game_id = $1) ORDER BY name"
        );
        let rows = sqlx::query_as::<_, DbChallenge>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Challenge::from).collect())
    }

    async fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>, DbError> {
        let sql = format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = $1");
        let row = sqlx::query_as::<_, DbChallenge>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Challenge::from))
    }

    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO challenges (id, name, description, game_id, goals, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(challenge.id)
        .bind(&challenge.name)
        .bind(&challenge.description)
        .bind(challenge.game_id)
        .bind(Json(&challenge.goals))
        .bind(challenge.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }

    async fn delete_challenge(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM challenges WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_save_challenges(&self, save_id: Uuid) -> Result<Vec<SaveChallenge>, DbError> {
        let sql = format!(
            "SELECT {SAVE_CHALLENGE_COLUMNS} FROM save_challenges WHERE save_id = $1 ORDER BY started_at ASC"
        );
        let rows = sqlx::query_as::<_, DbSaveChallenge>(&sql)
            .bind(save_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn get_save_challenge(
        &self,
        save_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<SaveChallenge>, DbError> {
        let sql = format!(
            "SELECT {SAVE_CHALLENGE_COLUMNS} FROM save_challenges WHERE save_id = $1 AND challenge_id = $2"
        );
        let row = sqlx::query_as::<_, DbSaveChallenge>(&sql)
            .bind(save_id)
            .bind(challenge_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(SaveChallenge::try_from).transpose()
    }

    async fn upsert_save_challenge(&self, progress: &SaveChallenge) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO save_challenges (save_id, challenge_id, completed_goal_ids, status, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (save_id, challenge_id) DO UPDATE
                SET completed_goal_ids = EXCLUDED.completed_goal_ids,
                    status = EXCLUDED.status,
                    completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(progress.save_id)
        .bind(progress.challenge_id)
        .bind(Json(&progress.completed_goal_ids))
        .bind(progress.status.as_str())
        .bind(progress.started_at)
        .bind(progress.completed_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;
        Ok(())
    }
}
