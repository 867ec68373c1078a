//! Row structs as they come out of PostgreSQL, and their conversion into
//! the domain types. Enum columns are stored as text.

use crate::error::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{
    CareerStint, Challenge, ChallengeGoal, Competition, CompetitionGroup, Country, Game, Save,
    SaveChallenge, Season, Team, Trophy, User,
};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

fn parse_enum<T: FromStr<Err = core_types::CoreError>>(value: &str) -> Result<T, DbError> {
    value.parse().map_err(|e: core_types::CoreError| DbError::Decode(e.to_string()))
}

#[derive(Debug, FromRow)]
pub struct DbUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = DbError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            role: parse_enum(&row.role)?,
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct DbGame {
    pub id: i32,
    pub name: String,
    pub version: String,
    pub is_active: bool,
}

impl From<DbGame> for Game {
    fn from(row: DbGame) -> Self {
        Game {
            id: row.id,
            name: row.name,
            version: row.version,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbCountry {
    pub code: String,
    pub name: String,
    pub flag_url: Option<String>,
}

impl From<DbCountry> for Country {
    fn from(row: DbCountry) -> Self {
        Country {
            code: row.code,
            name: row.name,
            flag_url: row.flag_url,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbTeam {
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub logo_url: Option<String>,
    pub is_national: bool,
}

impl From<DbTeam> for Team {
    fn from(row: DbTeam) -> Self {
        Team {
            id: row.id,
            name: row.name,
            country_code: row.country_code,
            logo_url: row.logo_url,
            is_national: row.is_national,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbCompetition {
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub competition_type: String,
    pub logo_url: Option<String>,
    pub group_id: Option<i32>,
}

impl TryFrom<DbCompetition> for Competition {
    type Error = DbError;

    fn try_from(row: DbCompetition) -> Result<Self, Self::Error> {
        Ok(Competition {
            competition_type: parse_enum(&row.competition_type)?,
            id: row.id,
            name: row.name,
            country_code: row.country_code,
            logo_url: row.logo_url,
            group_id: row.group_id,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct DbCompetitionGroup {
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub competition_type: String,
    pub tier: Option<i32>,
    pub is_active: bool,
    pub logo_url: Option<String>,
}

impl TryFrom<DbCompetitionGroup> for CompetitionGroup {
    type Error = DbError;

    fn try_from(row: DbCompetitionGroup) -> Result<Self, Self::Error> {
        Ok(CompetitionGroup {
            competition_type: parse_enum(&row.competition_type)?,
            id: row.id,
            name: row.name,
            country_code: row.country_code,
            tier: row.tier,
            is_active: row.is_active,
            logo_url: row.logo_url,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct DbSave {
    pub id: Uuid,
    pub user_id: String,
    pub game_id: i32,
    pub name: String,
    pub current_team_id: Option<i32>,
    pub current_nation_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbSave> for Save {
    fn from(row: DbSave) -> Self {
        Save {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            name: row.name,
            current_team_id: row.current_team_id,
            current_nation_id: row.current_nation_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbCareerStint {
    pub id: Uuid,
    pub save_id: Uuid,
    pub team_id: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_national: bool,
}

impl From<DbCareerStint> for CareerStint {
    fn from(row: DbCareerStint) -> Self {
        CareerStint {
            id: row.id,
            save_id: row.save_id,
            team_id: row.team_id,
            start_date: row.start_date,
            end_date: row.end_date,
            is_national: row.is_national,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbTrophy {
    pub id: Uuid,
    pub save_id: Uuid,
    pub team_id: i32,
    pub competition_group_id: i32,
    pub season: String,
    pub date_won: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<DbTrophy> for Trophy {
    fn from(row: DbTrophy) -> Self {
        Trophy {
            id: row.id,
            save_id: row.save_id,
            team_id: row.team_id,
            competition_group_id: row.competition_group_id,
            season: row.season,
            date_won: row.date_won,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbSeason {
    pub id: Uuid,
    pub save_id: Uuid,
    pub season: String,
    pub team_id: i32,
    pub league_position: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSeason> for Season {
    fn from(row: DbSeason) -> Self {
        Season {
            id: row.id,
            save_id: row.save_id,
            season: row.season,
            team_id: row.team_id,
            league_position: row.league_position,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbChallenge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub game_id: Option<i32>,
    pub goals: Json<Vec<ChallengeGoal>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbChallenge> for Challenge {
    fn from(row: DbChallenge) -> Self {
        Challenge {
            id: row.id,
            name: row.name,
            description: row.description,
            game_id: row.game_id,
            goals: row.goals.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DbSaveChallenge {
    pub save_id: Uuid,
    pub challenge_id: Uuid,
    pub completed_goal_ids: Json<Vec<Uuid>>,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbSaveChallenge> for SaveChallenge {
    type Error = DbError;

    fn try_from(row: DbSaveChallenge) -> Result<Self, Self::Error> {
        Ok(SaveChallenge {
            status: parse_enum(&row.status)?,
            save_id: row.save_id,
            challenge_id: row.challenge_id,
            completed_goal_ids: row.completed_goal_ids.0,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

/// Converts a batch of rows, failing on the first undecodable one.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
