use crate::enums::{ChallengeStatus, CompetitionType, UserRole};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account, keyed by the authentication provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// A supported Football Manager title, e.g. "FM24".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i32,
    pub name: String,
    pub version: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub flag_url: Option<String>,
}

/// A club or national team. The id is the football-data API id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub logo_url: Option<String>,
    pub is_national: bool,
}

/// A competition exactly as the football-data API reports it.
///
/// The API frequently lists the same real-world competition more than once
/// (renamed sponsors, split seasons), so raw competitions are attached to a
/// [`CompetitionGroup`] which is what the rest of the system references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub competition_type: CompetitionType,
    pub logo_url: Option<String>,
    pub group_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionGroup {
    pub id: i32,
    pub name: String,
    /// `None` for international competitions.
    pub country_code: Option<String>,
    pub competition_type: CompetitionType,
    /// 1 is the top division.
    pub tier: Option<i32>,
    pub is_active: bool,
    pub logo_url: Option<String>,
}

/// A group together with the raw competitions it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionGroupDetail {
    #[serde(flatten)]
    pub group: CompetitionGroup,
    pub competitions: Vec<Competition>,
}

/// One user's Football Manager career.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Save {
    pub id: Uuid,
    pub user_id: String,
    pub game_id: i32,
    pub name: String,
    pub current_team_id: Option<i32>,
    pub current_nation_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Save {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A contiguous period at one club or national team. An open `end_date`
/// means the manager is still in charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerStint {
    pub id: Uuid,
    pub save_id: Uuid,
    pub team_id: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_national: bool,
}

impl CareerStint {
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trophy {
    pub id: Uuid,
    pub save_id: Uuid,
    pub team_id: i32,
    pub competition_group_id: i32,
    pub season: String,
    pub date_won: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Per-save yearly summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: Uuid,
    pub save_id: Uuid,
    pub season: String,
    pub team_id: i32,
    pub league_position: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeGoal {
    pub id: Uuid,
    pub description: String,
    pub competition_group_id: Option<i32>,
}

/// A checklist of goals a save can attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub game_id: Option<i32>,
    pub goals: Vec<ChallengeGoal>,
    pub created_at: DateTime<Utc>,
}

/// Progress of one save on one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveChallenge {
    pub save_id: Uuid,
    pub challenge_id: Uuid,
    pub completed_goal_ids: Vec<Uuid>,
    pub status: ChallengeStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything shown on a save's page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDetail {
    #[serde(flatten)]
    pub save: Save,
    pub stints: Vec<CareerStint>,
    pub trophies: Vec<Trophy>,
    pub seasons: Vec<Season>,
    pub challenges: Vec<SaveChallenge>,
}
