//! Shapes of the legacy documents, after Firestore value decoding.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Namespace for ids derived from legacy document paths.
const LEGACY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_5b0e_2d4a_4c8e_9a57_3e1f_0b2d_7c44);

/// Maps a legacy document path to a stable UUID, so a re-run finds the
/// records an earlier run wrote.
pub fn legacy_id(path: &str) -> Uuid {
    Uuid::new_v5(&LEGACY_NAMESPACE, path.as_bytes())
}

/// A calendar date stored either as `YYYY-MM-DD` or as a full timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyDate(pub NaiveDate);

impl<'de> Deserialize<'de> for LegacyDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            return Ok(LegacyDate(date));
        }
        DateTime::parse_from_rfc3339(&text)
            .map(|ts| LegacyDate(ts.with_timezone(&Utc).date_naive()))
            .map_err(|_| serde::de::Error::custom(format!("invalid date: {text}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StintDoc {
    pub team_id: i32,
    pub start_date: LegacyDate,
    pub end_date: Option<LegacyDate>,
    #[serde(default)]
    pub is_national: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrophyDoc {
    pub team_id: i32,
    /// A raw football-data competition id.
    pub competition_id: i32,
    pub date_won: LegacyDate,
    pub season: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDoc {
    pub season: String,
    pub team_id: i32,
    pub league_position: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDoc {
    pub user_id: String,
    /// Game name, e.g. "FM24".
    pub game: String,
    pub name: String,
    pub current_club_id: Option<i32>,
    pub current_nation_id: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub career_history: Vec<StintDoc>,
    #[serde(default)]
    pub trophies: Vec<TrophyDoc>,
    #[serde(default)]
    pub seasons: Vec<SeasonDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDoc {
    pub description: String,
    pub competition_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDoc {
    pub name: String,
    pub description: Option<String>,
    pub game: Option<String>,
    #[serde(default)]
    pub goals: Vec<GoalDoc>,
    pub created_at: Option<DateTime<Utc>>,
}
