//! Request payloads accepted by the API, with their shape validation.
//!
//! Validation here only checks the payload on its own. Whether referenced
//! teams, groups or challenges exist is up to the caller, which has the store.

use crate::enums::CompetitionType;
use crate::error::CoreError;
use crate::season::{parse_season, season_for_date};
use crate::structs::{Challenge, ChallengeGoal, CareerStint, Season, Trophy};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, "must not be blank"));
    }
    Ok(())
}

fn require_positive(field: &str, value: Option<i32>) -> Result<(), CoreError> {
    match value {
        Some(v) if v < 1 => Err(CoreError::invalid(field, "must be at least 1")),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSave {
    pub game_id: i32,
    pub name: String,
    pub team_id: Option<i32>,
    pub nation_id: Option<i32>,
    /// Start of the first career stint. Defaults to today.
    pub start_date: Option<NaiveDate>,
}

impl NewSave {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSave {
    pub name: Option<String>,
    pub current_team_id: Option<i32>,
    pub current_nation_id: Option<i32>,
}

impl UpdateSave {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStint {
    pub team_id: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_national: bool,
}

impl NewStint {
    pub fn validate(&self) -> Result<(), CoreError> {
        check_interval(self.start_date, self.end_date)
    }

    pub fn into_stint(self, save_id: Uuid) -> CareerStint {
        CareerStint {
            id: Uuid::new_v4(),
            save_id,
            team_id: self.team_id,
            start_date: self.start_date,
            end_date: self.end_date,
            is_national: self.is_national,
        }
    }
}

fn check_interval(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), CoreError> {
    match end {
        Some(end) if end < start => Err(CoreError::invalid("end_date", "must not be before start_date")),
        _ => Ok(()),
    }
}

/// A missing `end_date` leaves it alone; an explicit `null` reopens the stint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStint {
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<NaiveDate>>,
}

impl UpdateStint {
    /// Applies the update and checks the resulting interval.
    pub fn apply(&self, stint: &mut CareerStint) -> Result<(), CoreError> {
        if let Some(start) = self.start_date {
            stint.start_date = start;
        }
        if let Some(end) = self.end_date {
            stint.end_date = end;
        }
        check_interval(stint.start_date, stint.end_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrophy {
    pub team_id: i32,
    pub competition_group_id: i32,
    pub date_won: NaiveDate,
    /// Inferred from `date_won` when absent.
    pub season: Option<String>,
}

impl NewTrophy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(season) = &self.season {
            parse_season(season)?;
        }
        Ok(())
    }

    pub fn into_trophy(self, save_id: Uuid, now: DateTime<Utc>) -> Trophy {
        let season = self.season.unwrap_or_else(|| season_for_date(self.date_won));
        Trophy {
            id: Uuid::new_v4(),
            save_id,
            team_id: self.team_id,
            competition_group_id: self.competition_group_id,
            season,
            date_won: self.date_won,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSeason {
    pub season: Option<String>,
    /// Any date inside the season, used when `season` is absent.
    pub date: Option<NaiveDate>,
    pub team_id: i32,
    pub league_position: Option<i32>,
    pub notes: Option<String>,
}

impl NewSeason {
    pub fn validate(&self) -> Result<(), CoreError> {
        match (&self.season, self.date) {
            (Some(season), _) => {
                parse_season(season)?;
            }
            (None, Some(_)) => {}
            (None, None) => return Err(CoreError::invalid("season", "either season or date is required")),
        }
        require_positive("league_position", self.league_position)
    }

    pub fn resolved_season(&self) -> Option<String> {
        self.season.clone().or_else(|| self.date.map(season_for_date))
    }

    pub fn into_season(self, save_id: Uuid, now: DateTime<Utc>) -> Result<Season, CoreError> {
        self.validate()?;
        let season = self
            .resolved_season()
            .ok_or_else(|| CoreError::invalid("season", "either season or date is required"))?;
        Ok(Season {
            id: Uuid::new_v4(),
            save_id,
            season,
            team_id: self.team_id,
            league_position: self.league_position,
            notes: self.notes,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChallengeGoal {
    pub description: String,
    pub competition_group_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChallenge {
    pub name: String,
    pub description: Option<String>,
    pub game_id: Option<i32>,
    pub goals: Vec<NewChallengeGoal>,
}

impl NewChallenge {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)?;
        if self.goals.is_empty() {
            return Err(CoreError::invalid("goals", "a challenge needs at least one goal"));
        }
        for goal in &self.goals {
            require_text("goals.description", &goal.description)?;
        }
        Ok(())
    }

    pub fn into_challenge(self, now: DateTime<Utc>) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            game_id: self.game_id,
            goals: self
                .goals
                .into_iter()
                .map(|g| ChallengeGoal {
                    id: Uuid::new_v4(),
                    description: g.description,
                    competition_group_id: g.competition_group_id,
                })
                .collect(),
            created_at: now,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompetitionGroup {
    pub name: String,
    pub country_code: Option<String>,
    pub competition_type: CompetitionType,
    pub tier: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub logo_url: Option<String>,
}

impl NewCompetitionGroup {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)?;
        require_positive("tier", self.tier)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompetitionGroup {
    pub name: Option<String>,
    pub tier: Option<i32>,
    pub is_active: Option<bool>,
    pub logo_url: Option<String>,
}

impl UpdateCompetitionGroup {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        require_positive("tier", self.tier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartChallenge {
    pub challenge_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgress {
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
}

impl UpdateProfile {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.display_name {
            require_text("display_name", name)?;
        }
        Ok(())
    }
}
