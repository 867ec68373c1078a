use core_types::{Competition, CompetitionType, Country, Team};
use serde::Deserialize;
use serde_json::Value as JsonValue;

// api-sports wraps every payload in the same envelope. `errors` is an empty
// array on success and an object keyed by error kind otherwise.

/// The common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub errors: JsonValue,
    #[serde(default)]
    pub results: u32,
    pub response: Vec<T>,
}

impl<T> Envelope<T> {
    /// The provider's error messages, joined, if any were reported.
    pub fn error_message(&self) -> Option<String> {
        let messages: Vec<String> = match &self.errors {
            JsonValue::Object(map) => map
                .iter()
                .map(|(key, value)| match value.as_str() {
                    Some(text) => format!("{key}: {text}"),
                    None => format!("{key}: {value}"),
                })
                .collect(),
            JsonValue::Array(items) => items.iter().map(|v| v.to_string()).collect(),
            _ => Vec::new(),
        };
        if messages.is_empty() { None } else { Some(messages.join("; ")) }
    }
}

/// An entry from `GET /countries`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCountry {
    pub name: String,
    pub code: Option<String>,
    pub flag: Option<String>,
}

impl ApiCountry {
    /// "World" and other pseudo-countries have no code and are skipped.
    pub fn into_country(self) -> Option<Country> {
        let code = self.code?;
        Some(Country {
            code,
            name: self.name,
            flag_url: self.flag,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLeague {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub league_type: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLeagueSeason {
    pub year: i32,
    #[serde(default)]
    pub current: bool,
}

/// An entry from `GET /leagues`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLeagueEntry {
    pub league: ApiLeague,
    pub country: ApiCountry,
    #[serde(default)]
    pub seasons: Vec<ApiLeagueSeason>,
}

impl ApiLeagueEntry {
    /// Returns `None` for league types the taxonomy does not model.
    pub fn into_competition(self) -> Option<Competition> {
        let competition_type = self.league.league_type.parse::<CompetitionType>().ok()?;
        Some(Competition {
            id: self.league.id,
            name: self.league.name,
            country_code: self.country.code,
            competition_type,
            logo_url: self.league.logo,
            group_id: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeam {
    pub id: i32,
    pub name: String,
    /// Country *name*, not code.
    pub country: Option<String>,
    #[serde(default)]
    pub national: bool,
    pub logo: Option<String>,
}

/// An entry from `GET /teams`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTeamEntry {
    pub team: ApiTeam,
}

impl ApiTeamEntry {
    pub fn into_team(self, country_code: Option<String>) -> Team {
        Team {
            id: self.team.id,
            name: self.team.name,
            country_code,
            logo_url: self.team.logo,
            is_national: self.team.national,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn errors_object_is_reported() {
        let envelope: Envelope<ApiCountry> = serde_json::from_value(json!({
            "errors": { "token": "Error/Missing application key" },
            "results": 0,
            "response": []
        }))
        .unwrap();
        assert_eq!(envelope.error_message().unwrap(), "token: Error/Missing application key");
    }

    #[test]
    fn empty_errors_array_is_success() {
        let envelope: Envelope<ApiCountry> =
            serde_json::from_value(json!({ "errors": [], "results": 0, "response": [] })).unwrap();
        assert!(envelope.error_message().is_none());
    }

    #[test]
    fn league_maps_to_competition() {
        let entry: ApiLeagueEntry = serde_json::from_value(json!({
            "league": { "id": 39, "name": "Premier League", "type": "League", "logo": "https://media/39.png" },
            "country": { "name": "England", "code": "GB-ENG", "flag": null },
            "seasons": [ { "year": 2023, "current": false }, { "year": 2024, "current": true } ]
        }))
        .unwrap();
        let competition = entry.into_competition().unwrap();
        assert_eq!(competition.competition_type, CompetitionType::League);
        assert_eq!(competition.country_code.as_deref(), Some("GB-ENG"));
        assert_eq!(competition.group_id, None);
    }

    #[test]
    fn world_is_not_a_country() {
        let world = ApiCountry { name: "World".into(), code: None, flag: None };
        assert!(world.into_country().is_none());
    }
}
