use core_types::{CompetitionGroup, CompetitionType, Team};
use serde::{Deserialize, Serialize};

/// A team as stored in the teams index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    pub logo_url: Option<String>,
    pub is_national: bool,
}

impl From<&Team> for TeamRecord {
    fn from(team: &Team) -> Self {
        Self {
            object_id: team.id.to_string(),
            id: team.id,
            name: team.name.clone(),
            country_code: team.country_code.clone(),
            logo_url: team.logo_url.clone(),
            is_national: team.is_national,
        }
    }
}

/// A competition group as stored in the competitions index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub id: i32,
    pub name: String,
    pub country_code: Option<String>,
    #[serde(rename = "type")]
    pub competition_type: CompetitionType,
    pub tier: Option<i32>,
    pub is_active: bool,
    pub logo_url: Option<String>,
}

impl From<&CompetitionGroup> for CompetitionRecord {
    fn from(group: &CompetitionGroup) -> Self {
        Self {
            object_id: group.id.to_string(),
            id: group.id,
            name: group.name.clone(),
            country_code: group.country_code.clone(),
            competition_type: group.competition_type,
            tier: group.tier,
            is_active: group.is_active,
            logo_url: group.logo_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn team_record_uses_the_team_id_as_object_id() {
        let team = Team {
            id: 33,
            name: "Manchester United".into(),
            country_code: Some("GB-ENG".into()),
            logo_url: None,
            is_national: false,
        };
        let value = serde_json::to_value(TeamRecord::from(&team)).unwrap();
        assert_eq!(value["objectID"], json!("33"));
        assert_eq!(value["countryCode"], json!("GB-ENG"));
        assert_eq!(value["isNational"], json!(false));
    }

    #[test]
    fn competition_record_carries_type_and_tier() {
        let group = CompetitionGroup {
            id: 7,
            name: "Premier League".into(),
            country_code: Some("GB-ENG".into()),
            competition_type: CompetitionType::League,
            tier: Some(1),
            is_active: true,
            logo_url: None,
        };
        let value = serde_json::to_value(CompetitionRecord::from(&group)).unwrap();
        assert_eq!(value["objectID"], json!("7"));
        assert_eq!(value["type"], json!("league"));
        assert_eq!(value["tier"], json!(1));
    }
}
