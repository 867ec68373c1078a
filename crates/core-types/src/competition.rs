//! Competition taxonomy: filtering, presentation order and the grouping of
//! raw API competitions into [`CompetitionGroup`]s.

use crate::enums::CompetitionType;
use crate::structs::{Competition, CompetitionGroup};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Query filter for competition groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionGroupFilter {
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub competition_type: Option<CompetitionType>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl CompetitionGroupFilter {
    pub fn matches(&self, group: &CompetitionGroup) -> bool {
        if !group.is_active && !self.include_inactive {
            return false;
        }
        if let Some(country) = &self.country {
            if group.country_code.as_deref() != Some(country.as_str()) {
                return false;
            }
        }
        if let Some(kind) = self.competition_type {
            if group.competition_type != kind {
                return false;
            }
        }
        true
    }
}

/// All groups of one country, ready for a dropdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCompetitions {
    pub country_code: Option<String>,
    pub groups: Vec<CompetitionGroup>,
}

/// Leagues before cups, then by tier (untiered last), then by name.
pub fn compare_groups(a: &CompetitionGroup, b: &CompetitionGroup) -> Ordering {
    let tier = |g: &CompetitionGroup| g.tier.unwrap_or(i32::MAX);
    a.competition_type
        .cmp(&b.competition_type)
        .then_with(|| tier(a).cmp(&tier(b)))
        .then_with(|| a.name.cmp(&b.name))
}

/// Buckets groups by country. International groups (no country) come first,
/// then countries by code.
pub fn group_by_country(groups: Vec<CompetitionGroup>) -> Vec<CountryCompetitions> {
    // `None < Some(_)` puts international competitions at the front.
    let mut buckets: BTreeMap<Option<String>, Vec<CompetitionGroup>> = BTreeMap::new();
    for group in groups {
        buckets.entry(group.country_code.clone()).or_default().push(group);
    }
    buckets
        .into_iter()
        .map(|(country_code, mut groups)| {
            groups.sort_by(compare_groups);
            CountryCompetitions { country_code, groups }
        })
        .collect()
}

/// Lowercases, drops punctuation and collapses whitespace so
/// "Premier League" and "premier-league " compare equal.
pub fn normalize_competition_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupingKey {
    pub country_code: Option<String>,
    pub competition_type: CompetitionType,
    pub normalized_name: String,
}

impl GroupingKey {
    pub fn of_competition(c: &Competition) -> Self {
        Self {
            country_code: c.country_code.clone(),
            competition_type: c.competition_type,
            normalized_name: normalize_competition_name(&c.name),
        }
    }

    pub fn of_group(g: &CompetitionGroup) -> Self {
        Self {
            country_code: g.country_code.clone(),
            competition_type: g.competition_type,
            normalized_name: normalize_competition_name(&g.name),
        }
    }
}

/// A group that does not exist yet, with the competitions it will absorb.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedGroup {
    pub name: String,
    pub country_code: Option<String>,
    pub competition_type: CompetitionType,
    pub logo_url: Option<String>,
    pub competition_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingPlan {
    /// `(competition_id, group_id)` pairs for existing groups.
    pub assignments: Vec<(i32, i32)>,
    pub new_groups: Vec<ProposedGroup>,
}

impl GroupingPlan {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.new_groups.is_empty()
    }
}

/// Decides where every ungrouped competition belongs.
///
/// Competitions already attached to a group are left alone. Proposed groups
/// take the name and logo of their lowest-id member.
pub fn plan_groups(competitions: &[Competition], groups: &[CompetitionGroup]) -> GroupingPlan {
    let existing: BTreeMap<GroupingKey, i32> = groups
        .iter()
        .map(|g| (GroupingKey::of_group(g), g.id))
        .collect();

    let mut plan = GroupingPlan::default();
    let mut proposed: BTreeMap<GroupingKey, Vec<&Competition>> = BTreeMap::new();

    for competition in competitions.iter().filter(|c| c.group_id.is_none()) {
        let key = GroupingKey::of_competition(competition);
        match existing.get(&key) {
            Some(group_id) => plan.assignments.push((competition.id, *group_id)),
            None => proposed.entry(key).or_default().push(competition),
        }
    }

    for (key, mut members) in proposed {
        members.sort_by_key(|c| c.id);
        let representative = members[0];
        plan.new_groups.push(ProposedGroup {
            name: representative.name.clone(),
            country_code: key.country_code,
            competition_type: key.competition_type,
            logo_url: representative.logo_url.clone(),
            competition_ids: members.iter().map(|c| c.id).collect(),
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: i32, name: &str, country: Option<&str>, kind: CompetitionType, tier: Option<i32>, active: bool) -> CompetitionGroup {
        CompetitionGroup {
            id,
            name: name.to_string(),
            country_code: country.map(str::to_string),
            competition_type: kind,
            tier,
            is_active: active,
            logo_url: None,
        }
    }

    fn competition(id: i32, name: &str, country: Option<&str>, kind: CompetitionType, group_id: Option<i32>) -> Competition {
        Competition {
            id,
            name: name.to_string(),
            country_code: country.map(str::to_string),
            competition_type: kind,
            logo_url: Some(format!("https://logos/{id}.png")),
            group_id,
        }
    }

    #[test]
    fn filter_hides_inactive_groups_unless_requested() {
        let inactive = group(1, "Old Cup", Some("ENG"), CompetitionType::Cup, None, false);
        let mut filter = CompetitionGroupFilter::default();
        assert!(!filter.matches(&inactive));
        filter.include_inactive = true;
        assert!(filter.matches(&inactive));
    }

    #[test]
    fn filter_on_country_and_type() {
        let pl = group(1, "Premier League", Some("ENG"), CompetitionType::League, Some(1), true);
        let filter = CompetitionGroupFilter {
            country: Some("ENG".into()),
            competition_type: Some(CompetitionType::League),
            include_inactive: false,
        };
        assert!(filter.matches(&pl));

        let cup_only = CompetitionGroupFilter { competition_type: Some(CompetitionType::Cup), ..filter.clone() };
        assert!(!cup_only.matches(&pl));

        let spain = CompetitionGroupFilter { country: Some("ESP".into()), ..filter };
        assert!(!spain.matches(&pl));
    }

    #[test]
    fn grouped_by_country_with_leagues_by_tier_first() {
        let groups = vec![
            group(1, "FA Cup", Some("ENG"), CompetitionType::Cup, None, true),
            group(2, "Championship", Some("ENG"), CompetitionType::League, Some(2), true),
            group(3, "Champions League", None, CompetitionType::Cup, None, true),
            group(4, "Premier League", Some("ENG"), CompetitionType::League, Some(1), true),
            group(5, "La Liga", Some("ESP"), CompetitionType::League, Some(1), true),
            group(6, "National League", Some("ENG"), CompetitionType::League, None, true),
        ];

        let grouped = group_by_country(groups);
        let countries: Vec<_> = grouped.iter().map(|c| c.country_code.clone()).collect();
        assert_eq!(countries, vec![None, Some("ENG".into()), Some("ESP".into())]);

        let england: Vec<_> = grouped[1].groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(england, vec!["Premier League", "Championship", "National League", "FA Cup"]);
    }

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        assert_eq!(normalize_competition_name("  Premier-League "), "premier league");
        assert_eq!(normalize_competition_name("Premier League"), normalize_competition_name("premier league"));
    }

    #[test]
    fn plan_reuses_existing_groups_and_proposes_new_ones() {
        let groups = vec![group(10, "Premier League", Some("ENG"), CompetitionType::League, Some(1), true)];
        let competitions = vec![
            competition(39, "Premier League", Some("ENG"), CompetitionType::League, None),
            competition(45, "FA Cup", Some("ENG"), CompetitionType::Cup, None),
            competition(900, "FA-Cup", Some("ENG"), CompetitionType::Cup, None),
            competition(46, "EFL Trophy", Some("ENG"), CompetitionType::Cup, Some(11)),
            competition(140, "Premier League", Some("SCO"), CompetitionType::League, None),
        ];

        let plan = plan_groups(&competitions, &groups);
        assert_eq!(plan.assignments, vec![(39, 10)]);
        assert_eq!(plan.new_groups.len(), 2);

        let fa_cup = plan.new_groups.iter().find(|g| g.name == "FA Cup").unwrap();
        assert_eq!(fa_cup.competition_ids, vec![45, 900]);
        assert_eq!(fa_cup.logo_url.as_deref(), Some("https://logos/45.png"));

        let scottish = plan.new_groups.iter().find(|g| g.country_code.as_deref() == Some("SCO")).unwrap();
        assert_eq!(scottish.competition_ids, vec![140]);
    }

    #[test]
    fn plan_is_empty_when_everything_is_grouped() {
        let competitions = vec![competition(39, "Premier League", Some("ENG"), CompetitionType::League, Some(10))];
        assert!(plan_groups(&competitions, &[]).is_empty());
    }
}
