//! Enrichment from the football-data API: countries, competitions and teams.

use crate::error::MigrationError;
use crate::report::{MigrationReport, progress_bar};
use api_client::FootballApi;
use core_types::CompetitionGroupFilter;
use core_types::competition::plan_groups;
use core_types::requests::NewCompetitionGroup;
use database::Store;
use std::collections::{HashMap, HashSet};

/// The provider files international competitions under this pseudo-country.
const INTERNATIONAL: &str = "World";

pub async fn import_countries(
    api: &dyn FootballApi,
    store: &dyn Store,
) -> Result<MigrationReport, MigrationError> {
    let countries = api.fetch_countries().await?;
    let mut report = MigrationReport::new("countries");

    for entry in countries {
        let name = entry.name.clone();
        match entry.into_country() {
            Some(country) => report.record_write(&name, store.upsert_country(&country).await),
            None => report.skip(&name, "no country code"),
        }
    }
    Ok(report)
}

/// Imports the competitions of every stored country, then attaches the
/// ungrouped ones to competition groups. Returns the competition report and
/// the grouping report.
pub async fn import_competitions(
    api: &dyn FootballApi,
    store: &dyn Store,
) -> Result<Vec<MigrationReport>, MigrationError> {
    let mut country_names: Vec<String> =
        store.list_countries().await?.into_iter().map(|c| c.name).collect();
    country_names.push(INTERNATIONAL.to_string());

    let mut report = MigrationReport::new("competitions");
    let progress = progress_bar(country_names.len(), "competitions")?;

    for name in &country_names {
        progress.set_message(&format!("Fetching {name}..."));
        progress.inc(1);
        let leagues = match api.fetch_leagues(name).await {
            Ok(leagues) => leagues,
            Err(e) => {
                report.fail(name, e);
                continue;
            }
        };
        for entry in leagues {
            let key = format!("{} ({})", entry.league.name, entry.league.id);
            match entry.into_competition() {
                Some(competition) => {
                    report.record_write(&key, store.upsert_competition(&competition).await)
                }
                None => report.skip(&key, "unsupported competition type"),
            }
        }
    }
    progress.finish_and_clear();

    let grouping = regroup_competitions(store).await?;
    Ok(vec![report, grouping])
}

/// Applies [`plan_groups`] to the stored competitions. New groups are
/// created inactive until an admin reviews them.
pub async fn regroup_competitions(store: &dyn Store) -> Result<MigrationReport, MigrationError> {
    let competitions = store.list_competitions().await?;
    let all_groups = CompetitionGroupFilter {
        include_inactive: true,
        ..CompetitionGroupFilter::default()
    };
    let groups = store.list_competition_groups(&all_groups).await?;
    let plan = plan_groups(&competitions, &groups);

    let mut report = MigrationReport::new("competition grouping");
    for (competition_id, group_id) in plan.assignments {
        match store.assign_competition(competition_id, Some(group_id)).await {
            Ok(true) => report.migrated(),
            Ok(false) => report.skip(competition_id, "competition disappeared"),
            Err(e) => report.fail(competition_id, e),
        }
    }

    for proposed in plan.new_groups {
        let request = NewCompetitionGroup {
            name: proposed.name.clone(),
            country_code: proposed.country_code.clone(),
            competition_type: proposed.competition_type,
            tier: None,
            is_active: false,
            logo_url: proposed.logo_url.clone(),
        };
        let group = match store.create_competition_group(&request).await {
            Ok(group) => group,
            Err(e) => {
                for id in &proposed.competition_ids {
                    report.fail(id, &e);
                }
                continue;
            }
        };
        tracing::info!(group_id = group.id, name = %group.name, "Created inactive competition group.");
        for competition_id in proposed.competition_ids {
            match store.assign_competition(competition_id, Some(group.id)).await {
                Ok(true) => report.migrated(),
                Ok(false) => report.skip(competition_id, "competition disappeared"),
                Err(e) => report.fail(competition_id, e),
            }
        }
    }
    Ok(report)
}

/// Imports the teams of every member competition of every active group for
/// the given season year.
pub async fn import_teams(
    api: &dyn FootballApi,
    store: &dyn Store,
    season: i32,
) -> Result<MigrationReport, MigrationError> {
    // The provider reports a team's country by name.
    let codes_by_name: HashMap<String, String> = store
        .list_countries()
        .await?
        .into_iter()
        .map(|c| (c.name, c.code))
        .collect();

    let mut competition_ids = Vec::new();
    for group in store.list_competition_groups(&CompetitionGroupFilter::default()).await? {
        for competition in store.list_group_members(group.id).await? {
            competition_ids.push(competition.id);
        }
    }

    let mut report = MigrationReport::new("teams");
    let mut seen = HashSet::new();
    let progress = progress_bar(competition_ids.len(), "teams")?;

    for league_id in competition_ids {
        progress.inc(1);
        let entries = match api.fetch_teams(league_id, season).await {
            Ok(entries) => entries,
            Err(e) => {
                report.fail(format!("league {league_id}"), e);
                continue;
            }
        };
        for entry in entries {
            let key = format!("{} ({})", entry.team.name, entry.team.id);
            if !seen.insert(entry.team.id) {
                report.skip(&key, "already imported in this run");
                continue;
            }
            let country_code = entry
                .team
                .country
                .as_ref()
                .and_then(|name| codes_by_name.get(name))
                .cloned();
            let team = entry.into_team(country_code);
            report.record_write(&key, store.upsert_team(&team).await);
        }
    }

    progress.finish_and_clear();
    Ok(report)
}
