//! Batch jobs: the one-off migration from the legacy document store,
//! enrichment from the football-data API and search index seeding.
//!
//! Jobs run sequentially and never roll back. Anything that goes wrong with
//! a single record is logged and counted in a [`MigrationReport`]; only
//! failures that stop the whole job (the source is unreachable, the database
//! is down) are returned as errors.

pub mod enrich;
pub mod error;
pub mod migrate;
pub mod report;
pub mod seed;
pub mod source;

pub use enrich::{import_competitions, import_countries, import_teams, regroup_competitions};
pub use error::MigrationError;
pub use migrate::{SaveMigration, migrate_challenges, migrate_saves, migrate_users};
pub use report::{MigrationReport, dedupe_by};
pub use seed::{seed_competitions, seed_teams};

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use api_client::{ApiCountry, ApiLeagueEntry, ApiTeamEntry, FootballApi};
    use async_trait::async_trait;
    use chrono::Utc;
    use core_types::requests::NewCompetitionGroup;
    use core_types::{
        Competition, CompetitionGroupFilter, CompetitionType, Country, Team, User, UserRole,
    };
    use database::{MemoryStore, Store};
    use firestore::error::FirestoreError;
    use firestore::{Document, DocumentSource};
    use search::SearchBackend;
    use search::error::SearchError;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // --- Fakes ---

    #[derive(Default)]
    struct FakeSource {
        collections: HashMap<String, Vec<Document>>,
    }

    impl FakeSource {
        fn with(mut self, collection: &str, id: &str, fields: Value) -> Self {
            let fields = fields.as_object().cloned().unwrap_or_default();
            self.collections
                .entry(collection.to_string())
                .or_default()
                .push(Document { id: id.to_string(), fields });
            self
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
            Ok(self.collections.get(collection).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeApi {
        countries: Vec<Value>,
        leagues: HashMap<String, Vec<Value>>,
        teams: HashMap<i32, Vec<Value>>,
    }

    fn parse_all<T: serde::de::DeserializeOwned>(values: &[Value]) -> Vec<T> {
        values.iter().map(|v| serde_json::from_value(v.clone()).unwrap()).collect()
    }

    #[async_trait]
    impl FootballApi for FakeApi {
        async fn fetch_countries(&self) -> Result<Vec<ApiCountry>, ApiError> {
            Ok(parse_all(&self.countries))
        }

        async fn fetch_leagues(&self, country: &str) -> Result<Vec<ApiLeagueEntry>, ApiError> {
            Ok(self.leagues.get(country).map(|v| parse_all(v)).unwrap_or_default())
        }

        async fn fetch_teams(&self, league_id: i32, _season: i32) -> Result<Vec<ApiTeamEntry>, ApiError> {
            Ok(self.teams.get(&league_id).map(|v| parse_all(v)).unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        fail: bool,
        batches: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), SearchError> {
            if self.fail {
                return Err(SearchError::Status(500, "unavailable".into()));
            }
            self.batches.lock().unwrap().push((index.to_string(), objects.len()));
            Ok(())
        }

        async fn search(&self, _index: &str, _query: &str, _limit: usize) -> Result<Vec<Value>, SearchError> {
            Ok(Vec::new())
        }
    }

    // --- Fixtures ---

    fn league(id: i32, name: &str, kind: &str, country: &str, code: Option<&str>) -> Value {
        json!({
            "league": { "id": id, "name": name, "type": kind, "logo": null },
            "country": { "name": country, "code": code, "flag": null },
            "seasons": []
        })
    }

    fn team_entry(id: i32, name: &str, country: &str) -> Value {
        json!({ "team": { "id": id, "name": name, "country": country, "national": false, "logo": null } })
    }

    fn team(id: i32, name: &str) -> Team {
        Team { id, name: name.into(), country_code: None, logo_url: None, is_national: false }
    }

    fn group(name: &str, country: Option<&str>, kind: CompetitionType, active: bool) -> NewCompetitionGroup {
        NewCompetitionGroup {
            name: name.into(),
            country_code: country.map(str::to_string),
            competition_type: kind,
            tier: None,
            is_active: active,
            logo_url: None,
        }
    }

    fn competition(id: i32, name: &str, country: Option<&str>, kind: CompetitionType, group_id: Option<i32>) -> Competition {
        Competition {
            id,
            name: name.into(),
            country_code: country.map(str::to_string),
            competition_type: kind,
            logo_url: None,
            group_id,
        }
    }

    async fn england(store: &MemoryStore) {
        store
            .upsert_country(&Country { code: "GB-ENG".into(), name: "England".into(), flag_url: None })
            .await
            .unwrap();
    }

    fn counts(report: &MigrationReport) -> (usize, usize, usize) {
        (report.migrated, report.skipped, report.failed)
    }

    // --- Migration ---

    #[tokio::test]
    async fn users_are_deduplicated_and_not_migrated_twice() {
        let source = FakeSource::default()
            .with("users", "uid-1", json!({ "email": "one@example.com", "isAdmin": true }))
            .with("users", "uid-1", json!({ "email": "dupe@example.com" }))
            .with("users", "uid-2", json!({ "displayName": "Two" }));
        let store = MemoryStore::new();

        let report = migrate_users(&source, &store, false).await.unwrap();
        assert_eq!(counts(&report), (2, 0, 0));
        let admin = store.get_user("uid-1").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.email.as_deref(), Some("one@example.com"));

        let rerun = migrate_users(&source, &store, false).await.unwrap();
        assert_eq!(counts(&rerun), (0, 2, 0));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let source = FakeSource::default().with("users", "uid-1", json!({}));
        let store = MemoryStore::new();

        let report = migrate_users(&source, &store, true).await.unwrap();
        assert_eq!(report.migrated, 1);
        assert!(store.get_user("uid-1").await.unwrap().is_none());
    }

    async fn save_fixture() -> (FakeSource, MemoryStore) {
        let store = MemoryStore::new();
        store
            .upsert_user(&User {
                id: "uid-1".into(),
                email: None,
                display_name: None,
                role: UserRole::User,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store.upsert_team(&team(33, "Manchester United")).await.unwrap();
        let premier = store
            .create_competition_group(&group("Premier League", None, CompetitionType::League, true))
            .await
            .unwrap();
        store
            .upsert_competition(&competition(39, "Premier League", None, CompetitionType::League, Some(premier.id)))
            .await
            .unwrap();

        let source = FakeSource::default()
            .with(
                "saves",
                "save-1",
                json!({
                    "userId": "uid-1",
                    "game": "FM24",
                    "name": "Glory Glory",
                    "currentClubId": 33,
                    "createdAt": "2024-01-10T09:00:00Z",
                    "careerHistory": [
                        { "teamId": 33, "startDate": "2023-07-01", "endDate": null },
                        { "teamId": 33, "startDate": "2023-07-01", "endDate": "2022-01-01" }
                    ],
                    "trophies": [
                        { "teamId": 33, "competitionId": 39, "dateWon": "2024-05-19T15:00:00Z" },
                        { "teamId": 33, "competitionId": 999, "dateWon": "2024-05-25" }
                    ],
                    "seasons": [
                        { "season": "2023/2024", "teamId": 33, "leaguePosition": 1 },
                        { "season": "2023/2024", "teamId": 33, "leaguePosition": 2 }
                    ]
                }),
            )
            .with(
                "saves",
                "save-2",
                json!({
                    "userId": "uid-1",
                    "game": "FM99",
                    "name": "Unknown game",
                    "careerHistory": [ { "teamId": 33, "startDate": "2023-07-01" } ]
                }),
            );
        (source, store)
    }

    #[tokio::test]
    async fn saves_migrate_with_embedded_history() {
        let (source, store) = save_fixture().await;

        let result = migrate_saves(&source, &store, false).await.unwrap();
        assert_eq!(counts(&result.saves), (1, 1, 0));
        assert_eq!(counts(&result.stints), (1, 2, 0));
        assert_eq!(counts(&result.trophies), (1, 1, 0));
        assert_eq!(counts(&result.seasons), (1, 1, 0));

        let saves = store.list_saves("uid-1").await.unwrap();
        assert_eq!(saves.len(), 1);
        let detail = store.get_save_detail(saves[0].id).await.unwrap().unwrap();
        assert_eq!(detail.save.game_id, 2);
        assert_eq!(detail.save.current_team_id, Some(33));
        assert_eq!(detail.stints.len(), 1);
        assert!(detail.stints[0].is_current());
        assert_eq!(detail.trophies[0].season, "2023/2024");
        assert_eq!(detail.seasons[0].league_position, Some(1));
    }

    #[tokio::test]
    async fn rerunning_save_migration_skips_everything() {
        let (source, store) = save_fixture().await;
        migrate_saves(&source, &store, false).await.unwrap();

        let rerun = migrate_saves(&source, &store, false).await.unwrap();
        for report in rerun.into_reports() {
            assert_eq!(report.migrated, 0, "{} migrated again", report.entity);
            assert_eq!(report.failed, 0);
        }
        assert_eq!(store.list_saves("uid-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn challenges_map_goal_competitions_to_groups() {
        let (_, store) = save_fixture().await;
        let source = FakeSource::default()
            .with(
                "challenges",
                "treble",
                json!({
                    "name": "Treble",
                    "game": "FM24",
                    "goals": [
                        { "description": "Win the league", "competitionId": 39 },
                        { "description": "Win something obscure", "competitionId": 12345 }
                    ]
                }),
            )
            .with("challenges", "empty", json!({ "name": "Nothing", "goals": [] }));

        let report = migrate_challenges(&source, &store, false).await.unwrap();
        assert_eq!(counts(&report), (1, 1, 0));

        let challenges = store.list_challenges(Some(2)).await.unwrap();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].goals[0].competition_group_id, Some(1));
        assert_eq!(challenges[0].goals[1].competition_group_id, None);
    }

    // --- Enrichment ---

    #[tokio::test]
    async fn countries_without_codes_are_skipped() {
        let api = FakeApi {
            countries: vec![
                json!({ "name": "England", "code": "GB-ENG", "flag": null }),
                json!({ "name": "World", "code": null, "flag": null }),
            ],
            ..FakeApi::default()
        };
        let store = MemoryStore::new();

        let report = import_countries(&api, &store).await.unwrap();
        assert_eq!(counts(&report), (1, 1, 0));
        assert_eq!(store.list_countries().await.unwrap()[0].code, "GB-ENG");
    }

    #[tokio::test]
    async fn imported_competitions_are_grouped() {
        let store = MemoryStore::new();
        england(&store).await;
        store
            .create_competition_group(&group("Premier League", Some("GB-ENG"), CompetitionType::League, true))
            .await
            .unwrap();

        let mut api = FakeApi::default();
        api.leagues.insert(
            "England".into(),
            vec![
                league(39, "Premier League", "League", "England", Some("GB-ENG")),
                league(45, "FA Cup", "Cup", "England", Some("GB-ENG")),
                league(667, "Friendlies Clubs", "Friendly", "England", Some("GB-ENG")),
            ],
        );
        api.leagues.insert(
            "World".into(),
            vec![league(2, "UEFA Champions League", "Cup", "World", None)],
        );

        let reports = import_competitions(&api, &store).await.unwrap();
        assert_eq!(counts(&reports[0]), (3, 1, 0));
        assert_eq!(counts(&reports[1]), (3, 0, 0));

        assert_eq!(store.get_competition(39).await.unwrap().unwrap().group_id, Some(1));
        let all = CompetitionGroupFilter { include_inactive: true, ..Default::default() };
        assert_eq!(store.list_competition_groups(&all).await.unwrap().len(), 3);
        let active = store.list_competition_groups(&CompetitionGroupFilter::default()).await.unwrap();
        assert_eq!(active.len(), 1);

        // A second pass has nothing left to group.
        let again = regroup_competitions(&store).await.unwrap();
        assert_eq!(again.total(), 0);
    }

    #[tokio::test]
    async fn teams_come_from_active_groups_only() {
        let store = MemoryStore::new();
        england(&store).await;
        let active = store
            .create_competition_group(&group("Premier League", Some("GB-ENG"), CompetitionType::League, true))
            .await
            .unwrap();
        let inactive = store
            .create_competition_group(&group("National League", Some("GB-ENG"), CompetitionType::League, false))
            .await
            .unwrap();
        for (id, group_id) in [(39, active.id), (40, active.id), (43, inactive.id)] {
            store
                .upsert_competition(&competition(id, "League", Some("GB-ENG"), CompetitionType::League, Some(group_id)))
                .await
                .unwrap();
        }

        let mut api = FakeApi::default();
        api.teams.insert(39, vec![team_entry(42, "Arsenal", "England"), team_entry(49, "Chelsea", "England")]);
        api.teams.insert(40, vec![team_entry(42, "Arsenal", "England")]);
        api.teams.insert(43, vec![team_entry(1822, "Wrexham", "Wales")]);

        let report = import_teams(&api, &store, 2024).await.unwrap();
        assert_eq!(counts(&report), (2, 1, 0));
        let arsenal = store.get_team(42).await.unwrap().unwrap();
        assert_eq!(arsenal.country_code.as_deref(), Some("GB-ENG"));
        assert!(store.get_team(1822).await.unwrap().is_none());
    }

    // --- Seeding ---

    #[tokio::test]
    async fn teams_are_seeded_in_batches() {
        let store = MemoryStore::new();
        for id in 1..=5 {
            store.upsert_team(&team(id, &format!("Team {id}"))).await.unwrap();
        }
        let backend = FakeBackend::default();

        let report = seed_teams(&backend, &store, "teams", 2).await.unwrap();
        assert_eq!(counts(&report), (5, 0, 0));
        let sizes: Vec<usize> = backend.batches.lock().unwrap().iter().map(|(_, n)| *n).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn failed_batches_are_counted() {
        let store = MemoryStore::new();
        store
            .create_competition_group(&group("Premier League", None, CompetitionType::League, true))
            .await
            .unwrap();
        store
            .create_competition_group(&group("Old Cup", None, CompetitionType::Cup, false))
            .await
            .unwrap();
        let backend = FakeBackend { fail: true, ..FakeBackend::default() };

        let report = seed_competitions(&backend, &store, "competitions", 100).await.unwrap();
        assert_eq!(counts(&report), (0, 0, 1));
    }
}
