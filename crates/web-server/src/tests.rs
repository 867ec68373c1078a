use super::*;
use crate::auth::Claims;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use core_types::requests::NewCompetitionGroup;
use core_types::{CompetitionType, Country, Team};
use database::MemoryStore;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.admin_uids = vec!["admin-1".to_string()];
    config
}

fn token(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
        email: Some(format!("{user_id}@example.com")),
        name: None,
        admin: false,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for (id, name) in [(33, "Manchester United"), (34, "Manchester City"), (1118, "Netherlands")] {
        store
            .upsert_team(&Team {
                id,
                name: name.to_string(),
                country_code: None,
                logo_url: None,
                is_national: id == 1118,
            })
            .await
            .unwrap();
    }
    let state = Arc::new(AppState::new(&config(), store.clone() as Arc<dyn Store>));
    (build_router(state, 1024 * 1024), store)
}

async fn send(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer {}", token(user)));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn create_save(app: &Router, user: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/saves",
        Some(user),
        Some(json!({ "game_id": 2, "name": "Glory Glory", "team_id": 33, "start_date": "2024-07-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/api/saves", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/api/saves")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_request_registers_the_user() {
    let (app, store) = app().await;
    let (status, body) = send(&app, "GET", "/api/users/me", Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "uid-1@example.com");
    assert!(store.get_user("uid-1").await.unwrap().is_some());

    let (status, body) =
        send(&app, "PUT", "/api/users/me", Some("uid-1"), Some(json!({ "display_name": "Gaffer" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Gaffer");
}

#[tokio::test]
async fn creating_a_save_opens_the_first_stint() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    assert_eq!(save["current_team_id"], 33);
    assert_eq!(save["stints"].as_array().unwrap().len(), 1);
    assert_eq!(save["stints"][0]["start_date"], "2024-07-01");
    assert!(save["stints"][0]["end_date"].is_null());

    let (status, saves) = send(&app, "GET", "/api/saves", Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saves.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_team_is_a_bad_request() {
    let (app, _) = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/saves",
        Some("uid-1"),
        Some(json!({ "game_id": 2, "name": "Nowhere FC", "team_id": 999999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn saves_are_private_to_their_owner() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let uri = format!("/api/saves/{}", save["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some("uid-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &uri, Some("uid-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/api/saves/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &missing, Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_new_current_stint_closes_the_previous_one() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let save_uri = format!("/api/saves/{}", save["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        "POST",
        &format!("{save_uri}/stints"),
        Some("uid-1"),
        Some(json!({ "team_id": 34, "start_date": "2025-07-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A national job runs alongside the club one.
    let (status, _) = send(
        &app,
        "POST",
        &format!("{save_uri}/stints"),
        Some("uid-1"),
        Some(json!({ "team_id": 1118, "start_date": "2025-09-01", "is_national": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = send(&app, "GET", &save_uri, Some("uid-1"), None).await;
    assert_eq!(detail["current_team_id"], 34);
    assert_eq!(detail["current_nation_id"], 1118);
    let stints = detail["stints"].as_array().unwrap();
    let united = stints.iter().find(|s| s["team_id"] == 33).unwrap();
    let city = stints.iter().find(|s| s["team_id"] == 34).unwrap();
    assert_eq!(united["end_date"], "2025-07-01");
    assert!(city["end_date"].is_null());
}

fn open_stints(detail: &Value, national: bool) -> Vec<Value> {
    detail["stints"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["end_date"].is_null() && s["is_national"] == national)
        .cloned()
        .collect()
}

#[tokio::test]
async fn a_backdated_open_stint_ends_where_the_current_one_starts() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let save_uri = format!("/api/saves/{}", save["id"].as_str().unwrap());

    let (status, stint) = send(
        &app,
        "POST",
        &format!("{save_uri}/stints"),
        Some("uid-1"),
        Some(json!({ "team_id": 34, "start_date": "2023-07-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stint["end_date"], "2024-07-01");

    let (_, detail) = send(&app, "GET", &save_uri, Some("uid-1"), None).await;
    let open = open_stints(&detail, false);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["team_id"], 33);
    assert_eq!(detail["current_team_id"], 33);
}

#[tokio::test]
async fn closing_and_reopening_a_stint_moves_the_current_team() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let save_uri = format!("/api/saves/{}", save["id"].as_str().unwrap());
    let stint_id = save["stints"][0]["id"].as_str().unwrap().to_string();
    let stint_uri = format!("{save_uri}/stints/{stint_id}");

    let (status, stint) = send(&app, "PATCH", &stint_uri, Some("uid-1"), Some(json!({ "end_date": "2025-06-30" }))).await;
    assert_eq!(status, StatusCode::OK, "{stint}");
    assert_eq!(stint["end_date"], "2025-06-30");
    let (_, detail) = send(&app, "GET", &save_uri, Some("uid-1"), None).await;
    assert!(detail["current_team_id"].is_null());

    // Leaving `end_date` out keeps the stint closed.
    let (status, stint) = send(&app, "PATCH", &stint_uri, Some("uid-1"), Some(json!({ "start_date": "2024-08-01" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stint["end_date"], "2025-06-30");

    let (status, stint) = send(&app, "PATCH", &stint_uri, Some("uid-1"), Some(json!({ "end_date": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stint["end_date"].is_null());
    let (_, detail) = send(&app, "GET", &save_uri, Some("uid-1"), None).await;
    assert_eq!(detail["current_team_id"], 33);
    assert_eq!(open_stints(&detail, false).len(), 1);
}

#[tokio::test]
async fn reopening_an_older_stint_under_a_later_open_one_is_rejected() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let save_uri = format!("/api/saves/{}", save["id"].as_str().unwrap());
    let first_id = save["stints"][0]["id"].as_str().unwrap().to_string();

    // Closes the first stint at 2025-07-01.
    let (status, _) = send(
        &app,
        "POST",
        &format!("{save_uri}/stints"),
        Some("uid-1"),
        Some(json!({ "team_id": 34, "start_date": "2025-07-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("{save_uri}/stints/{first_id}");
    let (status, body) = send(&app, "PATCH", &uri, Some("uid-1"), Some(json!({ "end_date": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn deleting_the_current_stint_clears_the_current_team() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let save_uri = format!("/api/saves/{}", save["id"].as_str().unwrap());
    let stint_id = save["stints"][0]["id"].as_str().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("{save_uri}/stints/{stint_id}"), Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, detail) = send(&app, "GET", &save_uri, Some("uid-1"), None).await;
    assert!(detail["current_team_id"].is_null());
}

#[tokio::test]
async fn malformed_requests_get_json_400s() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "POST", "/api/saves", Some("uid-1"), Some(json!({ "name": "No game" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("game_id"));

    let (status, body) = send(&app, "GET", "/api/saves/not-a-uuid", Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/teams?q=united&limit=lots", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn trophies_infer_their_season_and_missing_ones_are_404() {
    let (app, store) = app().await;
    let group = store
        .create_competition_group(&NewCompetitionGroup {
            name: "Premier League".into(),
            country_code: None,
            competition_type: CompetitionType::League,
            tier: Some(1),
            is_active: true,
            logo_url: None,
        })
        .await
        .unwrap();
    let save = create_save(&app, "uid-1").await;
    let trophies_uri = format!("/api/saves/{}/trophies", save["id"].as_str().unwrap());

    let (status, trophy) = send(
        &app,
        "POST",
        &trophies_uri,
        Some("uid-1"),
        Some(json!({ "team_id": 33, "competition_group_id": group.id, "date_won": "2025-05-18" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(trophy["season"], "2024/2025");

    let missing = format!("{trophies_uri}/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "DELETE", &missing, Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let existing = format!("{trophies_uri}/{}", trophy["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &existing, Some("uid-1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn duplicate_seasons_conflict() {
    let (app, _) = app().await;
    let save = create_save(&app, "uid-1").await;
    let uri = format!("/api/saves/{}/seasons", save["id"].as_str().unwrap());
    let body = json!({ "date": "2024-10-01", "team_id": 33, "league_position": 2 });

    let (status, season) = send(&app, "POST", &uri, Some("uid-1"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(season["season"], "2024/2025");

    let (status, _) = send(&app, "POST", &uri, Some("uid-1"), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some("uid-1"),
        Some(json!({ "season": "2024/2026", "team_id": 33 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn competitions_are_filtered_and_grouped_by_country() {
    let (app, store) = app().await;
    store
        .upsert_country(&Country { code: "GB-ENG".into(), name: "England".into(), flag_url: None })
        .await
        .unwrap();
    for (name, kind, active) in [
        ("Premier League", CompetitionType::League, true),
        ("FA Cup", CompetitionType::Cup, true),
        ("Full Members Cup", CompetitionType::Cup, false),
    ] {
        store
            .create_competition_group(&NewCompetitionGroup {
                name: name.into(),
                country_code: Some("GB-ENG".into()),
                competition_type: kind,
                tier: None,
                is_active: active,
                logo_url: None,
            })
            .await
            .unwrap();
    }

    let (status, body) = send(&app, "GET", "/api/competitions?type=cup", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let buckets = body.as_array().unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0]["country_code"], "GB-ENG");
    assert_eq!(buckets[0]["groups"].as_array().unwrap().len(), 1);
    assert_eq!(buckets[0]["groups"][0]["name"], "FA Cup");

    let (_, body) = send(&app, "GET", "/api/competitions?include_inactive=true", None, None).await;
    let groups = body[0]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 3);
    // Leagues come before cups.
    assert_eq!(groups[0]["name"], "Premier League");
}

#[tokio::test]
async fn only_admins_manage_competitions() {
    let (app, _) = app().await;
    let body = json!({ "name": "Eredivisie", "competition_type": "league", "tier": 1 });

    let (status, _) = send(&app, "POST", "/api/competitions", Some("uid-1"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, group) = send(&app, "POST", "/api/competitions", Some("admin-1"), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["is_active"], true);

    let uri = format!("/api/competitions/{}", group["id"]);
    let (status, group) =
        send(&app, "PATCH", &uri, Some("admin-1"), Some(json!({ "is_active": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["is_active"], false);

    let (status, _) = send(&app, "PUT", &format!("{uri}/members/88"), Some("admin-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn challenge_completes_when_every_goal_is_done() {
    let (app, _) = app().await;
    let (status, challenge) = send(
        &app,
        "POST",
        "/api/challenges",
        Some("admin-1"),
        Some(json!({
            "name": "Double",
            "game_id": 2,
            "goals": [ { "description": "Win the league" }, { "description": "Win the cup" } ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let challenge_id = challenge["id"].as_str().unwrap();

    let save = create_save(&app, "uid-1").await;
    let base = format!("/api/saves/{}/challenges", save["id"].as_str().unwrap());
    let (status, progress) = send(
        &app,
        "POST",
        &base,
        Some("uid-1"),
        Some(json!({ "challenge_id": challenge_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(progress["status"], "in_progress");

    let (status, _) = send(&app, "POST", &base, Some("uid-1"), Some(json!({ "challenge_id": challenge_id }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut last = Value::Null;
    for goal in challenge["goals"].as_array().unwrap() {
        let uri = format!("{base}/{challenge_id}/goals/{}", goal["id"].as_str().unwrap());
        let (status, body) = send(&app, "PUT", &uri, Some("uid-1"), Some(json!({ "completed": true }))).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["status"], "completed");
    assert!(last["completed_at"].is_string());

    let bogus = format!("{base}/{challenge_id}/goals/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "PUT", &bogus, Some("uid-1"), Some(json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_falls_back_to_the_database() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/api/search/teams?q=manchester&limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0]["objectID"].is_string());
}
