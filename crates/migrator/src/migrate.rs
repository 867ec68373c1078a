//! One-off migration from the legacy document store.
//!
//! Each job reads a whole collection, drops duplicate documents, validates,
//! checks whether the target row already exists and then writes. Records are
//! handled one at a time and nothing is rolled back; the returned reports
//! say what happened.

use crate::error::MigrationError;
use crate::report::{MigrationReport, dedupe_by, progress_bar};
use crate::source::{ChallengeDoc, SaveDoc, SeasonDoc, StintDoc, TrophyDoc, UserDoc, legacy_id};
use chrono::Utc;
use core_types::requests::{NewChallenge, NewChallengeGoal, NewSeason, NewStint, NewTrophy};
use core_types::{Challenge, ChallengeGoal, Save, User, UserRole};
use database::Store;
use firestore::{Document, DocumentSource};
use uuid::Uuid;

async fn read_collection(
    source: &dyn DocumentSource,
    collection: &str,
) -> Result<Vec<Document>, MigrationError> {
    let documents = source.list_documents(collection).await?;
    let (documents, dropped) = dedupe_by(documents, |d| d.id.clone());
    if dropped > 0 {
        tracing::warn!(collection, dropped, "Dropped duplicate documents.");
    }
    Ok(documents)
}

pub async fn migrate_users(
    source: &dyn DocumentSource,
    store: &dyn Store,
    dry_run: bool,
) -> Result<MigrationReport, MigrationError> {
    let documents = read_collection(source, "users").await?;
    let mut report = MigrationReport::new("users");
    let progress = progress_bar(documents.len(), "users")?;

    for document in &documents {
        progress.inc(1);
        let doc: UserDoc = match document.parse() {
            Ok(doc) => doc,
            Err(e) => {
                report.skip(&document.id, e);
                continue;
            }
        };
        if store.get_user(&document.id).await?.is_some() {
            report.skip(&document.id, "already present");
            continue;
        }
        if dry_run {
            report.migrated();
            continue;
        }

        let user = User {
            id: document.id.clone(),
            email: doc.email,
            display_name: doc.display_name,
            role: if doc.is_admin { UserRole::Admin } else { UserRole::User },
            created_at: doc.created_at.unwrap_or_else(Utc::now),
        };
        match store.upsert_user(&user).await {
            Ok(_) => report.migrated(),
            Err(e) => report.fail(&document.id, e),
        }
    }

    progress.finish_and_clear();
    Ok(report)
}

/// Reports of a save migration: the saves themselves plus their embedded
/// career history, trophies and seasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveMigration {
    pub saves: MigrationReport,
    pub stints: MigrationReport,
    pub trophies: MigrationReport,
    pub seasons: MigrationReport,
}

impl SaveMigration {
    pub fn into_reports(self) -> Vec<MigrationReport> {
        vec![self.saves, self.stints, self.trophies, self.seasons]
    }

    fn skip_children(&mut self, key: &str, doc: &SaveDoc) {
        let reason = "parent save was skipped";
        for i in 0..doc.career_history.len() {
            self.stints.skip(format!("{key}/careerHistory/{i}"), reason);
        }
        for i in 0..doc.trophies.len() {
            self.trophies.skip(format!("{key}/trophies/{i}"), reason);
        }
        for i in 0..doc.seasons.len() {
            self.seasons.skip(format!("{key}/seasons/{i}"), reason);
        }
    }
}

pub async fn migrate_saves(
    source: &dyn DocumentSource,
    store: &dyn Store,
    dry_run: bool,
) -> Result<SaveMigration, MigrationError> {
    let documents = read_collection(source, "saves").await?;
    let mut result = SaveMigration {
        saves: MigrationReport::new("saves"),
        stints: MigrationReport::new("career stints"),
        trophies: MigrationReport::new("trophies"),
        seasons: MigrationReport::new("seasons"),
    };
    let progress = progress_bar(documents.len(), "saves")?;

    for document in &documents {
        progress.inc(1);
        let key = format!("saves/{}", document.id);
        let doc: SaveDoc = match document.parse() {
            Ok(doc) => doc,
            Err(e) => {
                result.saves.skip(&key, e);
                continue;
            }
        };

        let save_id = legacy_id(&key);
        match prepare_save(store, save_id, &doc).await? {
            Err(reason) => {
                result.saves.skip(&key, reason);
                result.skip_children(&key, &doc);
                continue;
            }
            Ok(None) => result.saves.skip(&key, "already present"),
            Ok(Some(_)) if dry_run => result.saves.migrated(),
            Ok(Some(save)) => {
                let outcome = store.create_save(&save).await;
                let written = outcome.is_ok();
                result.saves.record_write(&key, outcome);
                if !written {
                    result.skip_children(&key, &doc);
                    continue;
                }
            }
        }

        for (i, stint) in doc.career_history.iter().enumerate() {
            let path = format!("{key}/careerHistory/{i}");
            migrate_stint(store, &mut result.stints, save_id, &path, stint, dry_run).await?;
        }
        for (i, trophy) in doc.trophies.iter().enumerate() {
            let path = format!("{key}/trophies/{i}");
            migrate_trophy(store, &mut result.trophies, save_id, &path, trophy, dry_run).await?;
        }
        for (i, season) in doc.seasons.iter().enumerate() {
            let path = format!("{key}/seasons/{i}");
            migrate_season(store, &mut result.seasons, save_id, &path, season, dry_run).await?;
        }
    }

    progress.finish_and_clear();
    Ok(result)
}

/// `Ok(Err(reason))` when the document is invalid, `Ok(None)` when the save
/// already exists.
async fn prepare_save(
    store: &dyn Store,
    save_id: Uuid,
    doc: &SaveDoc,
) -> Result<Result<Option<Save>, String>, MigrationError> {
    if doc.name.trim().is_empty() {
        return Ok(Err("name is blank".to_string()));
    }
    if store.get_user(&doc.user_id).await?.is_none() {
        return Ok(Err(format!("unknown user {}", doc.user_id)));
    }
    let Some(game) = store.find_game_by_name(&doc.game).await? else {
        return Ok(Err(format!("unknown game {}", doc.game)));
    };
    if store.get_save(save_id).await?.is_some() {
        return Ok(Ok(None));
    }

    let created_at = doc.created_at.unwrap_or_else(Utc::now);
    Ok(Ok(Some(Save {
        id: save_id,
        user_id: doc.user_id.clone(),
        game_id: game.id,
        name: doc.name.trim().to_string(),
        current_team_id: doc.current_club_id,
        current_nation_id: doc.current_nation_id,
        created_at,
        updated_at: doc.updated_at.unwrap_or(created_at),
    })))
}

async fn migrate_stint(
    store: &dyn Store,
    report: &mut MigrationReport,
    save_id: Uuid,
    path: &str,
    doc: &StintDoc,
    dry_run: bool,
) -> Result<(), MigrationError> {
    let request = NewStint {
        team_id: doc.team_id,
        start_date: doc.start_date.0,
        end_date: doc.end_date.map(|d| d.0),
        is_national: doc.is_national,
    };
    if let Err(e) = request.validate() {
        report.skip(path, e);
        return Ok(());
    }
    let id = legacy_id(path);
    if store.get_stint(id).await?.is_some() {
        report.skip(path, "already present");
        return Ok(());
    }
    if dry_run {
        report.migrated();
        return Ok(());
    }

    let mut stint = request.into_stint(save_id);
    stint.id = id;
    report.record_write(path, store.create_stint(&stint).await);
    Ok(())
}

async fn migrate_trophy(
    store: &dyn Store,
    report: &mut MigrationReport,
    save_id: Uuid,
    path: &str,
    doc: &TrophyDoc,
    dry_run: bool,
) -> Result<(), MigrationError> {
    // Trophies reference the normalized group, not the raw competition.
    let group_id = match store.get_competition(doc.competition_id).await? {
        Some(competition) => competition.group_id,
        None => None,
    };
    let Some(competition_group_id) = group_id else {
        report.skip(path, format!("competition {} is not grouped", doc.competition_id));
        return Ok(());
    };

    let request = NewTrophy {
        team_id: doc.team_id,
        competition_group_id,
        date_won: doc.date_won.0,
        season: doc.season.clone(),
    };
    if let Err(e) = request.validate() {
        report.skip(path, e);
        return Ok(());
    }
    let id = legacy_id(path);
    if store.get_trophy(id).await?.is_some() {
        report.skip(path, "already present");
        return Ok(());
    }
    if dry_run {
        report.migrated();
        return Ok(());
    }

    let mut trophy = request.into_trophy(save_id, Utc::now());
    trophy.id = id;
    report.record_write(path, store.create_trophy(&trophy).await);
    Ok(())
}

async fn migrate_season(
    store: &dyn Store,
    report: &mut MigrationReport,
    save_id: Uuid,
    path: &str,
    doc: &SeasonDoc,
    dry_run: bool,
) -> Result<(), MigrationError> {
    let request = NewSeason {
        season: Some(doc.season.clone()),
        date: None,
        team_id: doc.team_id,
        league_position: doc.league_position,
        notes: doc.notes.clone(),
    };
    let mut season = match request.into_season(save_id, Utc::now()) {
        Ok(season) => season,
        Err(e) => {
            report.skip(path, e);
            return Ok(());
        }
    };
    season.id = legacy_id(path);
    if store.get_season(season.id).await?.is_some() {
        report.skip(path, "already present");
        return Ok(());
    }
    if dry_run {
        report.migrated();
        return Ok(());
    }
    report.record_write(path, store.create_season(&season).await);
    Ok(())
}

pub async fn migrate_challenges(
    source: &dyn DocumentSource,
    store: &dyn Store,
    dry_run: bool,
) -> Result<MigrationReport, MigrationError> {
    let documents = read_collection(source, "challenges").await?;
    let mut report = MigrationReport::new("challenges");
    let progress = progress_bar(documents.len(), "challenges")?;

    for document in &documents {
        progress.inc(1);
        let key = format!("challenges/{}", document.id);
        let doc: ChallengeDoc = match document.parse() {
            Ok(doc) => doc,
            Err(e) => {
                report.skip(&key, e);
                continue;
            }
        };

        let game_id = match &doc.game {
            Some(name) => match store.find_game_by_name(name).await? {
                Some(game) => Some(game.id),
                None => {
                    report.skip(&key, format!("unknown game {name}"));
                    continue;
                }
            },
            None => None,
        };

        let mut goals = Vec::with_capacity(doc.goals.len());
        for goal in &doc.goals {
            // Goals survive without their competition link when it cannot be resolved.
            let competition_group_id = match goal.competition_id {
                Some(id) => store.get_competition(id).await?.and_then(|c| c.group_id),
                None => None,
            };
            goals.push(NewChallengeGoal {
                description: goal.description.clone(),
                competition_group_id,
            });
        }
        let request = NewChallenge {
            name: doc.name.clone(),
            description: doc.description.clone(),
            game_id,
            goals,
        };
        if let Err(e) = request.validate() {
            report.skip(&key, e);
            continue;
        }

        let id = legacy_id(&key);
        if store.get_challenge(id).await?.is_some() {
            report.skip(&key, "already present");
            continue;
        }
        if dry_run {
            report.migrated();
            continue;
        }

        let challenge = Challenge {
            id,
            name: request.name.trim().to_string(),
            description: request.description,
            game_id,
            goals: request
                .goals
                .into_iter()
                .enumerate()
                .map(|(i, g)| ChallengeGoal {
                    id: legacy_id(&format!("{key}/goals/{i}")),
                    description: g.description,
                    competition_group_id: g.competition_group_id,
                })
                .collect(),
            created_at: doc.created_at.unwrap_or_else(Utc::now),
        };
        report.record_write(&key, store.create_challenge(&challenge).await);
    }

    progress.finish_and_clear();
    Ok(report)
}
