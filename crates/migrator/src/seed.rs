//! Pushes teams and competition groups to the hosted search index.

use crate::error::MigrationError;
use crate::report::{MigrationReport, progress_bar};
use core_types::CompetitionGroupFilter;
use database::Store;
use search::{CompetitionRecord, SearchBackend, TeamRecord, to_objects};
use serde::Serialize;

async fn push_batches<T: Serialize>(
    backend: &dyn SearchBackend,
    index: &str,
    records: &[T],
    batch_size: usize,
    report: &mut MigrationReport,
) -> Result<(), MigrationError> {
    let batch_size = batch_size.max(1);
    let progress = progress_bar(records.len(), index)?;

    for (n, batch) in records.chunks(batch_size).enumerate() {
        let objects = to_objects(batch)?;
        match backend.save_objects(index, &objects).await {
            Ok(()) => report.migrated += batch.len(),
            Err(e) => {
                tracing::error!(index, batch = n, error = %e, "Failed to index batch.");
                report.failed += batch.len();
            }
        }
        progress.inc(batch.len() as u64);
    }

    progress.finish_and_clear();
    Ok(())
}

pub async fn seed_teams(
    backend: &dyn SearchBackend,
    store: &dyn Store,
    index: &str,
    batch_size: usize,
) -> Result<MigrationReport, MigrationError> {
    let records: Vec<TeamRecord> = store.list_teams().await?.iter().map(TeamRecord::from).collect();
    let mut report = MigrationReport::new("team index");
    push_batches(backend, index, &records, batch_size, &mut report).await?;
    Ok(report)
}

/// Only active groups are searchable.
pub async fn seed_competitions(
    backend: &dyn SearchBackend,
    store: &dyn Store,
    index: &str,
    batch_size: usize,
) -> Result<MigrationReport, MigrationError> {
    let records: Vec<CompetitionRecord> = store
        .list_competition_groups(&CompetitionGroupFilter::default())
        .await?
        .iter()
        .map(CompetitionRecord::from)
        .collect();
    let mut report = MigrationReport::new("competition index");
    push_batches(backend, index, &records, batch_size, &mut report).await?;
    Ok(report)
}
