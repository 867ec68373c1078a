use database::DbError;
use indicatif::ProgressStyle;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Outcome counts of one job for one entity kind.
///
/// `skipped` covers records that failed validation or were already present;
/// `failed` covers unexpected errors. Every skipped or failed record is logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub entity: String,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MigrationReport {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.migrated + self.skipped + self.failed
    }

    pub fn migrated(&mut self) {
        self.migrated += 1;
    }

    pub fn skip(&mut self, key: impl Display, reason: impl Display) {
        tracing::warn!(entity = %self.entity, %key, %reason, "Skipped record.");
        self.skipped += 1;
    }

    pub fn fail(&mut self, key: impl Display, error: impl Display) {
        tracing::error!(entity = %self.entity, %key, %error, "Failed to migrate record.");
        self.failed += 1;
    }

    /// Records the outcome of a write. Constraint violations are data
    /// problems, so they count as skipped rather than failed.
    pub fn record_write(&mut self, key: impl Display, result: Result<(), DbError>) {
        match result {
            Ok(()) => self.migrated(),
            Err(DbError::Conflict(c)) => self.skip(key, format!("already present ({c})")),
            Err(DbError::InvalidReference(c)) => self.skip(key, format!("unknown reference ({c})")),
            Err(e) => self.fail(key, e),
        }
    }
}

/// Keeps the first item for every key, preserving order. Returns the kept
/// items and how many duplicates were dropped.
pub fn dedupe_by<T, K, F>(items: Vec<T>, key: F) -> (Vec<T>, usize)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let before = items.len();
    let kept: Vec<T> = items.into_iter().filter(|item| seen.insert(key(item))).collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// A job's progress bar, drawn by the `tracing-indicatif` layer through a
/// span so log lines pause it instead of printing over it. Without that
/// layer installed every call is a no-op.
pub(crate) struct Progress {
    span: Span,
}

impl Progress {
    pub(crate) fn inc(&self, delta: u64) {
        self.span.pb_inc(delta);
    }

    pub(crate) fn set_message(&self, message: &str) {
        self.span.pb_set_message(message);
    }

    /// Closing the span removes the bar.
    pub(crate) fn finish_and_clear(self) {}
}

pub(crate) fn progress_bar(len: usize, label: &str) -> Result<Progress, indicatif::style::TemplateError> {
    let span = tracing::info_span!("job", entity = label, "indicatif.pb_show" = true);
    span.pb_set_style(
        &ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    span.pb_set_length(len as u64);
    span.pb_set_message(label);
    // The bar is shown on first entry and stays up until the span closes.
    span.in_scope(|| {});
    Ok(Progress { span })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_builds_without_a_layer() {
        let progress = progress_bar(3, "users").unwrap();
        progress.set_message("Fetching users...");
        progress.inc(3);
        progress.finish_and_clear();
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let (kept, dropped) = dedupe_by(items, |(k, _)| *k);
        assert_eq!(kept, vec![("a", 1), ("b", 2)]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn constraint_errors_count_as_skipped() {
        let mut report = MigrationReport::new("seasons");
        report.record_write("s1", Ok(()));
        report.record_write("s2", Err(DbError::Conflict("seasons_save_id_season_key".into())));
        report.record_write("s3", Err(DbError::InvalidReference("seasons_team_id_fkey".into())));
        report.record_write("s4", Err(DbError::Decode("bad".into())));
        assert_eq!((report.migrated, report.skipped, report.failed), (1, 2, 1));
        assert_eq!(report.total(), 4);
    }
}
