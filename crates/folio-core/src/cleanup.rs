//! Daily maintenance jobs: purging long-deleted posts and orphaned uploads.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::traits::{FileStorage, OrphanFileStore, PostPurgeStore};

/// Time of day (UTC) at which a cleanup runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    at: NaiveTime,
}

impl Schedule {
    pub fn daily(hour: u32, minute: u32) -> Result<Self, AppError> {
        let at = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            AppError::ConfigError(format!("Invalid schedule time {hour:02}:{minute:02}"))
        })?;
        Ok(Self { at })
    }

    /// Parse `HH:MM`.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let at = NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
            AppError::ConfigError(format!("Invalid schedule '{value}': expected HH:MM"))
        })?;
        Ok(Self { at })
    }

    /// First run instant strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub succeeded: u64,
    pub failed: u64,
}

/// A maintenance job that can be run on a schedule.
pub trait CleanupTask: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_once(&self) -> impl Future<Output = Result<CleanupReport, AppError>> + Send;
}

/// Retention periods and run times of the two cleanup jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupConfig {
    pub post_retention: TimeDelta,
    pub orphan_grace: TimeDelta,
    pub post_schedule: Schedule,
    pub file_schedule: Schedule,
}

impl CleanupConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FOLIO_POST_RETENTION_DAYS` (defaults to 7)
    /// - `FOLIO_ORPHAN_FILE_HOURS` (defaults to 24)
    /// - `FOLIO_POST_CLEANUP_AT` (UTC `HH:MM`, defaults to `00:00`)
    /// - `FOLIO_FILE_CLEANUP_AT` (UTC `HH:MM`, defaults to `03:00`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let days = parse_count(get("FOLIO_POST_RETENTION_DAYS"), "FOLIO_POST_RETENTION_DAYS", 7)?;
        let hours = parse_count(get("FOLIO_ORPHAN_FILE_HOURS"), "FOLIO_ORPHAN_FILE_HOURS", 24)?;
        let post_schedule =
            Schedule::parse(get("FOLIO_POST_CLEANUP_AT").as_deref().unwrap_or("00:00"))?;
        let file_schedule =
            Schedule::parse(get("FOLIO_FILE_CLEANUP_AT").as_deref().unwrap_or("03:00"))?;

        Ok(Self {
            post_retention: TimeDelta::days(days.into()),
            orphan_grace: TimeDelta::hours(hours.into()),
            post_schedule,
            file_schedule,
        })
    }
}

fn parse_count(raw: Option<String>, name: &str, default: u32) -> Result<u32, AppError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {name} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}

// ---------------------------------------------------------------------------
// Post purge
// ---------------------------------------------------------------------------

/// Permanently removes posts that stayed soft-deleted past the retention period.
#[derive(Clone)]
pub struct PostCleanup<S: PostPurgeStore> {
    store: S,
    retention: TimeDelta,
}

impl<S: PostPurgeStore> PostCleanup<S> {
    pub fn new(store: S, retention: TimeDelta) -> Self {
        Self { store, retention }
    }
}

impl<S: PostPurgeStore> CleanupTask for PostCleanup<S> {
    fn name(&self) -> &'static str {
        "post-purge"
    }

    async fn run_once(&self) -> Result<CleanupReport, AppError> {
        let cutoff = Utc::now() - self.retention;
        let ids = self.store.expired_deleted(cutoff).await?;

        let mut report = CleanupReport::default();
        for id in ids {
            match self.store.purge(id).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(post_id = id, error = %e, "Failed to purge post");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Orphan file cleanup
// ---------------------------------------------------------------------------

/// Deletes uploads that no post or user references after a grace period.
#[derive(Clone)]
pub struct OrphanFileCleanup<S: OrphanFileStore, F: FileStorage> {
    store: S,
    storage: F,
    grace: TimeDelta,
}

impl<S: OrphanFileStore, F: FileStorage> OrphanFileCleanup<S, F> {
    pub fn new(store: S, storage: F, grace: TimeDelta) -> Self {
        Self {
            store,
            storage,
            grace,
        }
    }
}

impl<S: OrphanFileStore, F: FileStorage> CleanupTask for OrphanFileCleanup<S, F> {
    fn name(&self) -> &'static str {
        "orphan-files"
    }

    async fn run_once(&self) -> Result<CleanupReport, AppError> {
        let cutoff = Utc::now() - self.grace;
        let orphans = self.store.orphans_before(cutoff).await?;

        let mut report = CleanupReport::default();
        for file in orphans {
            // The record goes only once its object is gone.
            let result = match self.storage.delete(&file.storage_key).await {
                Ok(()) => self.store.delete_record(file.id).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(
                        file_id = file.id,
                        key = %file.storage_key,
                        error = %e,
                        "Failed to delete orphan file"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Events emitted by the scheduler for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CleanupEvent<'a> {
    Scheduled {
        task: &'a str,
        next_run: DateTime<Utc>,
    },
    Started {
        task: &'a str,
    },
    Completed {
        task: &'a str,
        report: CleanupReport,
    },
    Failed {
        task: &'a str,
        error: &'a str,
    },
    Stopped {
        task: &'a str,
    },
}

pub trait CleanupReporter: Send + Sync {
    fn report(&self, event: CleanupEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCleanupReporter;

impl CleanupReporter for TracingCleanupReporter {
    fn report(&self, event: CleanupEvent<'_>) {
        match event {
            CleanupEvent::Scheduled { task, next_run } => {
                tracing::debug!(%task, %next_run, "Cleanup scheduled");
            }
            CleanupEvent::Started { task } => {
                tracing::info!(%task, "Cleanup started");
            }
            CleanupEvent::Completed { task, report } => {
                tracing::info!(
                    %task,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "Cleanup completed"
                );
            }
            CleanupEvent::Failed { task, error } => {
                tracing::error!(%task, %error, "Cleanup failed");
            }
            CleanupEvent::Stopped { task } => {
                tracing::info!(%task, "Cleanup scheduler stopped");
            }
        }
    }
}

/// Runs a [`CleanupTask`] once a day until cancelled.
pub struct CleanupScheduler<T: CleanupTask> {
    task: T,
    schedule: Schedule,
}

impl<T: CleanupTask> CleanupScheduler<T> {
    pub fn new(task: T, schedule: Schedule) -> Self {
        Self { task, schedule }
    }

    pub async fn run<R: CleanupReporter>(&self, cancel_token: CancellationToken, reporter: &R) {
        let name = self.task.name();

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let now = Utc::now();
            let next_run = self.schedule.next_after(now);
            reporter.report(CleanupEvent::Scheduled {
                task: name,
                next_run,
            });

            let wait = (next_run - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = cancel_token.cancelled() => break,
            }

            // Errors are reported, never fatal to the loop.
            let _ = self.run_pass(reporter).await;
        }

        reporter.report(CleanupEvent::Stopped { task: name });
    }

    /// Run the task once right now.
    pub async fn run_pass<R: CleanupReporter>(
        &self,
        reporter: &R,
    ) -> Result<CleanupReport, AppError> {
        let name = self.task.name();
        reporter.report(CleanupEvent::Started { task: name });

        match self.task.run_once().await {
            Ok(report) => {
                reporter.report(CleanupEvent::Completed { task: name, report });
                Ok(report)
            }
            Err(e) => {
                let error = e.to_string();
                reporter.report(CleanupEvent::Failed {
                    task: name,
                    error: &error,
                });
                Err(e)
            }
        }
    }
}
