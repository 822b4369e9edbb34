//! Resource sweeping
//!
//! One cleaner per resource type, a per-project orchestrator that
//! sequences them, and the driver that walks the project list.
//!
//! - [`instances`] - VM instances, deleted concurrently
//! - [`disks`] - unattached persistent disks, deleted one at a time
//! - [`addresses`] - unused regional and global static IPs
//! - [`buckets`] - buckets and their objects (behind a capability flag)
//! - [`service_accounts`] - automation-created service accounts
//! - [`project`] - the per-project orchestrator

pub mod addresses;
pub mod buckets;
pub mod disks;
pub mod instances;
pub mod project;
pub mod service_accounts;

#[cfg(test)]
pub(crate) mod fake;

use crate::config::RunConfig;
use crate::provider::{CloudProvider, DeleteError, DeleteResult};
pub use project::{clean_project, ProjectReport};

/// What a cleaner saw and did for one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Delete candidates after filtering
    pub found: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn found(found: usize) -> Self {
        Self {
            found,
            ..Self::default()
        }
    }

    fn record(&mut self, ok: bool) {
        if ok {
            self.deleted += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Log wording for one kind of delete
pub(crate) struct Wording {
    /// "✓ {done}: name"
    pub done: &'static str,
    /// "ERROR {submitting} name"
    pub submitting: &'static str,
    /// "ERROR {waiting} name"
    pub waiting: &'static str,
}

/// Log the outcome of one delete; returns true on success
pub(crate) fn log_outcome(wording: &Wording, name: &str, result: &DeleteResult) -> bool {
    match result {
        Ok(()) => {
            tracing::info!("  ✓ {}: {}", wording.done, name);
            true
        },
        Err(DeleteError::Submit(e)) => {
            tracing::error!("  ERROR {} {}: {:#}", wording.submitting, name, e);
            false
        },
        Err(DeleteError::Wait(e)) => {
            tracing::error!("  ERROR {} {}: {:#}", wording.waiting, name, e);
            false
        },
    }
}

/// Sweep every configured project, strictly one after the other
pub async fn run<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
) -> Vec<(String, ProjectReport)> {
    tracing::info!("Starting GCP cleanup (Dry Run: {})", config.dry_run);
    tracing::info!("Projects to clean: {:?}", config.projects);

    let mut reports = Vec::with_capacity(config.projects.len());
    for project in &config.projects {
        tracing::info!("========== Processing Project: {} ==========", project);
        let report = clean_project(provider, config, project).await;
        reports.push((project.clone(), report));
    }

    tracing::info!("========== Cleanup Complete ==========");
    reports
}
