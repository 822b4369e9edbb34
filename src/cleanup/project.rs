//! Per-project orchestrator
//!
//! VM instances go first and must finish before anything else starts, so a
//! disk or address is never judged free while its VM is still being torn
//! down. Disks, addresses and service accounts then run side by side.

use super::addresses::release_addresses;
use super::buckets::clean_buckets;
use super::disks::clean_disks;
use super::instances::clean_instances;
use super::service_accounts::clean_service_accounts;
use super::CleanupReport;
use crate::config::RunConfig;
use crate::gcp::http::format_gcp_error;
use crate::provider::CloudProvider;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    VmsCompleting,
    OthersRunning,
    Done,
}

/// Outcome per resource type; `None` when listing failed or the cleaner did not run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectReport {
    pub instances: Option<CleanupReport>,
    pub disks: Option<CleanupReport>,
    pub addresses: Option<CleanupReport>,
    pub service_accounts: Option<CleanupReport>,
    pub buckets: Option<CleanupReport>,
}

fn enter(project: &str, phase: Phase) {
    tracing::debug!("[{}] phase: {:?}", project, phase);
}

/// Log an enumeration failure; it ends only this resource type
fn settle(project: &str, action: &str, result: Result<CleanupReport>) -> Option<CleanupReport> {
    match result {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(
                "Error {} in {}: {:#} ({})",
                action,
                project,
                e,
                format_gcp_error(&e)
            );
            None
        },
    }
}

/// Sweep one project
pub async fn clean_project<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> ProjectReport {
    enter(project, Phase::NotStarted);
    let mut report = ProjectReport::default();

    enter(project, Phase::VmsCompleting);
    report.instances = settle(
        project,
        "deleting VM instances",
        clean_instances(provider, config, project).await,
    );

    enter(project, Phase::OthersRunning);
    let (disks, addresses, service_accounts) = tokio::join!(
        clean_disks(provider, config, project),
        release_addresses(provider, config, project),
        clean_service_accounts(provider, config, project),
    );
    report.disks = settle(project, "deleting disks", disks);
    report.addresses = settle(project, "releasing static IPs", addresses);
    report.service_accounts = settle(project, "deleting service accounts", service_accounts);

    if config.allow_bucket_deletion {
        report.buckets = settle(
            project,
            "deleting buckets",
            clean_buckets(provider, config, project).await,
        );
    } else {
        tracing::warn!(
            "[{}] Note: Storage buckets must be deleted manually via GCP Console",
            project
        );
    }

    enter(project, Phase::Done);
    report
}
