//! VM instance cleaner

use super::{log_outcome, CleanupReport, Wording};
use crate::config::RunConfig;
use crate::provider::CloudProvider;
use anyhow::{Context, Result};
use futures::future::join_all;

const WORDING: Wording = Wording {
    done: "Deleted VM instance",
    submitting: "deleting instance",
    waiting: "waiting for deletion of",
};

/// Delete every VM instance in the project, all at once
pub async fn clean_instances<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> Result<CleanupReport> {
    tracing::info!("[{}] Checking VM instances...", project);

    let listed = provider
        .list_instances(project)
        .await
        .context("error listing instances")?;

    let mut instances = Vec::new();
    for instance in listed {
        let zone = instance.zone_name();
        if !config.zone_allowed(&zone) {
            tracing::debug!("  Skipping VM instance {} (zone {} not selected)", instance.name, zone);
            continue;
        }
        tracing::info!(
            "  Found VM Instance: {} (zone: {}, status: {})",
            instance.name,
            zone,
            instance.status
        );
        instances.push((instance.name, zone));
    }

    if instances.is_empty() {
        tracing::info!("[{}] No VM instances found", project);
        return Ok(CleanupReport::default());
    }

    let mut report = CleanupReport::found(instances.len());

    if config.dry_run {
        tracing::info!("[{}] Would delete {} VM instances", project, instances.len());
        return Ok(report);
    }

    tracing::info!(
        "[{}] Deleting {} VM instances in parallel...",
        project,
        instances.len()
    );

    let outcomes = join_all(instances.iter().map(|(name, zone)| async move {
        let result = provider.delete_instance(project, zone, name).await;
        log_outcome(&WORDING, name, &result)
    }))
    .await;

    for ok in outcomes {
        report.record(ok);
    }

    tracing::info!("[{}] All VM deletions complete", project);
    Ok(report)
}
