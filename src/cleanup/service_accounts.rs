//! Service account cleaner

use super::{log_outcome, CleanupReport, Wording};
use crate::config::RunConfig;
use crate::provider::CloudProvider;
use anyhow::{Context, Result};
use futures::future::join_all;

const WORDING: Wording = Wording {
    done: "Deleted service account",
    submitting: "deleting service account",
    waiting: "waiting for deletion of service account",
};

/// Delete service accounts whose email starts with the configured prefix
pub async fn clean_service_accounts<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> Result<CleanupReport> {
    tracing::info!("[{}] Checking service accounts...", project);

    let prefix = config.service_account_prefix.as_str();
    let accounts: Vec<_> = provider
        .list_service_accounts(project)
        .await
        .context("failed to list service accounts")?
        .into_iter()
        .filter(|sa| sa.matches_prefix(prefix))
        .collect();

    for sa in &accounts {
        tracing::info!("  Found Service Account: {} ({})", sa.email, sa.display_name);
    }

    if accounts.is_empty() {
        tracing::info!(
            "[{}] No service accounts found with prefix '{}'",
            project,
            prefix
        );
        return Ok(CleanupReport::default());
    }

    let mut report = CleanupReport::found(accounts.len());

    if config.dry_run {
        tracing::info!("[{}] Would delete {} service accounts", project, accounts.len());
        return Ok(report);
    }

    tracing::info!(
        "[{}] Deleting {} service accounts in parallel...",
        project,
        accounts.len()
    );

    let outcomes = join_all(accounts.iter().map(|sa| async move {
        let result = provider.delete_service_account(sa).await;
        log_outcome(&WORDING, &sa.email, &result)
    }))
    .await;

    for ok in outcomes {
        report.record(ok);
    }

    tracing::info!("[{}] All service account deletions complete", project);
    Ok(report)
}
