//! Static IP cleaner (regional and global addresses)

use super::{log_outcome, CleanupReport, Wording};
use crate::config::RunConfig;
use crate::model::AddressScope;
use crate::provider::CloudProvider;
use anyhow::{Context, Result};

const WORDING: Wording = Wording {
    done: "Released static IP",
    submitting: "releasing address",
    waiting: "waiting for release of",
};

const GLOBAL_WORDING: Wording = Wording {
    done: "Released global static IP",
    submitting: "releasing global address",
    waiting: "waiting for release of",
};

/// Release every address that is not IN_USE, regional then global
pub async fn release_addresses<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> Result<CleanupReport> {
    tracing::info!("[{}] Checking static IP addresses...", project);

    let regional = provider
        .list_regional_addresses(project)
        .await
        .context("error listing addresses")?;

    let mut candidates: Vec<(String, AddressScope)> = Vec::new();

    for address in regional {
        // Global entries are picked up by the global listing below
        let AddressScope::Regional(region) = address.scope() else {
            continue;
        };
        if !config.region_allowed(&region) {
            tracing::debug!("  Skipping address {} (region {} not selected)", address.name, region);
            continue;
        }
        if address.is_in_use() {
            tracing::info!("  Skipping address {} (in use)", address.name);
            continue;
        }
        tracing::info!(
            "  Found Static IP: {} (region: {}, address: {}, status: {})",
            address.name,
            region,
            address.address,
            address.status
        );
        candidates.push((address.name, AddressScope::Regional(region)));
    }

    match provider.list_global_addresses(project).await {
        Ok(global) => {
            for address in global {
                if address.is_in_use() {
                    tracing::info!("  Skipping global address {} (in use)", address.name);
                    continue;
                }
                tracing::info!(
                    "  Found Global Static IP: {} (address: {}, status: {})",
                    address.name,
                    address.address,
                    address.status
                );
                candidates.push((address.name, AddressScope::Global));
            }
        },
        Err(e) => {
            tracing::error!("[{}] Error listing global addresses: {:#}", project, e);
        },
    }

    if candidates.is_empty() {
        tracing::info!("[{}] No unused static IPs found", project);
        return Ok(CleanupReport::default());
    }

    let mut report = CleanupReport::found(candidates.len());

    if config.dry_run {
        tracing::info!("[{}] Would release {} static IPs", project, candidates.len());
        return Ok(report);
    }

    for (name, scope) in &candidates {
        let ok = match scope {
            AddressScope::Regional(region) => {
                let result = provider.delete_regional_address(project, region, name).await;
                log_outcome(&WORDING, name, &result)
            },
            AddressScope::Global => {
                let result = provider.delete_global_address(project, name).await;
                log_outcome(&GLOBAL_WORDING, name, &result)
            },
        };
        report.record(ok);
    }

    Ok(report)
}
