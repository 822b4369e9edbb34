//! Bucket cleaner
//!
//! Only runs when bucket deletion is explicitly allowed; otherwise the
//! orchestrator just tells the operator to delete buckets by hand.

use super::{log_outcome, CleanupReport, Wording};
use crate::config::RunConfig;
use crate::provider::{CloudProvider, DeleteError};
use anyhow::{Context, Result};

const WORDING: Wording = Wording {
    done: "Deleted bucket",
    submitting: "deleting bucket",
    waiting: "waiting for deletion of bucket",
};

/// Empty and delete every bucket in the project
pub async fn clean_buckets<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> Result<CleanupReport> {
    tracing::info!("[{}] Checking storage buckets...", project);

    let buckets = provider
        .list_buckets(project)
        .await
        .context("error listing buckets")?;

    for bucket in &buckets {
        tracing::info!(
            "  Found Bucket: {} (location: {}, storage class: {})",
            bucket.name,
            bucket.location,
            bucket.storage_class
        );
    }

    if buckets.is_empty() {
        tracing::info!("[{}] No buckets found", project);
        return Ok(CleanupReport::default());
    }

    let mut report = CleanupReport::found(buckets.len());

    if config.dry_run {
        tracing::info!("[{}] Would delete {} buckets", project, buckets.len());
        return Ok(report);
    }

    for bucket in &buckets {
        empty_bucket(provider, &bucket.name).await;
        let result = provider.delete_bucket(&bucket.name).await;
        report.record(log_outcome(&WORDING, &bucket.name, &result));
    }

    Ok(report)
}

/// Delete every object in a bucket, one listing page at a time; returns
/// how many were deleted.
///
/// A listing failure ends this bucket's emptying only. Objects from pages
/// already listed have been deleted by then.
pub async fn empty_bucket<P: CloudProvider + ?Sized>(provider: &P, bucket: &str) -> usize {
    tracing::info!("  Deleting objects in bucket {}...", bucket);

    let mut deleted = 0;
    let mut page_token: Option<String> = None;

    loop {
        let page = match provider.list_objects(bucket, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("  ERROR listing objects in bucket {}: {:#}", bucket, e);
                break;
            },
        };

        for object in &page.objects {
            match provider.delete_object(bucket, &object.name).await {
                Ok(()) => deleted += 1,
                Err(DeleteError::Submit(e)) | Err(DeleteError::Wait(e)) => {
                    tracing::error!("  ERROR deleting object {}: {:#}", object.name, e);
                },
            }
        }

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    if deleted > 0 {
        tracing::info!("  Deleted {} objects from bucket {}", deleted, bucket);
    }
    deleted
}
