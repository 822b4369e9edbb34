//! Unattached disk cleaner

use super::{log_outcome, CleanupReport, Wording};
use crate::config::RunConfig;
use crate::provider::CloudProvider;
use anyhow::{Context, Result};

const WORDING: Wording = Wording {
    done: "Deleted disk",
    submitting: "deleting disk",
    waiting: "waiting for deletion of",
};

/// Delete disks with no attachments, one at a time
pub async fn clean_disks<P: CloudProvider + ?Sized>(
    provider: &P,
    config: &RunConfig,
    project: &str,
) -> Result<CleanupReport> {
    tracing::info!("[{}] Checking disks...", project);

    let listed = provider
        .list_disks(project)
        .await
        .context("error listing disks")?;

    let mut candidates = Vec::new();
    for disk in listed {
        let location = disk.location();
        if !config.location_allowed(&location) {
            tracing::debug!("  Skipping disk {} ({} not selected)", disk.name, location);
            continue;
        }
        if disk.is_attached() {
            tracing::info!("  Skipping disk {} (attached to instances)", disk.name);
            continue;
        }
        tracing::info!(
            "  Found Disk: {} ({}, size: {} GB)",
            disk.name,
            location,
            disk.size_display()
        );
        candidates.push((disk.name, location));
    }

    if candidates.is_empty() {
        tracing::info!("[{}] No unattached disks found", project);
        return Ok(CleanupReport::default());
    }

    let mut report = CleanupReport::found(candidates.len());

    if config.dry_run {
        tracing::info!("[{}] Would delete {} disks", project, candidates.len());
        return Ok(report);
    }

    for (name, location) in &candidates {
        let result = provider.delete_disk(project, location, name).await;
        report.record(log_outcome(&WORDING, name, &result));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::fake::{disk, FakeProvider, Kind, Stage};
    use crate::model::Disk;

    fn live_config() -> RunConfig {
        let mut config = RunConfig::new(vec!["proj".to_string()]);
        config.dry_run = false;
        config
    }

    #[tokio::test]
    async fn test_attached_disks_are_skipped() {
        let fake = FakeProvider::scenario();

        let report = clean_disks(&fake, &live_config(), "proj").await.unwrap();
        assert_eq!(report.found, 1);
        assert_eq!(fake.submitted(Kind::Disk), vec!["orphan-disk"]);
    }

    #[tokio::test]
    async fn test_dry_run() {
        let fake = FakeProvider::scenario();
        let config = RunConfig::new(vec!["proj".to_string()]);

        let report = clean_disks(&fake, &config, "proj").await.unwrap();
        assert_eq!(report, CleanupReport::found(1));
        assert_eq!(fake.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_deletes_sequentially() {
        let mut fake = FakeProvider::default();
        fake.disks = vec![
            disk("d1", "us-central1-a", &[]),
            disk("d2", "us-central1-a", &[]),
            disk("d3", "us-central1-b", &[]),
        ];

        let report = clean_disks(&fake, &live_config(), "proj").await.unwrap();
        assert_eq!(report.deleted, 3);

        // Each delete completes before the next is submitted
        let stages: Vec<Stage> = fake.events().iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Submitted,
                Stage::Completed,
                Stage::Submitted,
                Stage::Completed,
                Stage::Submitted,
                Stage::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_disk_is_skipped() {
        let mut fake = FakeProvider::default();
        fake.disks = vec![disk("d1", "us-central1-a", &[]), disk("d2", "us-central1-a", &[])];
        fake.fail_wait.insert("d1".to_string());

        let report = clean_disks(&fake, &live_config(), "proj").await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.deleted, 1);
    }

    #[tokio::test]
    async fn test_second_delete_of_absent_disk_fails_cleanly() {
        let fake = FakeProvider::scenario();
        let config = live_config();

        let first = clean_disks(&fake, &config, "proj").await.unwrap();
        assert_eq!(first.deleted, 1);

        // Listing is stale: the disk is offered again and the delete fails
        let second = clean_disks(&fake, &config, "proj").await.unwrap();
        assert_eq!(second.deleted, 0);
        assert_eq!(second.failed, 1);
    }

    #[tokio::test]
    async fn test_regional_disk_uses_region_filter() {
        let mut fake = FakeProvider::default();
        fake.disks = vec![Disk {
            name: "replicated".to_string(),
            zone: None,
            region: Some("https://www.googleapis.com/compute/v1/projects/p/regions/us-east1".to_string()),
            size_gb: Some("200".to_string()),
            users: Vec::new(),
        }];
        let mut config = live_config();
        config.regions = vec!["europe-west1".to_string()];

        let report = clean_disks(&fake, &config, "proj").await.unwrap();
        assert_eq!(report, CleanupReport::default());

        config.regions = vec!["us-east1".to_string()];
        let report = clean_disks(&fake, &config, "proj").await.unwrap();
        assert_eq!(report.deleted, 1);
    }

    mod attachment_property {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever mix of disks is listed, only the unattached ones are deleted
            #[test]
            fn attached_disks_are_never_deleted(
                user_counts in prop::collection::vec(0usize..4, 0..12),
            ) {
                let mut fake = FakeProvider::default();
                fake.disks = user_counts
                    .iter()
                    .enumerate()
                    .map(|(i, users)| {
                        let users: Vec<String> =
                            (0..*users).map(|u| format!("instances/vm-{}", u)).collect();
                        let users: Vec<&str> = users.iter().map(String::as_str).collect();
                        disk(&format!("disk-{}", i), "us-central1-a", &users)
                    })
                    .collect();

                let report = tokio_test::block_on(clean_disks(&fake, &live_config(), "proj")).unwrap();

                let expected: Vec<String> = user_counts
                    .iter()
                    .enumerate()
                    .filter(|(_, users)| **users == 0)
                    .map(|(i, _)| format!("disk-{}", i))
                    .collect();
                prop_assert_eq!(report.deleted, expected.len());
                prop_assert_eq!(fake.submitted(Kind::Disk), expected);
            }
        }
    }
}
