//! In-memory provider that records every delete

use crate::model::{
    Address, Bucket, Disk, Instance, Location, ObjectPage, ServiceAccount, StorageObject,
};
use crate::provider::{CloudProvider, DeleteError, DeleteResult};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Instance,
    Disk,
    RegionalAddress,
    GlobalAddress,
    Bucket,
    Object,
    ServiceAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submitted,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub project: String,
    pub kind: Kind,
    pub name: String,
    pub stage: Stage,
}

/// Lists always return the configured resources, even after they were
/// deleted, so a second sweep sees stale entries.
#[derive(Default)]
pub struct FakeProvider {
    pub instances: Vec<Instance>,
    pub disks: Vec<Disk>,
    pub regional_addresses: Vec<Address>,
    pub global_addresses: Vec<Address>,
    pub buckets: Vec<Bucket>,
    pub objects: HashMap<String, Vec<StorageObject>>,
    pub service_account_emails: Vec<String>,
    /// Objects per listing page; 0 returns everything in one page
    pub object_page_size: usize,
    /// Listing this object page (0-based) fails
    pub fail_object_page: Option<usize>,
    /// Listing these kinds fails
    pub fail_listing: HashSet<Kind>,
    /// Deleting these names is rejected
    pub fail_submit: HashSet<String>,
    /// Deleting these names is accepted but the operation fails
    pub fail_wait: HashSet<String>,
    events: Mutex<Vec<Event>>,
    deleted: Mutex<HashSet<(String, Kind, String)>>,
}

pub fn instance(name: &str, zone: &str, status: &str) -> Instance {
    Instance {
        name: name.to_string(),
        zone: format!("https://www.googleapis.com/compute/v1/projects/p/zones/{}", zone),
        status: status.to_string(),
    }
}

pub fn disk(name: &str, zone: &str, users: &[&str]) -> Disk {
    Disk {
        name: name.to_string(),
        zone: Some(format!("https://www.googleapis.com/compute/v1/projects/p/zones/{}", zone)),
        region: None,
        size_gb: Some("10".to_string()),
        users: users.iter().map(|u| u.to_string()).collect(),
    }
}

pub fn address(name: &str, region: Option<&str>, status: &str) -> Address {
    Address {
        name: name.to_string(),
        region: region
            .map(|r| format!("https://www.googleapis.com/compute/v1/projects/p/regions/{}", r)),
        address: "34.0.0.1".to_string(),
        status: status.to_string(),
    }
}

impl FakeProvider {
    /// Two instances, one free and one attached disk, a reserved regional
    /// address, an in-use global address, one matching and one foreign
    /// service account, and a bucket holding two objects
    pub fn scenario() -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            "logs-bucket".to_string(),
            vec![
                StorageObject { name: "a.txt".to_string() },
                StorageObject { name: "b/c.txt".to_string() },
            ],
        );

        Self {
            instances: vec![
                instance("web-1", "us-central1-a", "RUNNING"),
                instance("batch-1", "us-central1-b", "TERMINATED"),
            ],
            disks: vec![
                disk("orphan-disk", "us-central1-a", &[]),
                disk("boot-disk", "us-central1-a", &["instances/web-1"]),
            ],
            regional_addresses: vec![address("spare-ip", Some("us-central1"), "RESERVED")],
            global_addresses: vec![address("lb-ip", None, "IN_USE")],
            buckets: vec![Bucket {
                name: "logs-bucket".to_string(),
                location: "US".to_string(),
                storage_class: "STANDARD".to_string(),
            }],
            objects,
            service_account_emails: vec![
                "vsa-sa-gcnv-x@proj.iam.gserviceaccount.com".to_string(),
                "other-sa@proj.iam.gserviceaccount.com".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Number of delete requests issued, successful or not
    pub fn mutating_calls(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| e.stage == Stage::Submitted)
            .count()
    }

    pub fn submitted(&self, kind: Kind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind && e.stage == Stage::Submitted)
            .map(|e| e.name)
            .collect()
    }

    pub fn submitted_kinds(&self) -> Vec<Kind> {
        self.events()
            .iter()
            .filter(|e| e.stage == Stage::Submitted)
            .map(|e| e.kind)
            .collect()
    }

    fn push(&self, project: &str, kind: Kind, name: &str, stage: Stage) {
        self.events.lock().unwrap().push(Event {
            project: project.to_string(),
            kind,
            name: name.to_string(),
            stage,
        });
    }

    fn listing<T: Clone>(&self, kind: Kind, items: &[T]) -> Result<Vec<T>> {
        if self.fail_listing.contains(&kind) {
            return Err(anyhow::anyhow!("API request failed: 403 Forbidden"));
        }
        Ok(items.to_vec())
    }

    async fn delete(&self, project: &str, kind: Kind, name: &str) -> DeleteResult {
        self.push(project, kind, name, Stage::Submitted);

        let rejected = self.fail_submit.contains(name);
        let fresh = !rejected
            && self
                .deleted
                .lock()
                .unwrap()
                .insert((project.to_string(), kind, name.to_string()));
        if !fresh {
            self.push(project, kind, name, Stage::Failed);
            return Err(DeleteError::Submit(anyhow::anyhow!(
                "API request failed: 404 Not Found - The resource '{}' was not found",
                name
            )));
        }

        // Operation in flight
        tokio::task::yield_now().await;

        if self.fail_wait.contains(name) {
            self.push(project, kind, name, Stage::Failed);
            return Err(DeleteError::Wait(anyhow::anyhow!("operation failed: INTERNAL_ERROR")));
        }

        self.push(project, kind, name, Stage::Completed);
        Ok(())
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    async fn list_instances(&self, _project: &str) -> Result<Vec<Instance>> {
        self.listing(Kind::Instance, &self.instances)
    }

    async fn delete_instance(&self, project: &str, _zone: &str, name: &str) -> DeleteResult {
        self.delete(project, Kind::Instance, name).await
    }

    async fn list_disks(&self, _project: &str) -> Result<Vec<Disk>> {
        self.listing(Kind::Disk, &self.disks)
    }

    async fn delete_disk(&self, project: &str, _location: &Location, name: &str) -> DeleteResult {
        self.delete(project, Kind::Disk, name).await
    }

    async fn list_regional_addresses(&self, _project: &str) -> Result<Vec<Address>> {
        self.listing(Kind::RegionalAddress, &self.regional_addresses)
    }

    async fn delete_regional_address(&self, project: &str, _region: &str, name: &str) -> DeleteResult {
        self.delete(project, Kind::RegionalAddress, name).await
    }

    async fn list_global_addresses(&self, _project: &str) -> Result<Vec<Address>> {
        self.listing(Kind::GlobalAddress, &self.global_addresses)
    }

    async fn delete_global_address(&self, project: &str, name: &str) -> DeleteResult {
        self.delete(project, Kind::GlobalAddress, name).await
    }

    async fn list_buckets(&self, _project: &str) -> Result<Vec<Bucket>> {
        self.listing(Kind::Bucket, &self.buckets)
    }

    async fn list_objects(&self, bucket: &str, page_token: Option<&str>) -> Result<ObjectPage> {
        let objects = self.objects.get(bucket).cloned().unwrap_or_default();
        let objects = self.listing(Kind::Object, &objects)?;

        let page_size = match self.object_page_size {
            0 => objects.len().max(1),
            n => n,
        };
        let start: usize = page_token.map_or(0, |t| t.parse().unwrap());
        if self.fail_object_page == Some(start / page_size) {
            return Err(anyhow::anyhow!("API request failed: 503 Service Unavailable"));
        }

        let end = (start + page_size).min(objects.len());
        Ok(ObjectPage {
            objects: objects[start..end].to_vec(),
            next_page_token: (end < objects.len()).then(|| end.to_string()),
        })
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> DeleteResult {
        self.delete(bucket, Kind::Object, name).await
    }

    async fn delete_bucket(&self, bucket: &str) -> DeleteResult {
        self.delete(bucket, Kind::Bucket, bucket).await
    }

    async fn list_service_accounts(&self, project: &str) -> Result<Vec<ServiceAccount>> {
        let accounts: Vec<ServiceAccount> = self
            .service_account_emails
            .iter()
            .map(|email| ServiceAccount {
                name: format!("projects/{}/serviceAccounts/{}", project, email),
                email: email.clone(),
                display_name: String::new(),
            })
            .collect();
        self.listing(Kind::ServiceAccount, &accounts)
    }

    async fn delete_service_account(&self, account: &ServiceAccount) -> DeleteResult {
        let project = account
            .name
            .strip_prefix("projects/")
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default()
            .to_string();
        self.delete(&project, Kind::ServiceAccount, &account.email).await
    }
}
