//! REST-backed [`CloudProvider`]
//!
//! Compute Engine deletes return an operation that is waited on before the
//! call returns. Storage and IAM deletes are synchronous.

use super::client::GcpClient;
use crate::model::{Address, Bucket, Disk, Instance, Location, ObjectPage, ServiceAccount};
use crate::provider::{CloudProvider, DeleteError, DeleteResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct RestProvider {
    client: GcpClient,
}

impl RestProvider {
    pub fn new(client: GcpClient) -> Self {
        Self { client }
    }

    /// Submit a Compute Engine delete and block until its operation is DONE
    async fn delete_and_wait(&self, url: &str) -> DeleteResult {
        let operation = self.client.delete(url).await.map_err(DeleteError::Submit)?;
        self.client
            .wait_for_operation(&operation)
            .await
            .map_err(DeleteError::Wait)
    }

    async fn delete_now(&self, url: &str) -> DeleteResult {
        self.client
            .delete(url)
            .await
            .map(|_| ())
            .map_err(DeleteError::Submit)
    }
}

fn parse_items<T: DeserializeOwned>(items: Vec<Value>, kind: &str) -> Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).with_context(|| format!("Failed to parse {}", kind)))
        .collect()
}

#[async_trait]
impl CloudProvider for RestProvider {
    async fn list_instances(&self, project: &str) -> Result<Vec<Instance>> {
        let url = self.client.compute_aggregated_url(project, "instances");
        parse_items(self.client.get_aggregated(&url).await?, "instance")
    }

    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> DeleteResult {
        let url = self
            .client
            .compute_zonal_url(project, zone, &format!("instances/{}", name));
        self.delete_and_wait(&url).await
    }

    async fn list_disks(&self, project: &str) -> Result<Vec<Disk>> {
        let url = self.client.compute_aggregated_url(project, "disks");
        parse_items(self.client.get_aggregated(&url).await?, "disk")
    }

    async fn delete_disk(&self, project: &str, location: &Location, name: &str) -> DeleteResult {
        let resource = format!("disks/{}", name);
        let url = match location {
            Location::Zone(zone) => self.client.compute_zonal_url(project, zone, &resource),
            Location::Region(region) => self.client.compute_regional_url(project, region, &resource),
        };
        self.delete_and_wait(&url).await
    }

    async fn list_regional_addresses(&self, project: &str) -> Result<Vec<Address>> {
        let url = self.client.compute_aggregated_url(project, "addresses");
        parse_items(self.client.get_aggregated(&url).await?, "address")
    }

    async fn delete_regional_address(&self, project: &str, region: &str, name: &str) -> DeleteResult {
        let url = self
            .client
            .compute_regional_url(project, region, &format!("addresses/{}", name));
        self.delete_and_wait(&url).await
    }

    async fn list_global_addresses(&self, project: &str) -> Result<Vec<Address>> {
        let url = self.client.compute_global_url(project, "addresses");
        parse_items(self.client.get_all_pages(&url, "items").await?, "global address")
    }

    async fn delete_global_address(&self, project: &str, name: &str) -> DeleteResult {
        let url = self
            .client
            .compute_global_url(project, &format!("addresses/{}", name));
        self.delete_and_wait(&url).await
    }

    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>> {
        let url = self.client.storage_url("b");
        let items = self
            .client
            .get_all_pages_with(&url, "items", &[("project", project)])
            .await?;
        parse_items(items, "bucket")
    }

    async fn list_objects(&self, bucket: &str, page_token: Option<&str>) -> Result<ObjectPage> {
        let url = self.client.storage_objects_url(bucket);
        let (items, next_page_token) = self.client.get_page(&url, "items", &[], page_token).await?;
        Ok(ObjectPage {
            objects: parse_items(items, "object")?,
            next_page_token,
        })
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> DeleteResult {
        let url = self.client.storage_object_url(bucket, name);
        self.delete_now(&url).await
    }

    async fn delete_bucket(&self, bucket: &str) -> DeleteResult {
        let url = self.client.storage_bucket_url(bucket);
        self.delete_now(&url).await
    }

    async fn list_service_accounts(&self, project: &str) -> Result<Vec<ServiceAccount>> {
        let url = self
            .client
            .iam_url(&format!("projects/{}/serviceAccounts", project));
        parse_items(self.client.get_all_pages(&url, "accounts").await?, "service account")
    }

    async fn delete_service_account(&self, account: &ServiceAccount) -> DeleteResult {
        let url = self.client.iam_url(&account.name);
        self.delete_now(&url).await
    }
}
