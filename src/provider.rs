//! Provider boundary
//!
//! Everything the cleaners need from the cloud, expressed as list and
//! delete calls. List calls return every page. Delete calls submit the
//! request and block until the resulting operation is terminal, so the
//! cleaners never see operation handles.

use crate::model::{Address, Bucket, Disk, Instance, Location, ObjectPage, ServiceAccount};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Why a delete did not complete
#[derive(Debug)]
pub enum DeleteError {
    /// The delete request itself was rejected or never reached the API
    Submit(anyhow::Error),
    /// The delete was accepted but the operation failed or could not be polled
    Wait(anyhow::Error),
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteError::Submit(e) => write!(f, "{:#}", e),
            DeleteError::Wait(e) => write!(f, "{:#}", e),
        }
    }
}

impl std::error::Error for DeleteError {}

pub type DeleteResult = std::result::Result<(), DeleteError>;

#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn list_instances(&self, project: &str) -> Result<Vec<Instance>>;
    async fn delete_instance(&self, project: &str, zone: &str, name: &str) -> DeleteResult;

    async fn list_disks(&self, project: &str) -> Result<Vec<Disk>>;
    async fn delete_disk(&self, project: &str, location: &Location, name: &str) -> DeleteResult;

    async fn list_regional_addresses(&self, project: &str) -> Result<Vec<Address>>;
    async fn delete_regional_address(&self, project: &str, region: &str, name: &str) -> DeleteResult;
    async fn list_global_addresses(&self, project: &str) -> Result<Vec<Address>>;
    async fn delete_global_address(&self, project: &str, name: &str) -> DeleteResult;

    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>>;
    /// One page of objects; pass the previous page's token to continue
    async fn list_objects(&self, bucket: &str, page_token: Option<&str>) -> Result<ObjectPage>;
    async fn delete_object(&self, bucket: &str, name: &str) -> DeleteResult;
    async fn delete_bucket(&self, bucket: &str) -> DeleteResult;

    async fn list_service_accounts(&self, project: &str) -> Result<Vec<ServiceAccount>>;
    async fn delete_service_account(&self, account: &ServiceAccount) -> DeleteResult;
}
