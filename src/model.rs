//! Resource records
//!
//! Typed views of the Compute Engine, Cloud Storage and IAM resources the
//! sweeper looks at. Records are deserialized straight from the REST
//! responses and only carry the fields the cleaners need.

use serde::Deserialize;
use std::fmt;

/// Address status reported by Compute Engine for an address bound to a resource
pub const ADDRESS_IN_USE: &str = "IN_USE";

/// Extract the trailing path segment from a GCP resource URL
/// e.g., "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a" -> "us-central1-a"
pub fn extract_location(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Where a zonal or regional resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Zone(String),
    Region(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Zone(zone) => write!(f, "zone: {}", zone),
            Location::Region(region) => write!(f, "region: {}", region),
        }
    }
}

/// Compute Engine VM instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Full zone URL as returned by the API
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub status: String,
}

impl Instance {
    pub fn zone_name(&self) -> String {
        extract_location(&self.zone)
    }
}

/// Persistent disk, zonal or regional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// int64 fields come back as JSON strings
    #[serde(default)]
    pub size_gb: Option<String>,
    /// Instances the disk is attached to
    #[serde(default)]
    pub users: Vec<String>,
}

impl Disk {
    /// A disk with any attachment reference is in use
    pub fn is_attached(&self) -> bool {
        !self.users.is_empty()
    }

    pub fn location(&self) -> Location {
        match (&self.zone, &self.region) {
            (Some(zone), _) if !zone.is_empty() => Location::Zone(extract_location(zone)),
            (_, Some(region)) => Location::Region(extract_location(region)),
            _ => Location::Zone(String::new()),
        }
    }

    pub fn size_display(&self) -> String {
        self.size_gb.as_deref().unwrap_or("?").to_string()
    }
}

/// Whether an address is bound to a region or global
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressScope {
    Regional(String),
    Global,
}

/// Reserved static IP address
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    /// The IP literal
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: String,
}

impl Address {
    pub fn is_in_use(&self) -> bool {
        self.status == ADDRESS_IN_USE
    }

    pub fn scope(&self) -> AddressScope {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => AddressScope::Regional(extract_location(region)),
            _ => AddressScope::Global,
        }
    }
}

/// Cloud Storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub storage_class: String,
}

/// Object inside a bucket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageObject {
    pub name: String,
}

/// One page of a bucket's object listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<StorageObject>,
    /// Set when more objects remain
    pub next_page_token: Option<String>,
}

/// IAM service account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// Resource path: projects/{project}/serviceAccounts/{email}
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
}

impl ServiceAccount {
    /// Local part of the email, before the '@'
    pub fn local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }

    /// True when the account was created by the automation owning `prefix`
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.local_part().starts_with(prefix)
    }
}
