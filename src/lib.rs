//! gcp-sweep
//!
//! Deletes unused GCP resources across a fixed list of projects: VM
//! instances first, then unattached disks, unused static IPs and
//! automation-created service accounts. Buckets are reported, not deleted,
//! unless bucket deletion is explicitly allowed.

pub mod cleanup;
pub mod config;
pub mod gcp;
pub mod model;
pub mod provider;
