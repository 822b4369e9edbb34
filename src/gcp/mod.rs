//! GCP API interaction module
//!
//! - [`auth`] - credentials from Application Default Credentials or a fixed token
//! - [`client`] - request helpers, pagination, operation polling
//! - [`http`] - HTTP utilities for REST API calls
//! - [`rest`] - the REST implementation of [`crate::provider::CloudProvider`]
//!
//! # Example
//!
//! ```ignore
//! use gcp_sweep::gcp::{auth::GcpCredentials, client::{Endpoints, GcpClient}, rest::RestProvider};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(GcpCredentials::new().await?, Endpoints::default())?;
//!     let provider = RestProvider::new(client);
//!     let disks = provider.list_disks("my-project").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod rest;
