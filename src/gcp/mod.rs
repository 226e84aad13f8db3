//! GCP API interaction module
//!
//! Transport for the resource adapters: authentication, the HTTP client and
//! project discovery.
//!
//! # Module Structure
//!
//! - [`auth`] - Application Default Credentials and gcloud defaults
//! - [`client`] - Authorized client with per-service endpoints
//! - [`http`] - HTTP utilities and API error mapping
//! - [`projects`] - Project listing
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::client::GcpClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new().await?;
//!     let url = client.url("storage", "/storage/v1/b", &[("project".into(), "my-project".into())])?;
//!     let buckets = client.get(&url).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod projects;

pub use client::{Auth, GcpClient};
pub use http::{format_gcp_error, ApiError};
