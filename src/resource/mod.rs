//! Resource abstraction layer
//!
//! Resource kinds are data: each one is a JSON definition embedded at compile
//! time, and [`DefinedKind`] turns a definition into a [`ResourceKind`] the
//! description engine can run. Adding a kind needs no code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`template`] - Expands URI templates against the context and listed items
//! - [`adapter`] - [`DefinedKind`], the engine adapter over a definition
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `compute.json` - Compute Engine (VMs, disks, networks, subnetworks, firewalls)
//! - `storage.json` - Cloud Storage buckets
//! - `gke.json` - GKE clusters
//! - `pubsub.json` - Pub/Sub topics and subscriptions
//! - `bigquery.json` - BigQuery datasets
//! - `resourcemanager.json` - Projects
//!
//! [`ResourceKind`]: crate::describe::ResourceKind

pub mod adapter;
pub mod registry;
pub mod template;

pub use adapter::DefinedKind;
pub use registry::*;
