//! Resource description engine
//!
//! Generic machinery that turns "list, look up extra details, build a record"
//! into one call per resource kind. Leaf adapters implement [`ResourceKind`];
//! the engine owns pagination, the enrichment failure policy, cancellation and
//! delivery.
//!
//! # Architecture
//!
//! - [`context`] - Per-call scoping (project, region, zone) and cancellation
//! - [`paginator`] - Drives a page-fetch function to exhaustion
//! - [`enrich`] - Ordered secondary lookups with required/optional policy
//! - [`sink`] - Push ([`Callback`], [`Channel`]) and pull ([`Collect`]) delivery
//! - [`engine`] - The [`ResourceKind`] trait and the describe loop
//!
//! # Example
//!
//! ```ignore
//! use gcp_inventory::describe::{describe_all, DescribeContext};
//! use gcp_inventory::resource::DefinedKind;
//!
//! async fn buckets(client: GcpClient) -> anyhow::Result<()> {
//!     let kind = DefinedKind::resolve("storage-buckets", client)?;
//!     let ctx = DescribeContext::global("my-project");
//!     for resource in describe_all(&kind, &ctx).await? {
//!         println!("{}", resource.identity());
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod paginator;
pub mod resource;
pub mod sink;

pub use context::DescribeContext;
pub use engine::{describe, describe_all, describe_each, describe_into, DescribeStats, Describer, ResourceKind};
pub use enrich::{enrich, Enrichment, LookupPolicy, LookupSpec};
pub use error::DescribeError;
pub use paginator::{value_at, Continuation, Page, Paginator, TokenPath};
pub use resource::{Resource, ResourceBuilder};
pub use sink::{Callback, Channel, Collect, ResourceSink};
