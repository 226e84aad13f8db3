//! gcp-inventory
//!
//! Enumerates Google Cloud resources into uniform, provider-neutral records.
//! [`describe`] holds the generic engine, [`resource`] the data-driven
//! resource kinds, and [`gcp`] the authenticated transport they call.

pub mod config;
pub mod describe;
pub mod gcp;
pub mod output;
pub mod resource;
