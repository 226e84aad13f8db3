//! Resource Sink
//!
//! Where finished records go. [`Collect`] buffers everything for pull-style
//! callers; [`Callback`] and [`Channel`] stream records one at a time and can
//! halt the describe call by failing.

use super::error::DescribeError;
use super::resource::Resource;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[async_trait]
pub trait ResourceSink: Send {
    /// Deliver one record. An error aborts the describe call unchanged.
    async fn accept(&mut self, resource: Resource) -> Result<()>;
}

/// Buffers records in production order
#[derive(Debug, Default)]
pub struct Collect {
    resources: Vec<Resource>,
}

impl Collect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }
}

#[async_trait]
impl ResourceSink for Collect {
    async fn accept(&mut self, resource: Resource) -> Result<()> {
        self.resources.push(resource);
        Ok(())
    }
}

/// Hands each record to a synchronous callback
pub struct Callback<F> {
    f: F,
}

impl<F> Callback<F>
where
    F: FnMut(Resource) -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ResourceSink for Callback<F>
where
    F: FnMut(Resource) -> Result<()> + Send,
{
    async fn accept(&mut self, resource: Resource) -> Result<()> {
        (self.f)(resource)
    }
}

/// Sends each record into a bounded channel; a full channel holds the
/// describe call until the consumer catches up.
#[derive(Debug, Clone)]
pub struct Channel {
    tx: mpsc::Sender<Resource>,
}

impl Channel {
    pub fn new(tx: mpsc::Sender<Resource>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ResourceSink for Channel {
    async fn accept(&mut self, resource: Resource) -> Result<()> {
        self.tx
            .send(resource)
            .await
            .map_err(|_| DescribeError::SinkClosed.into())
    }
}
