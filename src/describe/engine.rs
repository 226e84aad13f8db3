//! Description Engine
//!
//! One describe call covers one resource kind:
//!
//! ```text
//! Start -> Fetching(cursor) -> [enrich + deliver item]* -> Fetching(next) -> ... -> Done
//! ```
//!
//! Any error moves straight to `Failed` and is returned as-is. Pages, items
//! and lookups are processed strictly one at a time, so records reach the
//! sink in upstream listing order.

use super::context::DescribeContext;
use super::enrich::{enrich, Enrichment, LookupSpec};
use super::paginator::{Page, Paginator};
use super::resource::Resource;
use super::sink::{Callback, Collect, ResourceSink};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// The capability set a resource kind supplies: list, enrich, map
#[async_trait]
pub trait ResourceKind: Send + Sync {
    /// Raw upstream item as yielded by the listing call
    type Item: Send + Sync;

    /// Stable key, e.g. `compute-instances`
    fn key(&self) -> &str;

    /// Fetch one page. `cursor` is `None` for the first page.
    async fn list_page(&self, ctx: &DescribeContext, cursor: Option<&str>) -> Result<Page<Self::Item>>;

    /// Secondary lookups to run for every item, in order
    fn lookups(&self) -> &[LookupSpec] {
        &[]
    }

    /// Run one declared lookup. `enrichment` holds the outputs of the lookups
    /// declared before it.
    async fn lookup(
        &self,
        _ctx: &DescribeContext,
        _item: &Self::Item,
        spec: &LookupSpec,
        _enrichment: &Enrichment,
    ) -> Result<Value> {
        anyhow::bail!("{} has no lookup named '{}'", ResourceKind::key(self), spec.name)
    }

    /// Build the final record, or `Ok(None)` to skip the item
    fn to_resource(
        &self,
        ctx: &DescribeContext,
        item: Self::Item,
        enrichment: Enrichment,
    ) -> Result<Option<Resource>>;
}

/// Counters for one describe call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescribeStats {
    pub pages: usize,
    pub items: usize,
    pub delivered: usize,
    pub filtered: usize,
    pub degraded: usize,
}

/// Describe every item of `kind`, delivering records into `sink`
pub async fn describe_into<K>(
    kind: &K,
    ctx: &DescribeContext,
    sink: &mut dyn ResourceSink,
) -> Result<DescribeStats>
where
    K: ResourceKind + ?Sized,
{
    let key = ResourceKind::key(kind);
    tracing::debug!(
        "describe {} (project={}, region={}, run={}, labels={:?})",
        key,
        ctx.account_id(),
        ctx.region(),
        ctx.run_id(),
        ctx.labels()
    );

    let mut stats = DescribeStats::default();
    match run(kind, ctx, sink, &mut stats).await {
        Ok(()) => {
            tracing::debug!(
                "describe {} done in {}ms: {:?}",
                key,
                ctx.elapsed().num_milliseconds(),
                stats
            );
            Ok(stats)
        }
        Err(err) => {
            tracing::debug!("describe {} failed after {:?}: {:#}", key, stats, err);
            Err(err)
        }
    }
}

async fn run<K>(
    kind: &K,
    ctx: &DescribeContext,
    sink: &mut dyn ResourceSink,
    stats: &mut DescribeStats,
) -> Result<()>
where
    K: ResourceKind + ?Sized,
{
    ctx.check()?;

    let mut pages = Paginator::new(move |cursor: Option<String>| async move {
        kind.list_page(ctx, cursor.as_deref()).await
    });

    while let Some(items) = pages.next_page(ctx).await? {
        stats.pages += 1;

        for item in items {
            ctx.check()?;
            stats.items += 1;

            let enrichment = enrich(kind, ctx, &item).await?;
            stats.degraded += enrichment.degraded().len();

            match kind.to_resource(ctx, item, enrichment)? {
                Some(resource) => {
                    ctx.run(sink.accept(resource)).await?;
                    stats.delivered += 1;
                }
                None => stats.filtered += 1,
            }
        }
    }

    Ok(())
}

/// Pull mode: every record, in upstream order, once the listing is exhausted
pub async fn describe_all<K>(kind: &K, ctx: &DescribeContext) -> Result<Vec<Resource>>
where
    K: ResourceKind + ?Sized,
{
    let mut sink = Collect::new();
    describe_into(kind, ctx, &mut sink).await?;
    Ok(sink.into_resources())
}

/// Push mode: `callback` sees each record before the next item is processed
pub async fn describe_each<K, F>(kind: &K, ctx: &DescribeContext, callback: F) -> Result<DescribeStats>
where
    K: ResourceKind + ?Sized,
    F: FnMut(Resource) -> Result<()> + Send,
{
    let mut sink = Callback::new(callback);
    describe_into(kind, ctx, &mut sink).await
}

/// Push when a callback is given (returning an empty vector), pull otherwise
pub async fn describe<K>(
    kind: &K,
    ctx: &DescribeContext,
    callback: Option<&mut (dyn FnMut(Resource) -> Result<()> + Send)>,
) -> Result<Vec<Resource>>
where
    K: ResourceKind + ?Sized,
{
    match callback {
        Some(callback) => {
            describe_each(kind, ctx, callback).await?;
            Ok(Vec::new())
        }
        None => describe_all(kind, ctx).await,
    }
}

/// Object-safe view of a [`ResourceKind`], for holding mixed kinds together
#[async_trait]
pub trait Describer: Send + Sync {
    fn key(&self) -> &str;

    async fn describe_into(&self, ctx: &DescribeContext, sink: &mut dyn ResourceSink) -> Result<DescribeStats>;
}

#[async_trait]
impl<K> Describer for K
where
    K: ResourceKind,
{
    fn key(&self) -> &str {
        ResourceKind::key(self)
    }

    async fn describe_into(&self, ctx: &DescribeContext, sink: &mut dyn ResourceSink) -> Result<DescribeStats> {
        describe_into(self, ctx, sink).await
    }
}
