//! Describe Context
//!
//! Request-scoped, read-only metadata that every record is stamped with,
//! plus the cancellation signal every suspension point observes.

use super::error::DescribeError;
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Scoping for one describe invocation
#[derive(Debug, Clone)]
pub struct DescribeContext {
    account_id: String,
    region: String,
    zone: Option<String>,
    labels: BTreeMap<String, String>,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
}

impl DescribeContext {
    /// Create a context for a project and region
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            zone: None,
            labels: BTreeMap::new(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Create a context for global resources (empty region)
    pub fn global(account_id: impl Into<String>) -> Self {
        Self::new(account_id, "")
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        let zone = zone.into();
        self.zone = (!zone.is_empty()).then_some(zone);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Bind this context to an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Derive a context for another region. The new context shares labels and
    /// run id, and is cancelled whenever this one is.
    pub fn scoped(&self, region: impl Into<String>) -> Self {
        Self {
            account_id: self.account_id.clone(),
            region: region.into(),
            zone: None,
            labels: self.labels.clone(),
            run_id: self.run_id,
            started_at: self.started_at,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the context was created
    pub fn elapsed(&self) -> TimeDelta {
        Utc::now() - self.started_at
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`DescribeError::Cancelled`] if the token has fired
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DescribeError::Cancelled.into());
        }
        Ok(())
    }

    /// Await `fut` unless cancellation fires first.
    ///
    /// Cancellation wins ties, so an already-cancelled context never polls
    /// `fut` at all.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DescribeError::Cancelled.into()),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_context_has_empty_region() {
        let ctx = DescribeContext::global("my-project");
        assert_eq!(ctx.account_id(), "my-project");
        assert_eq!(ctx.region(), "");
        assert!(ctx.zone().is_none());
    }

    #[test]
    fn test_empty_zone_is_ignored() {
        let ctx = DescribeContext::new("my-project", "us-central1").with_zone("");
        assert!(ctx.zone().is_none());

        let ctx = ctx.with_zone("us-central1-a");
        assert_eq!(ctx.zone(), Some("us-central1-a"));
    }

    #[test]
    fn test_scoped_context_follows_parent_cancellation() {
        let parent = DescribeContext::new("my-project", "us-central1").with_label("team", "infra");
        let child = parent.scoped("europe-west1");

        assert_eq!(child.region(), "europe-west1");
        assert_eq!(child.label("team"), Some("infra"));
        assert_eq!(child.run_id(), parent.run_id());

        parent.cancellation().cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_labels_and_start_time() {
        let ctx = DescribeContext::global("my-project")
            .with_label("kind", "storage-buckets")
            .with_label("env", "prod");

        let keys: Vec<&str> = ctx.labels().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["env", "kind"]);
        assert!(ctx.started_at() <= Utc::now());
        assert!(ctx.elapsed() >= TimeDelta::zero());
    }

    #[tokio::test]
    async fn test_run_returns_future_output() {
        let ctx = DescribeContext::global("my-project");
        let value = ctx.run(async { Ok::<_, anyhow::Error>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_on_cancelled_context_skips_future() {
        let ctx = DescribeContext::global("my-project");
        ctx.cancellation().cancel();

        let mut polled = false;
        let err = ctx
            .run(async {
                polled = true;
                Ok::<(), anyhow::Error>(())
            })
            .await
            .unwrap_err();
        assert!(DescribeError::is_cancelled(&err));
        assert!(!polled);
        assert!(ctx.check().is_err());
    }

    #[tokio::test]
    async fn test_run_aborts_pending_future_on_cancel() {
        let ctx = DescribeContext::global("my-project");
        let token = ctx.cancellation().clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = ctx
            .run(futures::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(DescribeError::is_cancelled(&err));
    }
}
