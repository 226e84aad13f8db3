//! Enrichment Join
//!
//! Runs a kind's declared secondary lookups for one listed item. Each lookup
//! is declared `required` or `optional` up front; the declaration alone
//! decides whether its failure aborts the describe call.

use super::context::DescribeContext;
use super::engine::ResourceKind;
use super::error::DescribeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// What a failed lookup does to the describe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPolicy {
    /// Failure aborts the describe call with the lookup's error
    #[default]
    Required,
    /// Failure leaves the field null and processing continues
    Optional,
}

/// Declaration of one secondary lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSpec {
    pub name: String,
    pub policy: LookupPolicy,
}

impl LookupSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: LookupPolicy::Required,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: LookupPolicy::Optional,
        }
    }
}

/// Lookup outputs for a single item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    fields: Map<String, Value>,
    degraded: Vec<String>,
}

impl Enrichment {
    /// Output of a lookup, or `Null` when it failed or never ran
    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }

    pub fn take(&mut self, name: &str) -> Value {
        self.fields.remove(name).unwrap_or(Value::Null)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    fn degrade(&mut self, name: &str) {
        self.fields.insert(name.to_string(), Value::Null);
        self.degraded.push(name.to_string());
    }

    pub fn is_degraded(&self, name: &str) -> bool {
        self.degraded.iter().any(|d| d == name)
    }

    /// Optional lookups that failed, in declaration order
    pub fn degraded(&self) -> &[String] {
        &self.degraded
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every field into `description` if it is a JSON object
    pub fn merge_into(&self, description: &mut Value) {
        if let Value::Object(map) = description {
            for (name, value) in &self.fields {
                map.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Run every lookup `kind` declares for `item`, in order
pub async fn enrich<K>(kind: &K, ctx: &DescribeContext, item: &K::Item) -> Result<Enrichment>
where
    K: ResourceKind + ?Sized,
{
    let mut enrichment = Enrichment::default();

    for spec in kind.lookups() {
        match ctx.run(kind.lookup(ctx, item, spec, &enrichment)).await {
            Ok(value) => enrichment.insert(spec.name.clone(), value),
            Err(err) if spec.policy == LookupPolicy::Optional && !DescribeError::is_cancelled(&err) => {
                tracing::debug!(
                    "{}: optional lookup '{}' failed, leaving it empty: {:#}",
                    kind.key(),
                    spec.name,
                    err
                );
                enrichment.degrade(&spec.name);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(enrichment)
}
