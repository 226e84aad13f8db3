//! The uniform inventory record

use super::context::DescribeContext;
use super::error::DescribeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One described resource.
///
/// `kind` tags the shape of `description`; the engine never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: String,
    pub account_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub description: Value,
}

impl Resource {
    /// Start a record stamped with the context's project and region
    pub fn builder(kind: impl Into<String>, ctx: &DescribeContext) -> ResourceBuilder {
        ResourceBuilder {
            kind: kind.into(),
            account_id: ctx.account_id().to_string(),
            region: ctx.region().to_string(),
            id: String::new(),
            arn: String::new(),
            name: String::new(),
            description: Value::Null,
        }
    }

    /// The most specific non-empty identity field
    pub fn identity(&self) -> &str {
        [&self.arn, &self.id, &self.name]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    kind: String,
    account_id: String,
    region: String,
    id: String,
    arn: String,
    name: String,
    description: Value,
}

impl ResourceBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = arn.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Clear the region for resources that are not regional
    pub fn global(mut self) -> Self {
        self.region.clear();
        self
    }

    pub fn description(mut self, description: Value) -> Self {
        self.description = description;
        self
    }

    /// Finish the record. Fails when every identity field is empty.
    pub fn build(self) -> Result<Resource, DescribeError> {
        if self.id.is_empty() && self.arn.is_empty() && self.name.is_empty() {
            return Err(DescribeError::MissingIdentity { kind: self.kind });
        }

        Ok(Resource {
            kind: self.kind,
            account_id: self.account_id,
            region: self.region,
            id: self.id,
            arn: self.arn,
            name: self.name,
            description: self.description,
        })
    }
}
