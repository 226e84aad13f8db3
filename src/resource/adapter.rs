//! Resource kinds backed by registry definitions

use super::registry::{get_resource, ResourceDef, Scope};
use super::template::render;
use crate::describe::{
    value_at, DescribeContext, DescribeError, Enrichment, LookupSpec, Page, Resource, ResourceKind,
    TokenPath,
};
use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// A [`ResourceKind`] driven entirely by a [`ResourceDef`]
#[derive(Clone)]
pub struct DefinedKind {
    key: String,
    def: ResourceDef,
    lookups: Vec<LookupSpec>,
    client: GcpClient,
}

impl DefinedKind {
    pub fn new(key: impl Into<String>, def: ResourceDef, client: GcpClient) -> Self {
        let lookups = def
            .lookups
            .iter()
            .map(|l| LookupSpec {
                name: l.name.clone(),
                policy: l.policy,
            })
            .collect();

        Self {
            key: key.into(),
            def,
            lookups,
            client,
        }
    }

    /// Look a kind up in the embedded registry
    pub fn resolve(key: &str, client: GcpClient) -> Result<Self> {
        let def = get_resource(key).ok_or_else(|| DescribeError::UnknownKind(key.to_string()))?;
        Ok(Self::new(key, def.clone(), client))
    }

    pub fn definition(&self) -> &ResourceDef {
        &self.def
    }
}

/// Items at `path`; a missing array means an empty page
fn extract_items(mut response: Value, path: &str) -> Vec<Value> {
    let target = if path.is_empty() {
        Some(&mut response)
    } else {
        path.split('.').try_fold(&mut response, |current, part| current.get_mut(part))
    };

    match target.map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// A scalar identity field as a string
fn identity_field(item: &Value, field: Option<&str>) -> String {
    match field.and_then(|f| value_at(item, f)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[async_trait]
impl ResourceKind for DefinedKind {
    type Item = Value;

    fn key(&self) -> &str {
        &self.key
    }

    async fn list_page(&self, ctx: &DescribeContext, cursor: Option<&str>) -> Result<Page<Value>> {
        let path = render(&self.def.list_path, ctx, None)?;

        let mut query: Vec<(String, String)> = self
            .def
            .list_params
            .iter()
            .map(|(k, v)| -> Result<(String, String)> { Ok((k.clone(), render(v, ctx, None)?)) })
            .collect::<Result<_>>()?;
        query.sort();
        if let Some(token) = cursor {
            query.push((self.def.cursor_param.clone(), token.to_string()));
        }

        let url = self.client.url(&self.def.service, &path, &query)?;
        let response = self.client.get(&url).await?;

        let page = match self.def.cursor_path.as_deref() {
            Some(cursor_path) => Page::from_response(response, &TokenPath(cursor_path), |r| {
                extract_items(r, &self.def.response_path)
            }),
            None => Page::last(extract_items(response, &self.def.response_path)),
        };
        Ok(page)
    }

    fn lookups(&self) -> &[LookupSpec] {
        &self.lookups
    }

    async fn lookup(
        &self,
        ctx: &DescribeContext,
        item: &Value,
        spec: &LookupSpec,
        _enrichment: &Enrichment,
    ) -> Result<Value> {
        let def = self
            .def
            .lookups
            .iter()
            .find(|l| l.name == spec.name)
            .with_context(|| format!("{} has no lookup named '{}'", self.key, spec.name))?;

        let path = render(&def.path, ctx, Some(item))?;
        let service = def.service.as_deref().unwrap_or(&self.def.service);
        let url = self.client.url(service, &path, &[])?;
        let response = self.client.get(&url).await?;

        Ok(match def.response_path.as_deref() {
            Some(p) => value_at(&response, p).cloned().unwrap_or(Value::Null),
            None => response,
        })
    }

    fn to_resource(&self, ctx: &DescribeContext, item: Value, enrichment: Enrichment) -> Result<Option<Resource>> {
        if let Some(filter) = &self.def.include_when {
            if !filter.matches(&item) {
                return Ok(None);
            }
        }

        let mut builder = Resource::builder(&self.key, ctx)
            .id(identity_field(&item, self.def.id_field.as_deref()))
            .name(identity_field(&item, self.def.name_field.as_deref()))
            .arn(identity_field(&item, self.def.arn_field.as_deref()));
        if self.def.scope == Scope::Global {
            builder = builder.global();
        }

        let mut description = item;
        enrichment.merge_into(&mut description);

        Ok(Some(builder.description(description).build()?))
    }
}
