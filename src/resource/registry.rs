//! Resource Registry - Load resource definitions from JSON
//!
//! Every resource kind the CLI can describe is declared in one of the embedded
//! JSON files under `src/resources/`. A definition says which URL lists the
//! kind, where items and the continuation token sit in the response, which
//! fields identify an item, and which secondary lookups enrich it.

use crate::describe::LookupPolicy;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/compute.json"),
    include_str!("../resources/storage.json"),
    include_str!("../resources/gke.json"),
    include_str!("../resources/pubsub.json"),
    include_str!("../resources/bigquery.json"),
    include_str!("../resources/resourcemanager.json"),
];

/// Where a kind lives, which decides the region stamped on its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Not tied to a region; records carry an empty region
    #[default]
    Global,
    Regional,
    /// Listed per zone; needs a zone in the context
    Zonal,
}

/// Keep only items whose `field` equals `equals`
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub equals: Value,
}

impl FieldMatch {
    pub fn matches(&self, item: &Value) -> bool {
        crate::describe::value_at(item, &self.field) == Some(&self.equals)
    }
}

/// Secondary lookup definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct LookupDef {
    /// Field name the result is stored under in the description
    pub name: String,
    /// URI template, expanded against the listed item
    pub path: String,
    #[serde(default)]
    pub policy: LookupPolicy,
    /// Service to call; defaults to the resource's own service
    #[serde(default)]
    pub service: Option<String>,
    /// Dot path of the interesting part of the response
    #[serde(default)]
    pub response_path: Option<String>,
}

fn default_cursor_path() -> Option<String> {
    Some("nextPageToken".to_string())
}

fn default_cursor_param() -> String {
    "pageToken".to_string()
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub service: String,
    /// URI template of the listing call
    pub list_path: String,
    /// Fixed query parameters of the listing call
    #[serde(default)]
    pub list_params: HashMap<String, String>,
    /// Dot path of the item array in a page response
    pub response_path: String,
    /// Dot path of the continuation token; `null` for unpaginated listings
    #[serde(default = "default_cursor_path")]
    pub cursor_path: Option<String>,
    /// Query parameter the continuation token is sent back in
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub name_field: Option<String>,
    /// Fully-qualified resource reference, e.g. `selfLink`
    #[serde(default)]
    pub arn_field: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub include_when: Option<FieldMatch>,
    #[serde(default)]
    pub lookups: Vec<LookupDef>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// All resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    keys
}
