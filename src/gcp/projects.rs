//! GCP Projects
//!
//! Lists the projects the caller can see, following `nextPageToken` through
//! the shared paginator.

use super::client::GcpClient;
use crate::describe::{DescribeContext, Page, Paginator, TokenPath};
use anyhow::Result;
use serde_json::Value;

/// Project information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub project_number: String,
    pub lifecycle_state: String,
}

impl From<&Value> for Project {
    fn from(value: &Value) -> Self {
        let field = |key: &str, default: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        Self {
            project_id: field("projectId", "-"),
            name: field("name", "-"),
            project_number: field("projectNumber", "-"),
            lifecycle_state: field("lifecycleState", "UNKNOWN"),
        }
    }
}

/// List every ACTIVE project
pub async fn list_projects(client: &GcpClient, ctx: &DescribeContext) -> Result<Vec<Project>> {
    let pages = Paginator::new(move |cursor: Option<String>| async move {
        let query: Vec<(String, String)> = cursor
            .map(|token| ("pageToken".to_string(), token))
            .into_iter()
            .collect();
        let url = client.url("cloudresourcemanager", "/v1/projects", &query)?;
        let response = client.get(&url).await?;

        Ok(Page::from_response(response, &TokenPath("nextPageToken"), |response| {
            response
                .get("projects")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(Project::from).collect())
                .unwrap_or_default()
        }))
    });

    let projects: Vec<Project> = pages.collect_all(ctx).await?;
    Ok(projects
        .into_iter()
        .filter(|p| p.lifecycle_state == "ACTIVE")
        .collect())
}

/// Project IDs of every ACTIVE project
pub async fn list_project_ids(client: &GcpClient, ctx: &DescribeContext) -> Result<Vec<String>> {
    let projects = list_projects(client, ctx).await?;
    Ok(projects.into_iter().map(|p| p.project_id).collect())
}
