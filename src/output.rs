//! Output formats for described resources

use crate::describe::Resource;
use anyhow::{Context, Result};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON record per line, written as records arrive
    #[default]
    Jsonl,
    /// A single JSON array, written once every job has finished
    Json,
    /// A single YAML sequence, written once every job has finished
    Yaml,
}

impl OutputFormat {
    /// Whether records can be written while jobs are still running
    pub fn is_streaming(self) -> bool {
        matches!(self, OutputFormat::Jsonl)
    }
}

/// One JSONL line, newline included
pub fn jsonl_line(resource: &Resource) -> Result<String> {
    let mut line = serde_json::to_string(resource)
        .with_context(|| format!("Failed to serialize {} '{}'", resource.kind, resource.identity()))?;
    line.push('\n');
    Ok(line)
}

/// A whole document holding `resources`, in order
pub fn render_document(format: OutputFormat, resources: &[Resource]) -> Result<String> {
    match format {
        OutputFormat::Jsonl => resources.iter().map(jsonl_line).collect(),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(resources).context("Failed to render JSON")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yaml::to_string(resources).context("Failed to render YAML"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::DescribeContext;
    use serde_json::json;

    fn resource(name: &str) -> Resource {
        let ctx = DescribeContext::new("my-project", "us-central1");
        Resource::builder("storage-buckets", &ctx)
            .name(name)
            .global()
            .description(json!({ "name": name, "location": "EU" }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_jsonl_line_is_single_line() {
        let line = jsonl_line(&resource("b1")).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["kind"], "storage-buckets");
        assert_eq!(parsed["name"], "b1");
    }

    #[test]
    fn test_render_jsonl_keeps_order() {
        let out = render_document(OutputFormat::Jsonl, &[resource("b1"), resource("b2")]).unwrap();
        let names: Vec<String> = out
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b1", "b2"]);
    }

    #[test]
    fn test_render_json_array() {
        let out = render_document(OutputFormat::Json, &[resource("b1")]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["description"]["location"], "EU");
    }

    #[test]
    fn test_render_yaml_sequence() {
        let out = render_document(OutputFormat::Yaml, &[resource("b1"), resource("b2")]).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed.as_sequence().unwrap().len(), 2);
        assert!(out.contains("kind: storage-buckets"));
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(render_document(OutputFormat::Jsonl, &[]).unwrap(), "");
        assert_eq!(render_document(OutputFormat::Json, &[]).unwrap(), "[]\n");
    }

    #[test]
    fn test_only_jsonl_streams() {
        assert!(OutputFormat::Jsonl.is_streaming());
        assert!(!OutputFormat::Json.is_streaming());
        assert!(!OutputFormat::Yaml.is_streaming());
    }
}
