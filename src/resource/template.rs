//! URI templates for resource definitions
//!
//! Placeholders:
//!
//! - `{project}`, `{region}`, `{zone}` come from the describe context
//! - `{item.some.path}` reads a field of the listed item
//!
//! `{var}` is percent-encoded; `{+var}` is inserted as-is, for values such as
//! `projects/p/topics/t` that already are path segments.

use crate::describe::{value_at, DescribeContext};
use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Expand `template`. `item` is `None` while rendering listing URLs.
pub fn render(template: &str, ctx: &DescribeContext, item: Option<&Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .with_context(|| format!("Unclosed placeholder in template '{}'", template))?;

        let expr = &rest[open + 1..close];
        let (raw, var) = match expr.strip_prefix('+') {
            Some(var) => (true, var),
            None => (false, expr),
        };

        let value = resolve(var, ctx, item)
            .with_context(|| format!("Cannot expand '{{{}}}' in '{}'", expr, template))?;

        if raw {
            out.push_str(&value);
        } else {
            out.push_str(&urlencoding::encode(&value));
        }

        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve(var: &str, ctx: &DescribeContext, item: Option<&Value>) -> Result<String> {
    let value = match var {
        "project" => ctx.account_id().to_string(),
        "region" => ctx.region().to_string(),
        "zone" => ctx.zone().context("no zone set; pass --zone")?.to_string(),
        _ => {
            let Some(path) = var.strip_prefix("item.") else {
                bail!("unknown placeholder");
            };
            let item = item.context("no item available")?;
            match value_at(item, path) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => bail!("item has no scalar field '{}'", path),
            }
        }
    };

    if value.is_empty() {
        bail!("value is empty");
    }
    Ok(value)
}
