//! YAML extraction from LLM replies.

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::error::{FlowError, Result};

/// Returns the body of the first fenced block, preferring a block tagged
/// `yaml`. A reply without fences is taken whole.
pub fn extract_yaml_block(reply: &str) -> &str {
    if let Some(body) = fenced_after(reply, "```yaml") {
        return body;
    }
    if let Some(body) = fenced_after(reply, "```") {
        return body;
    }
    reply.trim()
}

fn fenced_after<'a>(reply: &'a str, opener: &str) -> Option<&'a str> {
    let start = reply.find(opener)? + opener.len();
    let rest = &reply[start..];
    // drop the rest of the opener line, e.g. a language tag
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim_matches(|c| c == '\n' || c == '\r'))
}

pub fn parse_yaml_value(reply: &str) -> Result<Value> {
    let block = extract_yaml_block(reply);
    serde_yaml::from_str(block).map_err(|err| FlowError::Parse(format!("invalid YAML: {err}")))
}

/// Parses the block and deserializes the mapping under `section`, or the
/// whole document when the reply omits the wrapper key.
pub fn parse_yaml_section<T: DeserializeOwned>(reply: &str, section: &str) -> Result<T> {
    let mut document = parse_yaml_value(reply)?;
    let value = match document.as_mapping_mut().and_then(|map| map.remove(section)) {
        Some(inner) => inner,
        None => document,
    };
    if value.is_null() {
        return Err(FlowError::Parse(format!("`{section}` is empty")));
    }
    serde_yaml::from_value(value)
        .map_err(|err| FlowError::Parse(format!("unexpected `{section}` shape: {err}")))
}
