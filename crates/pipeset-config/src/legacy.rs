//! Legacy `{{name}}` templates.
//!
//! This is a plain text substitution: each `{{name}}` is replaced by the JSON
//! rendering of the bound value, so strings come out quoted. Sources merge in
//! order with later ones overriding earlier ones.

use regex::bytes::{Captures, Regex};
use std::sync::LazyLock;

use serde_yaml::Value;

use crate::TemplateError;
use crate::template::scalar_text;
use crate::variables::Variables;

static LEGACY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([-\w\p{L}]+)\}\}").unwrap());

/// Whether `content` contains any legacy template markers.
pub fn is_present(content: &[u8]) -> bool {
    LEGACY_REGEX.is_match(content)
}

/// Merge variable sets; later sets override same-named earlier entries.
pub fn merge<'a, I>(sources: I) -> Variables
where
    I: IntoIterator<Item = &'a Variables>,
{
    let mut merged = Variables::new();
    for source in sources {
        merged.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Flatten file-sourced values to strings, so `port: 8080` renders as
/// `"8080"`. Lists and maps are rejected.
pub fn stringify(vars: Variables) -> Result<Variables, TemplateError> {
    vars.into_iter()
        .map(|(name, value)| {
            let text = scalar_text(&name, &value)?;
            Ok((name, Value::String(text)))
        })
        .collect()
}

/// Substitute every `{{name}}` in `content`.
///
/// A name missing from `vars` is an error unless `allow_empty` is set, in
/// which case it renders as an empty string.
pub fn evaluate(
    content: &[u8],
    vars: &Variables,
    allow_empty: bool,
) -> Result<Vec<u8>, TemplateError> {
    let mut out = Vec::with_capacity(content.len());
    let mut last = 0;

    for caps in LEGACY_REGEX.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.extend_from_slice(&content[last..whole.start()]);
        out.extend_from_slice(&render(&caps, vars, allow_empty)?);
        last = whole.end();
    }

    out.extend_from_slice(&content[last..]);
    Ok(out)
}

fn render(
    caps: &Captures<'_>,
    vars: &Variables,
    allow_empty: bool,
) -> Result<Vec<u8>, TemplateError> {
    let name = String::from_utf8_lossy(&caps[1]).into_owned();

    match vars.get(&name) {
        Some(value) => {
            serde_json::to_vec(value).map_err(|source| TemplateError::Value { name, source })
        }
        None if allow_empty => Ok(b"\"\"".to_vec()),
        None => Err(TemplateError::UnboundVariable(name)),
    }
}
