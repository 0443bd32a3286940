//! `((name))` templates.
//!
//! Unlike the legacy syntax these are resolved on the parsed YAML tree:
//! - a scalar that is exactly `((name))` is replaced by the bound value,
//!   keeping its YAML type (lists and maps included)
//! - a reference embedded in a longer string interpolates the value as text
//! - `((name.key))` looks up `key` inside a mapping value
//!
//! Bindings are looked up tier by tier; the first tier that has the name
//! wins. Names no tier binds are left in place so the server's credential
//! manager can resolve them later.

use regex::Regex;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;

use crate::TemplateError;
use crate::variables::Variables;

static VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\((!?[-/.\w\p{L}]+)\)\)").unwrap());

/// Whether `content` contains any `((name))` references.
pub fn is_present(content: &[u8]) -> bool {
    VAR_REGEX.is_match(&String::from_utf8_lossy(content))
}

/// Resolve every `((name))` reference in `content` against `tiers`.
pub fn evaluate(content: &[u8], tiers: &[Variables]) -> Result<Vec<u8>, TemplateError> {
    if !is_present(content) {
        return Ok(content.to_vec());
    }

    let document: Value = serde_yaml::from_slice(content).map_err(TemplateError::Parse)?;
    let resolver = Resolver { tiers };
    let resolved = resolver.resolve(document)?;

    serde_yaml::to_string(&resolved)
        .map(String::into_bytes)
        .map_err(TemplateError::Render)
}

struct Resolver<'a> {
    tiers: &'a [Variables],
}

impl Resolver<'_> {
    fn resolve(&self, value: Value) -> Result<Value, TemplateError> {
        match value {
            Value::String(s) => self.resolve_string(s),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut resolved = Mapping::with_capacity(mapping.len());
                for (key, value) in mapping {
                    resolved.insert(self.resolve(key)?, self.resolve(value)?);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                Ok(Value::Tagged(Box::new(TaggedValue {
                    tag,
                    value: self.resolve(value)?,
                })))
            }
            other => Ok(other),
        }
    }

    fn resolve_string(&self, s: String) -> Result<Value, TemplateError> {
        let whole_reference = VAR_REGEX
            .captures(&s)
            .filter(|caps| caps.get(0).map(|m| m.range()) == Some(0..s.len()))
            .map(|caps| caps[1].to_string());
        if let Some(name) = whole_reference {
            return Ok(self.lookup(&name)?.unwrap_or(Value::String(s)));
        }

        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        for caps in VAR_REGEX.captures_iter(&s) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&s[last..whole.start()]);
            match self.lookup(&caps[1])? {
                Some(value) => out.push_str(&scalar_text(&caps[1], &value)?),
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&s[last..]);

        Ok(Value::String(out))
    }

    fn lookup(&self, reference: &str) -> Result<Option<Value>, TemplateError> {
        let name = reference.trim_start_matches('!');
        let mut path = name.split('.');
        let Some(head) = path.next() else {
            return Ok(None);
        };

        let Some(mut value) = self.tiers.iter().find_map(|tier| tier.get(head)) else {
            return Ok(None);
        };

        for key in path {
            value = value
                .as_mapping()
                .and_then(|mapping| mapping.get(key))
                .ok_or_else(|| TemplateError::MissingKey {
                    name: name.to_string(),
                    key: key.to_string(),
                })?;
        }

        Ok(Some(value.clone()))
    }
}

/// Text form of a scalar value; null is empty.
pub(crate) fn scalar_text(name: &str, value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(TemplateError::NonScalar(name.to_string())),
    }
}
