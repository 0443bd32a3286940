//! Template variable sources.
//!
//! Variables come from three places:
//! - `name=value` flags, always strings
//! - `name=<yaml>` flags, parsed as YAML
//! - YAML files mapping names to values

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{ConfigError, ConfigResult, TemplateError};

/// A set of bindings from variable name to value.
pub type Variables = BTreeMap<String, Value>;

/// A `name=value` variable. The value is taken literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePair {
    pub name: String,
    pub value: String,
}

impl VariablePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for VariablePair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = split_pair(s)?;
        Ok(Self::new(name, value))
    }
}

/// A `name=<yaml>` variable. The value is parsed as YAML, so
/// `ports=[80, 443]` binds a list.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlVariablePair {
    pub name: String,
    pub value: Value,
}

impl YamlVariablePair {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl FromStr for YamlVariablePair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = split_pair(s)?;
        let value = serde_yaml::from_str(raw)?;
        Ok(Self::new(name, value))
    }
}

fn split_pair(s: &str) -> ConfigResult<(&str, &str)> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(ConfigError::InvalidVariable(s.to_string())),
    }
}

/// All variable sources for one resolution.
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    pub vars: Vec<VariablePair>,
    pub yaml_vars: Vec<YamlVariablePair>,
    pub var_files: Vec<PathBuf>,
}

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push(VariablePair::new(name, value));
        self
    }

    pub fn with_yaml_var(mut self, name: impl Into<String>, value: Value) -> Self {
        self.yaml_vars.push(YamlVariablePair::new(name, value));
        self
    }

    pub fn with_var_file(mut self, path: impl AsRef<Path>) -> Self {
        self.var_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Read every variable file, in listed order.
    pub fn load_files(&self) -> ConfigResult<Vec<Vec<u8>>> {
        self.var_files
            .iter()
            .map(|path| {
                std::fs::read(path).map_err(|source| ConfigError::VarsFile {
                    path: path.display().to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Inline flags as one binding set; YAML flags win ties.
    pub fn flag_variables(&self) -> Variables {
        let mut vars = self.string_variables();
        for pair in &self.yaml_vars {
            vars.insert(pair.name.clone(), pair.value.clone());
        }
        vars
    }

    /// The `name=value` flags only.
    pub fn string_variables(&self) -> Variables {
        self.vars
            .iter()
            .map(|pair| (pair.name.clone(), Value::String(pair.value.clone())))
            .collect()
    }
}

/// Parse a variable file payload. An empty payload binds nothing.
pub fn parse_variables(payload: &[u8]) -> Result<Variables, TemplateError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(Variables::new());
    }
    serde_yaml::from_slice(payload).map_err(TemplateError::Variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_variable_pair() {
        let pair: VariablePair = "image=busybox:latest".parse().unwrap();
        assert_eq!(pair, VariablePair::new("image", "busybox:latest"));

        let pair: VariablePair = "query=a=b".parse().unwrap();
        assert_eq!(pair.value, "a=b");
    }

    #[test]
    fn test_parse_variable_pair_requires_name() {
        assert!(matches!(
            "=value".parse::<VariablePair>(),
            Err(ConfigError::InvalidVariable(_))
        ));
        assert!(matches!(
            "novalue".parse::<VariablePair>(),
            Err(ConfigError::InvalidVariable(_))
        ));
    }

    #[test]
    fn test_parse_yaml_variable_pair() {
        let pair: YamlVariablePair = "ports=[80, 443]".parse().unwrap();
        let ports = pair.value.as_sequence().unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].as_u64(), Some(80));
    }

    #[test]
    fn test_yaml_flags_win_ties() {
        let vars = TemplateVariables::new()
            .with_var("replicas", "one")
            .with_yaml_var("replicas", Value::from(3));

        let flags = vars.flag_variables();
        assert_eq!(flags["replicas"].as_u64(), Some(3));
        assert_eq!(vars.string_variables()["replicas"].as_str(), Some("one"));
    }

    #[test]
    fn test_load_files_reports_path() {
        let vars = TemplateVariables::new().with_var_file("/nonexistent/vars.yml");
        let err = vars.load_files().unwrap_err();
        assert!(
            err.to_string()
                .starts_with("could not read template variables file (/nonexistent/vars.yml)")
        );
    }

    #[test]
    fn test_load_files_in_order() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "a: 1").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, "b: 2").unwrap();

        let vars = TemplateVariables::new()
            .with_var_file(first.path())
            .with_var_file(second.path());
        let payloads = vars.load_files().unwrap();
        assert_eq!(payloads, vec![b"a: 1\n".to_vec(), b"b: 2\n".to_vec()]);
    }

    #[test]
    fn test_parse_empty_variables() {
        assert!(parse_variables(b"").unwrap().is_empty());
        assert!(parse_variables(b"\n  \n").unwrap().is_empty());
    }
}
