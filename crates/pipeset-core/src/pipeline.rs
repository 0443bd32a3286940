//! Pipeline configuration model.
//!
//! Every struct keeps the keys it does not recognise in `extra`, so strict
//! parsing can reject them without a second schema.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Keys a struct did not recognise.
pub type UnknownFields = BTreeMap<String, Value>;

/// A pipeline definition: groups, resources, resource types and jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Job groupings shown in the UI.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupConfig>,
    /// Resources jobs get and put.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceConfig>,
    /// Custom resource types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<ResourceTypeConfig>,
    /// Jobs and their build plans.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<JobConfig>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub name: String,
    pub jobs: Vec<String>,
    pub resources: Vec<String>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Opaque configuration handed to the resource type.
    pub source: Option<Value>,
    pub check_every: Option<String>,
    pub tags: Vec<String>,
    pub webhook_token: Option<String>,
    pub public: bool,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTypeConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub source: Option<Value>,
    pub privileged: bool,
    pub tags: Vec<String>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub name: String,
    pub public: bool,
    pub serial: bool,
    pub serial_groups: Vec<String>,
    pub max_in_flight: Option<u32>,
    pub build_logs_to_retain: Option<u32>,
    pub disable_manual_trigger: bool,
    pub interruptible: bool,
    pub plan: Vec<PlanConfig>,
    pub on_success: Option<Box<PlanConfig>>,
    pub on_failure: Option<Box<PlanConfig>>,
    pub on_abort: Option<Box<PlanConfig>>,
    pub ensure: Option<Box<PlanConfig>>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

impl JobConfig {
    /// Every step of the job, hooks included, depth first.
    pub fn steps(&self) -> Vec<&PlanConfig> {
        let mut steps = Vec::new();
        let hooks = [&self.on_success, &self.on_failure, &self.on_abort, &self.ensure];
        for step in self
            .plan
            .iter()
            .chain(hooks.into_iter().flatten().map(|hook| hook.as_ref()))
        {
            step.collect_steps(&mut steps);
        }
        steps
    }

    /// Names of the resources this job gets or puts.
    pub fn resource_names(&self) -> Vec<&str> {
        self.steps()
            .into_iter()
            .filter_map(PlanConfig::resource_name)
            .collect()
    }
}

/// `in_parallel` accepts either a bare list of steps or a block with options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InParallelConfig {
    Steps(Vec<PlanConfig>),
    Block {
        steps: Vec<PlanConfig>,
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        fail_fast: bool,
    },
}

impl InParallelConfig {
    pub fn steps(&self) -> &[PlanConfig] {
        match self {
            InParallelConfig::Steps(steps) => steps,
            InParallelConfig::Block { steps, .. } => steps,
        }
    }
}

/// One step of a build plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub get: Option<String>,
    pub put: Option<String>,
    pub task: Option<String>,
    #[serde(rename = "do")]
    pub do_steps: Option<Vec<PlanConfig>>,
    pub aggregate: Option<Vec<PlanConfig>>,
    pub in_parallel: Option<InParallelConfig>,
    #[serde(rename = "try")]
    pub try_step: Option<Box<PlanConfig>>,

    /// Resource a `get`/`put` refers to when the step name is an alias.
    pub resource: Option<String>,
    pub passed: Vec<String>,
    pub trigger: bool,
    pub params: Option<Value>,
    pub get_params: Option<Value>,
    pub version: Option<Value>,
    pub inputs: Option<Value>,

    pub file: Option<String>,
    pub config: Option<Value>,
    pub image: Option<String>,
    pub privileged: bool,
    pub input_mapping: Option<BTreeMap<String, String>>,
    pub output_mapping: Option<BTreeMap<String, String>>,

    pub tags: Vec<String>,
    pub timeout: Option<String>,
    pub attempts: Option<u32>,
    pub on_success: Option<Box<PlanConfig>>,
    pub on_failure: Option<Box<PlanConfig>>,
    pub on_abort: Option<Box<PlanConfig>>,
    pub ensure: Option<Box<PlanConfig>>,

    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: UnknownFields,
}

impl PlanConfig {
    /// The resource a `get` or `put` step acts on.
    pub fn resource_name(&self) -> Option<&str> {
        if self.get.is_none() && self.put.is_none() {
            return None;
        }
        self.resource
            .as_deref()
            .or(self.get.as_deref())
            .or(self.put.as_deref())
    }

    /// Human readable step label, used in validation messages.
    pub fn label(&self) -> String {
        if let Some(name) = &self.get {
            format!("get {}", name)
        } else if let Some(name) = &self.put {
            format!("put {}", name)
        } else if let Some(name) = &self.task {
            format!("task {}", name)
        } else if self.do_steps.is_some() {
            "do".to_string()
        } else if self.aggregate.is_some() {
            "aggregate".to_string()
        } else if self.in_parallel.is_some() {
            "in_parallel".to_string()
        } else if self.try_step.is_some() {
            "try".to_string()
        } else {
            "step".to_string()
        }
    }

    fn collect_steps<'a>(&'a self, out: &mut Vec<&'a PlanConfig>) {
        out.push(self);

        let nested = self
            .do_steps
            .iter()
            .flatten()
            .chain(self.aggregate.iter().flatten())
            .chain(self.in_parallel.iter().flat_map(|p| p.steps().iter()));
        for step in nested {
            step.collect_steps(out);
        }

        let boxed = [
            &self.try_step,
            &self.on_success,
            &self.on_failure,
            &self.on_abort,
            &self.ensure,
        ];
        for step in boxed.into_iter().flatten() {
            step.collect_steps(out);
        }
    }
}

/// A non-fatal finding about a config, from local validation or the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWarning {
    #[serde(rename = "type")]
    pub warning_type: String,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(warning_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            warning_type: warning_type.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.warning_type, self.message)
    }
}
