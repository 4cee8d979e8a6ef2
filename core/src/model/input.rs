//! Plain-data input contract: the project as handed over by the authoring layer.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

use super::graph::TaskLike;
use super::stochastic::{DelayEntry, ReworkEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default = "default_project_name")]
    pub name: String,
    pub workflows: Vec<WorkflowSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

fn default_project_name() -> String {
    "project".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub id: String,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    /// Originating diagram node, carried through untouched.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Names of tasks in the same workflow.
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub minimum_work_amount: Vec<WorkAmountEntry>,
    #[serde(default)]
    pub rework: Vec<ReworkEntry>,
    #[serde(default)]
    pub delay: Vec<DelayEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkAmountEntry {
    pub occurrence: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub cost_per_time: f64,
    /// Work applied per tick, keyed by task name.
    #[serde(default)]
    pub work_amount_skill: BTreeMap<String, f64>,
    #[serde(default)]
    pub quality_skill: BTreeMap<String, f64>,
}

impl TaskLike for TaskSpec {
    fn id(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[String] {
        &self.predecessors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Toml,
}

impl SpecFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SpecFormat::Json,
            _ => SpecFormat::Toml,
        }
    }
}

pub fn parse_project_spec(
    text: &str,
    format: SpecFormat,
    origin: &str,
) -> Result<ProjectSpec, ModelError> {
    let parsed = match format {
        SpecFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        SpecFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ModelError::Parse {
        path: origin.to_string(),
        message,
    })
}

pub fn load_project_spec(path: &Path) -> Result<ProjectSpec, ModelError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_project_spec(&text, SpecFormat::from_path(path), &path.display().to_string())
}
