use thiserror::Error;

/// Errors raised while loading or constructing a project model.
///
/// All of these are fatal at construction time; nothing here is raised mid-run.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("project '{0}' has no tasks")]
    EmptyProject(String),

    #[error("duplicate workflow id: {0}")]
    DuplicateWorkflow(String),

    #[error("duplicate task name '{task}' in workflow '{workflow}'")]
    DuplicateTask { workflow: String, task: String },

    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),

    #[error("dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("task '{0}' has no minimum work amount for occurrence 1")]
    MissingInitialWorkAmount(String),

    #[error("task '{task}' has invalid work amount {amount} for occurrence {occurrence}")]
    InvalidWorkAmount {
        task: String,
        occurrence: u32,
        amount: f64,
    },

    #[error("task '{task}' has invalid {table} probability {probability}")]
    InvalidProbability {
        task: String,
        table: &'static str,
        probability: f64,
    },

    #[error("task '{task}' has {table} probabilities for {key} out of ascending order")]
    UnsortedProbabilities {
        task: String,
        table: &'static str,
        key: String,
    },

    #[error("task '{task}' has {table} probabilities for {key} summing to {sum}")]
    ProbabilityOverflow {
        task: String,
        table: &'static str,
        key: String,
        sum: f64,
    },

    #[error("task '{task}' has invalid delay amount {amount} for occurrence {occurrence}")]
    InvalidDelayAmount {
        task: String,
        occurrence: u32,
        amount: f64,
    },

    #[error("resource '{resource}': {message}")]
    InvalidResource { resource: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}
