use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ReportError;
use crate::model::ProjectModel;
use crate::montecarlo::ArtifactSink;

use super::{write_run_artifacts, ReportOptions};

/// Writes `run-<n>.csv` and `run-<n>.log` into one directory.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    dir: PathBuf,
    opts: ReportOptions,
}

impl FsArtifactSink {
    pub fn new(dir: PathBuf, opts: ReportOptions) -> Self {
        Self { dir, opts }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    fn name(&self) -> &str {
        "fs"
    }

    async fn write_run(&self, run: usize, project: &ProjectModel) -> Result<(), ReportError> {
        write_run_artifacts(project, &self.dir, run, &self.opts).await
    }
}
