use std::path::PathBuf;

use elt_config::shared::PipelineConfig;
use tokio::process::Command;
use tracing::{info, warn};

use crate::bail;
use crate::error::{EltResult, ErrorKind};
use crate::pipeline::PipelineEventListener;
use crate::types::PipelineEvent;

/// Runs the external transformation (`dbt run` by default) over the staging tables.
///
/// Acts as a [`PipelineEventListener`] reacting to completed replications, and can also be run
/// on its own.
#[derive(Debug, Clone)]
pub struct TransformTrigger {
    enabled: bool,
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl TransformTrigger {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            enabled: config.transform.enabled,
            program: config.transform.program.clone(),
            args: config.transform.args.clone(),
            working_dir: config.resolve_path(&config.transform.working_dir),
        }
    }

    /// Runs the program in the working directory and waits for it to exit.
    ///
    /// Output is inherited from the current process. Exiting with a non-zero status is an
    /// [`ErrorKind::TransformFailed`] error.
    pub async fn run(&self) -> EltResult<()> {
        if !self.enabled {
            info!("transform is disabled, skipping");
            return Ok(());
        }

        if !tokio::fs::metadata(&self.working_dir)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
        {
            bail!(
                ErrorKind::MissingInput,
                "Transform working directory not found",
                self.working_dir.display()
            );
        }

        info!(
            program = %self.program,
            args = ?self.args,
            working_dir = %self.working_dir.display(),
            "running transform"
        );

        let status = match Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .status()
            .await
        {
            Ok(status) => status,
            Err(err) => {
                bail!(
                    ErrorKind::IoError,
                    "Transform program could not be started",
                    format!("{}: {err}", self.program)
                );
            }
        };

        if !status.success() {
            let detail = match status.code() {
                Some(code) => format!("{} exited with status {code}", self.program),
                None => format!("{} was terminated by a signal", self.program),
            };
            warn!(%detail, "transform failed");

            bail!(ErrorKind::TransformFailed, "Transform program failed", detail);
        }

        info!(program = %self.program, "transform completed");

        Ok(())
    }
}

impl PipelineEventListener for TransformTrigger {
    async fn on_event(&self, event: &PipelineEvent) -> EltResult<()> {
        match event {
            PipelineEvent::LoadCompleted(_) => Ok(()),
            PipelineEvent::ReplicationCompleted(report) => {
                info!(
                    tables = report.tables.len(),
                    "replication completed, triggering transform"
                );
                self.run().await
            }
        }
    }
}
