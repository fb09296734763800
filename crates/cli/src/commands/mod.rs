use crate::report::{KeyReport, StatusReport};
use clap::Subcommand;
use stamp_task::{ExecutionEngine, Task, TaskDefinition};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Show whether a task is up to date, and why not
    Status {
        /// JSON task manifest
        manifest: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the build cache key and caching decision of a task
    Key {
        /// JSON task manifest
        manifest: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the current state of a task as a successful execution
    Record {
        /// JSON task manifest
        manifest: PathBuf,
    },

    /// Remove the execution history of a task
    Forget {
        /// JSON task manifest
        manifest: PathBuf,
    },
}

impl Commands {
    pub fn execute(self, engine: &ExecutionEngine, out: &mut dyn Write) -> eyre::Result<()> {
        match self {
            Commands::Status { manifest, json } => {
                let task = load_manifest(&manifest)?;
                let report = StatusReport {
                    task: task.identity(),
                    result: engine.is_up_to_date(&task)?,
                };
                print_report(out, &report, json)
            }
            Commands::Key { manifest, json } => {
                let task = load_manifest(&manifest)?;
                let state = engine.caching_state(&task)?;
                print_report(out, &KeyReport::new(task.identity(), &state), json)
            }
            Commands::Record { manifest } => {
                let task = load_manifest(&manifest)?;
                engine.begin(&task)?.commit_success()?;
                info!(task = %task.identity, "execution recorded");
                writeln!(out, "Recorded {}", task.identity)?;
                Ok(())
            }
            Commands::Forget { manifest } => {
                let task = load_manifest(&manifest)?;
                engine.forget(&task.identity)?;
                writeln!(out, "Forgot {}", task.identity)?;
                Ok(())
            }
        }
    }
}

fn load_manifest(path: &Path) -> eyre::Result<TaskDefinition> {
    Ok(TaskDefinition::from_json_file(path)?)
}

fn print_report<R>(out: &mut dyn Write, report: &R, json: bool) -> eyre::Result<()>
where
    R: serde::Serialize + std::fmt::Display,
{
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
    } else {
        write!(out, "{report}")?;
    }
    Ok(())
}
