mod config;
mod error;
mod orchestrator;
mod prerequisites;
mod process;
mod runner;
mod types;
mod workspace;

pub use config::{DEFAULT_BUILD_TIMEOUT, DEFAULT_RUN_TIMEOUT, ExecutorConfig};
pub use error::{ExecError, ExecResult};
pub use orchestrator::{Orchestrator, Stage};
pub use prerequisites::{ToolchainStatus, check_recipe, check_toolchains};
pub use runner::{ProcessOutput, RunOutcome, run_process};
pub use types::{ExecutionRequest, ExecutionResult, Outcome, Phase};
pub use workspace::{Workspace, WorkspaceManager};
