//! The execution pipeline: lookup, workspace, build, run, cleanup.
//!
//! Cleanup runs on every path that created a workspace, including when the
//! `execute` future is dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use language::{LanguageRecipe, Registry};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{ExecError, ExecResult};
use crate::runner::{RunOutcome, run_process};
use crate::types::{ExecutionRequest, ExecutionResult, Outcome, Phase};
use crate::workspace::{Workspace, WorkspaceManager};

/// Lifecycle of a single request.
///
/// Happy path: `Received → Validated → WorkspaceReady → [Compiling →]
/// Running → Collected → Cleaned → Responded`. `UnsupportedLanguage` and
/// `WriteFailed` happen before a workspace exists; the remaining failure
/// stages still pass through `Cleaned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    WorkspaceReady,
    Compiling,
    Running,
    Collected,
    Cleaned,
    Responded,
    UnsupportedLanguage,
    WriteFailed,
    CompileFailed,
    TimedOut,
    RuntimeFailed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Validated => "VALIDATED",
            Self::WorkspaceReady => "WORKSPACE_READY",
            Self::Compiling => "COMPILING",
            Self::Running => "RUNNING",
            Self::Collected => "COLLECTED",
            Self::Cleaned => "CLEANED",
            Self::Responded => "RESPONDED",
            Self::UnsupportedLanguage => "UNSUPPORTED_LANGUAGE",
            Self::WriteFailed => "WRITE_FAILED",
            Self::CompileFailed => "COMPILE_FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::RuntimeFailed => "RUNTIME_FAILED",
        }
    }

    /// Stage reached once `outcome` has been collected.
    pub fn after(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::Collected,
            Outcome::CompileFailure => Self::CompileFailed,
            Outcome::RuntimeFailure => Self::RuntimeFailed,
            Outcome::Timeout => Self::TimedOut,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(run_id: &str, stage: Stage) {
    debug!(run_id, stage = %stage, "pipeline stage");
}

/// Sequences lookup, workspace, build, run and cleanup for each request.
///
/// Holds no per-request state: any number of `execute` calls may run at
/// once against the same orchestrator.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<Registry>,
    workspaces: WorkspaceManager,
    config: ExecutorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, config: ExecutorConfig) -> Self {
        let workspaces = WorkspaceManager::new(config.work_dir.clone());
        Self {
            registry,
            workspaces,
            config,
        }
    }

    /// Prepare the work directory. Call once before serving requests.
    pub async fn startup(&self) -> ExecResult<()> {
        self.workspaces.startup().await
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Execute one request end to end.
    ///
    /// Only an unknown language or a workspace that cannot be written is an
    /// `Err`; build errors, runtime errors, and timeouts are all reported
    /// through the returned [`ExecutionResult`]. Once a workspace exists it
    /// is destroyed before this returns, whatever the outcome.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecResult<ExecutionResult> {
        let started = Instant::now();
        let language = request.language_id.as_str();
        debug!(language, stage = %Stage::Received, "pipeline stage");

        let recipe = match self.registry.lookup(language) {
            Ok(recipe) => recipe,
            Err(e) => {
                info!(language, stage = %Stage::UnsupportedLanguage, "rejected request");
                return Err(e.into());
            }
        };
        debug!(language = recipe.id, stage = %Stage::Validated, "pipeline stage");

        let workspace = match self.workspaces.create(&request.source_code, recipe).await {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(language = recipe.id, stage = %Stage::WriteFailed, error = %e, "workspace creation failed");
                return Err(e);
            }
        };
        let run_id = workspace.id().to_string();
        enter(&run_id, Stage::WorkspaceReady);
        info!(run_id = %run_id, language = recipe.id, "execution started");

        let mut result = self.run_phases(recipe, &workspace).await;
        enter(&run_id, Stage::after(result.outcome));

        self.workspaces.destroy(workspace).await;
        enter(&run_id, Stage::Cleaned);

        result.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            language = recipe.id,
            outcome = %result.outcome,
            phase = %result.phase,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "execution finished"
        );
        enter(&run_id, Stage::Responded);
        Ok(result)
    }

    /// Build (when the recipe has a build step), then run. A build that does
    /// not exit cleanly decides the result and the run phase is skipped.
    async fn run_phases(&self, recipe: &LanguageRecipe, workspace: &Workspace) -> ExecutionResult {
        let vars = workspace.substitutions();

        if let Some(build) = recipe.build_command(&vars) {
            enter(workspace.id(), Stage::Compiling);
            let timeout = self.config.build_timeout;
            match run_process(&build, workspace.root(), timeout).await {
                Ok(RunOutcome::Exited { exit_code: 0, .. }) => {}
                Ok(outcome) => return ExecutionResult::from_run(Phase::Build, outcome, timeout),
                Err(e) => return self.not_started(workspace, Phase::Build, &e),
            }
        }

        enter(workspace.id(), Stage::Running);
        let run = recipe.run_command(&vars);
        let timeout = self.config.run_timeout;
        match run_process(&run, workspace.root(), timeout).await {
            Ok(outcome) => ExecutionResult::from_run(Phase::Run, outcome, timeout),
            Err(e) => self.not_started(workspace, Phase::Run, &e),
        }
    }

    fn not_started(&self, workspace: &Workspace, phase: Phase, error: &ExecError) -> ExecutionResult {
        warn!(run_id = workspace.id(), phase = %phase, error = %error, "process could not be run");
        ExecutionResult::not_started(phase, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_state_machine() {
        assert_eq!(Stage::WorkspaceReady.to_string(), "WORKSPACE_READY");
        assert_eq!(Stage::UnsupportedLanguage.as_str(), "UNSUPPORTED_LANGUAGE");
    }

    #[test]
    fn failures_map_to_failure_stages() {
        assert_eq!(Stage::after(Outcome::Success), Stage::Collected);
        assert_eq!(Stage::after(Outcome::CompileFailure), Stage::CompileFailed);
        assert_eq!(Stage::after(Outcome::RuntimeFailure), Stage::RuntimeFailed);
        assert_eq!(Stage::after(Outcome::Timeout), Stage::TimedOut);
    }

    #[tokio::test]
    async fn unsupported_language_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig {
            work_dir: dir.path().join("work"),
            ..ExecutorConfig::default()
        };
        let orchestrator = Orchestrator::new(Arc::new(Registry::builtin()), config);

        let err = orchestrator
            .execute(&ExecutionRequest::new("x", "brainfuck"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::UnsupportedLanguage(_)));
        assert!(!dir.path().join("work").exists());
    }
}
