use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use executor::{ExecutionRequest, ExecutionResult, Orchestrator};
use language::Registry;
use tracing::warn;

use crate::config;
use crate::error::{ServerError, ServerResult};

/// Shell convention for a process stopped by SIGINT.
const INTERRUPTED: u8 = 130;

#[derive(Args)]
pub struct RunArgs {
    /// Language identifier or alias (e.g. python, js, cpp)
    #[arg(long, short)]
    language: String,
    /// Source file to execute
    file: PathBuf,
    /// Path to coderun.yaml config file
    #[arg(long, short, env = "CODERUN_CONFIG")]
    config: Option<PathBuf>,
}

/// Execute one local file through the same pipeline the HTTP service uses.
///
/// The response text goes to stdout; the exit code is 0 only on success.
/// Ctrl-C abandons the execution, which kills its process group and removes
/// its workspace before the command exits.
pub async fn run_file(args: RunArgs) -> ServerResult<ExitCode> {
    let app_config = config::load_or_default(args.config.as_deref()).await?;
    let source_code = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| ServerError::Config(format!("read {}: {e}", args.file.display())))?;

    let orchestrator = Orchestrator::new(
        Arc::new(Registry::builtin()),
        app_config.execution.executor_config(),
    );
    let request = ExecutionRequest::new(source_code, args.language);
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let Some(result) = execute_or_interrupt(&orchestrator, &request, interrupt).await? else {
        eprintln!("interrupted");
        return Ok(ExitCode::from(INTERRUPTED));
    };

    print!("{}", result.output());
    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "{} ({} phase, {} ms)",
            result.outcome, result.phase, result.duration_ms
        );
        Ok(ExitCode::FAILURE)
    }
}

/// `None` when `interrupt` resolved first. Dropping the pipeline future
/// kills the running process group and removes the workspace.
async fn execute_or_interrupt(
    orchestrator: &Orchestrator,
    request: &ExecutionRequest,
    interrupt: impl Future<Output = ()>,
) -> ServerResult<Option<ExecutionResult>> {
    tokio::select! {
        result = orchestrator.execute(request) => Ok(Some(result?)),
        () = interrupt => {
            warn!(language = %request.language_id, "execution interrupted");
            Ok(None)
        }
    }
}
