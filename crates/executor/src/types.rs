use std::fmt;
use std::time::Duration;

use crate::error::ExecError;
use crate::runner::{ProcessOutput, RunOutcome};

/// Source text plus the language it should be executed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language_id: String,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>, language_id: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            language_id: language_id.into(),
        }
    }
}

/// Classification of a request that got as far as a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    CompileFailure,
    RuntimeFailure,
    Timeout,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::CompileFailure => "compile_failure",
            Self::RuntimeFailure => "runtime_failure",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline phase that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Run => f.write_str("run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub outcome: Outcome,
    pub phase: Phase,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never started or was killed by the timeout.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    /// Runner-level explanation: spawn error, exit status, timeout marker.
    pub diagnostic: Option<String>,
}

impl ExecutionResult {
    /// Classify a finished process. The orchestrator never classifies a
    /// clean build; it moves straight on to the run phase.
    pub(crate) fn from_run(phase: Phase, outcome: RunOutcome, timeout: Duration) -> Self {
        match outcome {
            RunOutcome::Exited { exit_code, output } => {
                let (outcome, diagnostic) = match (exit_code, phase) {
                    (0, _) => (Outcome::Success, None),
                    (code, Phase::Build) => (
                        Outcome::CompileFailure,
                        Some(format!("build exited with code {code}")),
                    ),
                    (code, Phase::Run) => (
                        Outcome::RuntimeFailure,
                        Some(format!("process exited with code {code}")),
                    ),
                };
                Self::captured(outcome, phase, output, Some(exit_code), diagnostic)
            }
            RunOutcome::TimedOut { output } => Self::captured(
                Outcome::Timeout,
                phase,
                output,
                None,
                Some(timeout_marker(timeout)),
            ),
        }
    }

    /// The process for `phase` could not be started or waited on.
    pub(crate) fn not_started(phase: Phase, error: &ExecError) -> Self {
        let outcome = match phase {
            Phase::Build => Outcome::CompileFailure,
            Phase::Run => Outcome::RuntimeFailure,
        };
        Self {
            outcome,
            phase,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            duration_ms: 0,
            diagnostic: Some(error.to_string()),
        }
    }

    fn captured(
        outcome: Outcome,
        phase: Phase,
        output: ProcessOutput,
        exit_code: Option<i32>,
        diagnostic: Option<String>,
    ) -> Self {
        Self {
            outcome,
            phase,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            duration_ms: 0,
            diagnostic,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.outcome == Outcome::Timeout
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Text shown to the caller.
    ///
    /// Stdout on success. On failure the compiler or interpreter stderr is
    /// returned verbatim when there is any; otherwise the captured stdout is
    /// followed by the diagnostic. A timeout always ends with its marker.
    pub fn output(&self) -> String {
        match self.outcome {
            Outcome::Success => self.stdout.clone(),
            Outcome::CompileFailure | Outcome::RuntimeFailure if !self.stderr.is_empty() => {
                self.stderr.clone()
            }
            _ => {
                let primary = if self.stderr.is_empty() {
                    &self.stdout
                } else {
                    &self.stderr
                };
                join_lines(primary, self.diagnostic.as_deref())
            }
        }
    }
}

pub(crate) fn timeout_marker(timeout: Duration) -> String {
    format!("Execution timed out after {} ms", timeout.as_millis())
}

fn join_lines(primary: &str, trailer: Option<&str>) -> String {
    let mut text = primary.to_string();
    if let Some(trailer) = trailer {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(trailer);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            elapsed: Duration::from_millis(5),
        }
    }

    fn exited(code: i32, stdout: &str, stderr: &str) -> RunOutcome {
        RunOutcome::Exited {
            exit_code: code,
            output: output(stdout, stderr),
        }
    }

    const LIMIT: Duration = Duration::from_secs(10);

    #[test]
    fn success_returns_stdout_even_with_stderr() {
        let result = ExecutionResult::from_run(Phase::Run, exited(0, "hi\n", "warning\n"), LIMIT);
        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output(), "hi\n");
    }

    #[test]
    fn runtime_failure_prefers_stderr() {
        let result = ExecutionResult::from_run(
            Phase::Run,
            exited(1, "partial\n", "SyntaxError: bad\n"),
            LIMIT,
        );
        assert_eq!(result.outcome, Outcome::RuntimeFailure);
        assert_eq!(result.output(), "SyntaxError: bad\n");
    }

    #[test]
    fn runtime_failure_without_stderr_explains_exit() {
        let result = ExecutionResult::from_run(Phase::Run, exited(3, "partial", ""), LIMIT);
        assert_eq!(result.output(), "partial\nprocess exited with code 3");
    }

    #[test]
    fn compile_failure_is_compiler_stderr() {
        let result = ExecutionResult::from_run(
            Phase::Build,
            exited(1, "", "main.cpp:1: error: expected ';'\n"),
            LIMIT,
        );
        assert_eq!(result.outcome, Outcome::CompileFailure);
        assert_eq!(result.phase, Phase::Build);
        assert_eq!(result.output(), "main.cpp:1: error: expected ';'\n");
    }

    #[test]
    fn timeout_carries_marker_after_stderr() {
        let result = ExecutionResult::from_run(
            Phase::Run,
            RunOutcome::TimedOut {
                output: output("", "still going"),
            },
            LIMIT,
        );
        assert!(result.timed_out());
        assert_eq!(result.exit_code, None);
        assert_eq!(result.output(), "still going\nExecution timed out after 10000 ms");
    }

    #[test]
    fn timeout_without_stderr_falls_back_to_stdout() {
        let result = ExecutionResult::from_run(
            Phase::Run,
            RunOutcome::TimedOut {
                output: output("tick\ntick", ""),
            },
            LIMIT,
        );
        assert_eq!(result.output(), "tick\ntick\nExecution timed out after 10000 ms");
    }

    #[test]
    fn timeout_without_output_is_just_marker() {
        let result = ExecutionResult::from_run(
            Phase::Run,
            RunOutcome::TimedOut {
                output: output("", ""),
            },
            Duration::from_millis(250),
        );
        assert_eq!(result.output(), "Execution timed out after 250 ms");
    }

    #[test]
    fn not_started_uses_error_text() {
        let err = ExecError::Spawn {
            command: "g++ a.cpp".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let result = ExecutionResult::not_started(Phase::Build, &err);
        assert_eq!(result.outcome, Outcome::CompileFailure);
        assert!(result.output().starts_with("failed to start `g++ a.cpp`"));
    }

    #[test]
    fn outcome_names_are_snake_case() {
        assert_eq!(Outcome::CompileFailure.to_string(), "compile_failure");
        assert_eq!(Outcome::Timeout.as_str(), "timeout");
        assert_eq!(Phase::Build.to_string(), "build");
    }
}
