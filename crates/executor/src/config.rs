use std::path::PathBuf;
use std::time::Duration;

/// Budget for the compile step of a two-phase recipe.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for the run step; applied independently of the build budget.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Parent directory of every per-request workspace.
    pub work_dir: PathBuf,
    pub build_timeout: Duration,
    pub run_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("coderun"),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }
}
