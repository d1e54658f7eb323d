use std::path::{Path, PathBuf};
use std::time::Duration;

use executor::{DEFAULT_BUILD_TIMEOUT, DEFAULT_RUN_TIMEOUT, ExecutorConfig};
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Parent of every per-request workspace directory.
    pub work_dir: PathBuf,
    pub build_timeout_ms: u64,
    pub run_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        let defaults = ExecutorConfig::default();
        Self {
            work_dir: defaults.work_dir,
            build_timeout_ms: DEFAULT_BUILD_TIMEOUT.as_millis() as u64,
            run_timeout_ms: DEFAULT_RUN_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ExecutionConfig {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            work_dir: self.work_dir.clone(),
            build_timeout: Duration::from_millis(self.build_timeout_ms),
            run_timeout: Duration::from_millis(self.run_timeout_ms),
        }
    }
}

/// Load and validate a config from a YAML file.
///
/// Relative paths in the config are resolved against the config file's parent directory.
pub async fn load(path: &Path) -> ServerResult<AppConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ServerError::Config(format!("read {}: {e}", path.display())))?;
    let mut config = if content.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml_ng::from_str::<AppConfig>(&content)
            .map_err(|e| ServerError::Config(format!("parse {}: {e}", path.display())))?
    };
    if let Some(config_dir) = path.parent() {
        config.resolve_relative_paths(config_dir);
    }
    config.validate()?;
    Ok(config)
}

/// [`load`] when a path is given, built-in defaults otherwise.
pub async fn load_or_default(path: Option<&Path>) -> ServerResult<AppConfig> {
    match path {
        Some(path) => load(path).await,
        None => Ok(AppConfig::default()),
    }
}

impl AppConfig {
    fn resolve_relative_paths(&mut self, config_dir: &Path) {
        let work_dir = &mut self.execution.work_dir;
        if work_dir.is_relative() {
            *work_dir = config_dir.join(&*work_dir);
        }
    }

    /// Checked again after CLI overrides are applied.
    pub fn validate(&self) -> ServerResult<()> {
        if self.server.host.is_empty() {
            return Err(ServerError::Config("server.host must not be empty".into()));
        }
        if self.execution.build_timeout_ms == 0 {
            return Err(ServerError::Config(
                "execution.build_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.execution.run_timeout_ms == 0 {
            return Err(ServerError::Config(
                "execution.run_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.execution.work_dir.as_os_str().is_empty() {
            return Err(ServerError::Config("execution.work_dir must not be empty".into()));
        }
        Ok(())
    }
}
