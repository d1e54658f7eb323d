//! Per-request workspace directories.
//!
//! Each request owns `<work_dir>/<id>/`. Destroy never fails; a workspace
//! dropped without an explicit destroy is removed synchronously.

use std::io;
use std::path::{Path, PathBuf};

use language::{LanguageRecipe, Substitutions};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ExecError, ExecResult};

/// Prefix of every workspace directory and request identifier. The
/// identifier doubles as a Java class name, so it must start with a letter.
const ID_PREFIX: &str = "run_";

/// Per-request scratch directory holding the source file and every artifact
/// its recipe can produce.
///
/// Hand it back to [`WorkspaceManager::destroy`] when done. A workspace that
/// is dropped instead (panic, aborted task) removes its directory
/// synchronously.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    root: PathBuf,
    source_name: String,
    source_path: PathBuf,
    artifact_paths: Vec<PathBuf>,
    armed: bool,
}

impl Workspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Declared artifacts, source file first.
    pub fn artifact_paths(&self) -> &[PathBuf] {
        &self.artifact_paths
    }

    pub fn substitutions(&self) -> Substitutions<'_> {
        Substitutions {
            id: &self.id,
            source: &self.source_name,
            dir: &self.root,
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(id = %self.id, "workspace dropped without destroy, removing");
        if let Err(e) = std::fs::remove_dir_all(&self.root)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(id = %self.id, error = %e, "failed to remove dropped workspace");
        }
    }
}

/// Allocates and reclaims workspaces under one parent directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: PathBuf) -> Self {
        // Run commands reference `{dir}`, which must not depend on the cwd.
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the parent directory and remove workspaces left behind by a
    /// previous process that crashed mid-request.
    pub async fn startup(&self) -> ExecResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let mut swept = 0usize;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_name().to_string_lossy().starts_with(ID_PREFIX) {
                continue;
            }
            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => swept += 1,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "failed to remove stale workspace");
                }
            }
        }

        info!(root = %self.root.display(), swept, "workspace root ready");
        Ok(())
    }

    /// Allocate a fresh directory and write the source file into it.
    ///
    /// The identifier comes from a random UUID, and the directory is created
    /// with `create_dir` so two requests can never end up sharing one.
    pub async fn create(
        &self,
        source_code: &str,
        recipe: &LanguageRecipe,
    ) -> ExecResult<Workspace> {
        let id = format!("{ID_PREFIX}{}", Uuid::new_v4().simple());
        let root = self.root.join(&id);
        let source_name = recipe.source_file_name(&id);
        let source_path = root.join(&source_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ExecError::WorkspaceWrite {
                path: self.root.clone(),
                source,
            })?;
        tokio::fs::create_dir(&root)
            .await
            .map_err(|source| ExecError::WorkspaceWrite {
                path: root.clone(),
                source,
            })?;

        let contents = recipe.prepare_source(source_code, &id);
        if let Err(source) = tokio::fs::write(&source_path, contents.as_bytes()).await {
            if let Err(e) = tokio::fs::remove_dir_all(&root).await {
                warn!(id = %id, error = %e, "failed to remove partial workspace");
            }
            return Err(ExecError::WorkspaceWrite {
                path: source_path,
                source,
            });
        }

        let artifact_paths = recipe.artifact_paths(&Substitutions {
            id: &id,
            source: &source_name,
            dir: &root,
        });

        debug!(id = %id, language = recipe.id, root = %root.display(), "workspace created");

        Ok(Workspace {
            id,
            root,
            source_name,
            source_path,
            artifact_paths,
            armed: true,
        })
    }

    /// Delete every declared artifact, then the directory itself so that
    /// undeclared files the program wrote go too.
    ///
    /// Failures are logged and swallowed: cleanup never changes the result
    /// of the request.
    pub async fn destroy(&self, mut workspace: Workspace) {
        workspace.armed = false;
        let id = workspace.id.as_str();

        for path in &workspace.artifact_paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(id, path = %path.display(), "artifact not produced");
                }
                Err(e) => {
                    warn!(id, path = %path.display(), error = %e, "failed to delete artifact");
                }
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&workspace.root).await {
            warn!(id, error = %e, "failed to delete workspace");
        }

        debug!(id, "workspace destroyed");
    }
}
