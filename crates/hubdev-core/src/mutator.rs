//! Reversible line-filter edits of on-disk config files

use crate::{CoreError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tomcat connector attributes that force HTTPS on port 443. The dev proxy
/// owns 443, so the webapp has to serve plain HTTP.
pub const HTTPS_CONNECTOR_ATTRIBUTES: [&str; 2] = ["scheme=\"https\"", "proxyPort=\"443\""];

#[derive(Debug, Default)]
struct MutationState {
    original: Option<String>,
    modified: bool,
}

/// A config file under temporary modification.
///
/// `apply` captures the original content once and writes a filtered version;
/// `restore` puts the original back. Restore is idempotent and serialized by
/// an internal lock, so the pipeline and an interrupt handler can both call it.
///
/// The edit runs on its own task holding that lock: dropping an `apply`
/// future never leaves filtered content on disk that `restore` doesn't know
/// about.
#[derive(Debug)]
pub struct ConfigMutator {
    path: PathBuf,
    state: Arc<Mutex<MutationState>>,
}

impl ConfigMutator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(MutationState::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_modified(&self) -> bool {
        self.state.lock().await.modified
    }

    /// Keep only lines for which `keep` returns true and write the result back.
    /// Returns the filtered content. A mutator applies at most once.
    ///
    /// The original is recorded before the filtered content is written. A
    /// failed write puts the original back.
    pub async fn apply<F>(&self, keep: F) -> Result<String>
    where
        F: Fn(&str) -> bool + Send + 'static,
    {
        let mut state = self.state.clone().lock_owned().await;
        if state.original.is_some() {
            return Err(CoreError::InvalidState(format!(
                "{} has already been modified",
                self.path.display()
            )));
        }

        let path = self.path.clone();
        let edit = tokio::spawn(async move {
            let original = tokio::fs::read_to_string(&path).await?;
            let filtered = filter_lines(&original, keep);
            let original_len = original.len();
            state.original = Some(original);
            state.modified = true;

            if let Err(e) = tokio::fs::write(&path, &filtered).await {
                let rollback = match state.original.as_deref() {
                    Some(original) => tokio::fs::write(&path, original).await,
                    None => Ok(()),
                };
                match rollback {
                    Ok(()) => state.modified = false,
                    Err(rollback) => {
                        tracing::error!("Failed to roll back {}: {}", path.display(), rollback)
                    }
                }
                return Err(CoreError::Io(e));
            }

            tracing::debug!(
                "Modified {} ({} -> {} bytes)",
                path.display(),
                original_len,
                filtered.len()
            );
            Ok::<_, CoreError>(filtered)
        });

        edit.await.map_err(|e| {
            CoreError::InvalidState(format!("editing {} failed: {}", self.path.display(), e))
        })?
    }

    /// Write the original content back. Returns false when there was nothing
    /// to restore.
    pub async fn restore(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.modified {
            return Ok(false);
        }

        if let Some(ref original) = state.original {
            tokio::fs::write(&self.path, original).await?;
        }
        state.modified = false;
        tracing::debug!("Restored {}", self.path.display());
        Ok(true)
    }
}

/// Keep lines matching `keep`, each terminated by a newline
pub fn filter_lines<F>(content: &str, keep: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut filtered = String::with_capacity(content.len());
    for line in content.lines().filter(|line| keep(*line)) {
        filtered.push_str(line);
        filtered.push('\n');
    }
    filtered
}

/// Line predicate dropping lines whose trimmed text equals one of `literals`
pub fn drop_exact_lines<'a>(literals: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
    move |line| {
        let trimmed = line.trim();
        literals.iter().all(|literal| *literal != trimmed)
    }
}
