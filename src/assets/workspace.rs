use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::ReelResult;

/// Temporary directory owned by one render invocation.
///
/// Downloads, spooled frames and the audio mix live here. Everything is removed when the
/// workspace is dropped, on success and on every error path.
#[derive(Debug)]
pub struct RenderWorkspace {
    dir: tempfile::TempDir,
}

impl RenderWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> ReelResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sketchreel-")
            .tempdir()
            .context("create render workspace")?;
        tracing::debug!(dir = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    /// Create a workspace under `parent`.
    pub fn new_in(parent: &Path) -> ReelResult<Self> {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create workspace parent {}", parent.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("sketchreel-")
            .tempdir_in(parent)
            .with_context(|| format!("create render workspace in {}", parent.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory for fetched sources, created on demand.
    pub fn downloads(&self) -> ReelResult<PathBuf> {
        self.subdir("downloads")
    }

    /// Directory for per-scene frame spools, created on demand.
    pub fn spool(&self) -> ReelResult<PathBuf> {
        self.subdir("spool")
    }

    /// Location of the raw audio mix handed to the encoder.
    pub fn audio_mix_path(&self) -> PathBuf {
        self.dir.path().join("mix.f32le")
    }

    fn subdir(&self, name: &str) -> ReelResult<PathBuf> {
        let p = self.dir.path().join(name);
        std::fs::create_dir_all(&p).with_context(|| format!("create {}", p.display()))?;
        Ok(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/workspace.rs"]
mod tests;
