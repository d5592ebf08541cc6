use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;

use crate::foundation::error::{PromoError, PromoResult};

/// A finished, named output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

/// Destination for finished artifacts; called exactly once per successful run.
#[async_trait]
pub trait ArtifactSink: Send {
    async fn deliver(&mut self, artifact: &Artifact) -> PromoResult<()>;
}

#[async_trait]
impl<S: ArtifactSink + ?Sized> ArtifactSink for Box<S> {
    async fn deliver(&mut self, artifact: &Artifact) -> PromoResult<()> {
        (**self).deliver(artifact).await
    }
}

pub(crate) async fn ensure_parent_dir(path: &Path) -> PromoResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Writes artifacts into a directory, overwriting files with the same name.
#[derive(Clone, Debug)]
pub struct DirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in delivery order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

#[async_trait]
impl ArtifactSink for DirSink {
    async fn deliver(&mut self, artifact: &Artifact) -> PromoResult<()> {
        if artifact.filename.contains(['/', '\\']) || artifact.filename.trim().is_empty() {
            return Err(PromoError::validation(format!(
                "artifact filename '{}' must be a plain file name",
                artifact.filename
            )));
        }
        let path = self.dir.join(&artifact.filename);
        ensure_parent_dir(&path).await?;

        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("failed to write artifact '{}'", path.display()))?;

        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    artifacts: Vec<Artifact>,
}

impl InMemorySink {
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn take(&mut self) -> Vec<Artifact> {
        std::mem::take(&mut self.artifacts)
    }
}

#[async_trait]
impl ArtifactSink for InMemorySink {
    async fn deliver(&mut self, artifact: &Artifact) -> PromoResult<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
