use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::fetch::{ResourceFetcher, is_remote};
use crate::foundation::error::{PromoError, PromoResult};

/// Normalize and validate a root-relative resource path.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PromoResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PromoError::resource_load("resource paths must be relative"));
    }
    if s.is_empty() {
        return Err(PromoError::resource_load("resource path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PromoError::resource_load(
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PromoError::resource_load(
            "resource path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Reads resources from a local directory.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ResourceFetcher for FsFetcher {
    async fn fetch(&self, url: &str) -> PromoResult<Vec<u8>> {
        if is_remote(url) {
            return Err(PromoError::resource_load(format!(
                "'{url}' is remote; configure a proxy fetcher to load it"
            )));
        }
        let rel = normalize_rel_path(url)?;
        let path = self.root.join(Path::new(&rel));
        tokio::fs::read(&path).await.map_err(|e| {
            PromoError::resource_load(format!("read '{}': {e}", path.display()))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/fs.rs"]
mod tests;
