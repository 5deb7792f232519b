//! Filesystem blob store: `<root>/<bucket>/<key>`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::kernel::BaseBlobStore;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_segment(bucket).context("invalid bucket name")?;
        validate_segment(key).context("invalid object key")?;
        Ok(self.root.join(bucket).join(key))
    }
}

/// One path component: no separators, no `.`/`..`, nothing hidden.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment.starts_with('.')
        || segment.contains(['/', '\\', '\0'])
    {
        bail!("path segment {segment:?} is not allowed");
    }
    Ok(())
}

#[async_trait]
impl BaseBlobStore for FsBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create bucket directory {}", parent.display()))?;
        }

        // Write then rename so readers never see a partial file
        let tmp_path = path.with_extension("partial");
        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).context("failed to write object");
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).context("failed to move object into place");
        }

        debug!(bucket, key, content_type, size = bytes.len(), "stored object");
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read object {bucket}/{key}"))
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to remove object {bucket}/{key}"))
    }
}
