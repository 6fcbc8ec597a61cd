//! 文件持久存储
//!
//! 每章一个 JSON 文件：`{root}/{language}/{book}/{chapter}.json`，
//! 内容为 `CacheEntry`。写入先写临时文件再 rename，保证读到的总是完整文件。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::PersistentStore;
use crate::error::StoreError;
use crate::models::{CacheEntry, ChapterKey, FluidContent};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 文件存储
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 某一章对应的文件路径
    pub fn path_for(&self, key: &ChapterKey) -> PathBuf {
        self.root
            .join(&key.language)
            .join(&key.book)
            .join(format!("{}.json", key.chapter))
    }

    /// 读取完整记录
    pub async fn get_entry(&self, key: &ChapterKey) -> Result<Option<CacheEntry>, StoreError> {
        let path = self.path_for(key);

        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let entry: CacheEntry = serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
            location: path.display().to_string(),
            detail: e.to_string(),
        })?;

        Ok(Some(entry))
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn get_fluid(&self, key: &ChapterKey) -> Result<Option<FluidContent>, StoreError> {
        let entry = self.get_entry(key).await?;
        debug!("文件存储读取 {}: {}", key, if entry.is_some() { "命中" } else { "未命中" });
        Ok(entry.map(|e| e.value))
    }

    async fn put_fluid(&self, key: &ChapterKey, content: &FluidContent) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let entry = CacheEntry::new(key.clone(), content.clone());
        let body = serde_json::to_vec_pretty(&entry).map_err(|e| StoreError::Decode {
            location: path.display().to_string(),
            detail: e.to_string(),
        })?;

        let tmp = path.with_extension(format!(
            "json.{}-{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, body).await.map_err(io_err)?;
        fs::rename(&tmp, &path).await.map_err(io_err)?;

        debug!("文件存储写入 {}", path.display());
        Ok(())
    }
}
