//! 临时缓存 - 基础设施层
//!
//! 进程内的键值缓存，只在当前会话内有效。
//! 写入失败（例如超出配额）只记日志，不影响调用方。

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::CacheError;
use crate::models::{CacheEntry, ChapterKey, FluidContent};

/// 临时缓存接口
pub trait EphemeralCache: Send + Sync {
    fn get(&self, key: &ChapterKey) -> Option<FluidContent>;

    /// 写入缓存；任何失败都在内部吞掉
    fn set(&self, key: &ChapterKey, value: FluidContent);
}

/// 内存缓存
///
/// 不做淘汰。设置 `quota` 后，超出条数的新写入会失败并被忽略。
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<ChapterKey, CacheEntry>>,
    quota: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制最大条数
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota: Some(quota),
        }
    }

    /// 写入，超出配额时返回错误
    pub fn try_set(&self, key: &ChapterKey, value: FluidContent) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(quota) = self.quota {
            if entries.len() >= quota && !entries.contains_key(key) {
                return Err(CacheError::QuotaExceeded { quota });
            }
        }

        entries.insert(key.clone(), CacheEntry::new(key.clone(), value));
        Ok(())
    }

    /// 读取完整记录（含写入时间）
    pub fn entry(&self, key: &ChapterKey) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EphemeralCache for MemoryCache {
    fn get(&self, key: &ChapterKey) -> Option<FluidContent> {
        self.entry(key).map(|entry| entry.value)
    }

    fn set(&self, key: &ChapterKey, value: FluidContent) {
        if let Err(e) = self.try_set(key, value) {
            debug!("临时缓存写入失败，忽略 ({}): {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(chapter: u32) -> ChapterKey {
        ChapterKey::new("pt", "genesis", chapter).unwrap()
    }

    fn content(title: &str) -> FluidContent {
        FluidContent::new(title, vec!["p1".into()])
    }

    #[test]
    fn set_then_get() {
        let cache = MemoryCache::new();
        assert!(cache.get(&key(1)).is_none());

        cache.set(&key(1), content("A"));
        assert_eq!(cache.get(&key(1)), Some(content("A")));
        assert!(cache.entry(&key(1)).is_some());
    }

    #[test]
    fn overwrite_keeps_last_value() {
        let cache = MemoryCache::new();
        cache.set(&key(1), content("A"));
        cache.set(&key(1), content("B"));
        assert_eq!(cache.get(&key(1)), Some(content("B")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn quota_overflow_is_a_silent_no_op() {
        let cache = MemoryCache::with_quota(1);
        cache.set(&key(1), content("A"));
        cache.set(&key(2), content("B"));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(2)).is_none());
        assert_eq!(
            cache.try_set(&key(2), content("B")),
            Err(CacheError::QuotaExceeded { quota: 1 })
        );
        // 已存在的键仍可覆盖
        assert!(cache.try_set(&key(1), content("C")).is_ok());
    }
}
