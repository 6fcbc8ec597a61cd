//! 持久存储网关 - 基础设施层
//!
//! 共享的持久存储，保存已经生成过的流畅版内容。
//! `Ok(None)` 表示确实不存在；`Err` 表示存储本身出了问题。
//! 两者不能混淆。

pub mod file_store;
pub mod http_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{ChapterKey, FluidContent};

pub use file_store::FileStore;
pub use http_store::HttpStore;

/// 持久存储接口
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// 读取；不存在时返回 `Ok(None)`
    async fn get_fluid(&self, key: &ChapterKey) -> Result<Option<FluidContent>, StoreError>;

    /// 写入（同一键后写覆盖先写）
    async fn put_fluid(&self, key: &ChapterKey, content: &FluidContent) -> Result<(), StoreError>;
}

/// 带超时的读取；`timeout` 为 `None` 时不限时
pub async fn get_with_timeout(
    store: &dyn PersistentStore,
    key: &ChapterKey,
    timeout: Option<Duration>,
) -> Result<Option<FluidContent>, StoreError> {
    match timeout {
        Some(after) => tokio::time::timeout(after, store.get_fluid(key))
            .await
            .map_err(|_| StoreError::Timeout { after })?,
        None => store.get_fluid(key).await,
    }
}
