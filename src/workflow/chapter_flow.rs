//! 章节解析流程 - 流程层
//!
//! 核心职责：定义"一章"从哪里取得内容
//!
//! 流程顺序：
//! 1. 临时缓存 → 命中直接返回
//! 2. 持久存储 → 命中后回写临时缓存
//! 3. 生成（经文来自静态数据或网络原文）→ 写回临时缓存和持久存储
//!
//! 静态经文不是内容缓存，只在需要生成时作为输入材料。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ResolutionError, StoreError};
use crate::infrastructure::store::{self, PersistentStore};
use crate::infrastructure::{CanonicalSource, EphemeralCache, StaticCorpus};
use crate::models::{ChapterKey, FluidContent, VerseSet};
use crate::services::GenerationProvider;

/// 生成后持久写入的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// 后台任务写入，失败只记日志，调用方不等待
    Detached,
    /// 等待写入完成并把结果交给调用方
    Awaited,
}

/// 持久写入的结果
#[derive(Debug)]
pub enum PersistOutcome {
    /// 已交给后台任务
    Detached,
    /// 已写入
    Stored,
    /// 写入失败
    Failed(StoreError),
}

/// 一次生成的结果
#[derive(Debug)]
pub struct Generated {
    pub content: FluidContent,
    pub persist: PersistOutcome,
}

/// 章节解析器
///
/// - 按固定优先级依次查询各个来源
/// - 生成成功后写回临时缓存和持久存储，同一章最多生成一次
/// - 不做重试：交互式调用方自行决定是否重试，批量重试由编排层负责
pub struct ChapterResolver {
    primary_language: String,
    corpus: Arc<StaticCorpus>,
    cache: Arc<dyn EphemeralCache>,
    store: Arc<dyn PersistentStore>,
    provider: Arc<dyn GenerationProvider>,
    canonical: Option<Arc<dyn CanonicalSource>>,
    store_timeout: Option<Duration>,
}

impl ChapterResolver {
    /// 创建解析器
    ///
    /// 默认持久存储读取超时 5 秒，没有网络原文来源。
    pub fn new(
        primary_language: impl Into<String>,
        corpus: Arc<StaticCorpus>,
        cache: Arc<dyn EphemeralCache>,
        store: Arc<dyn PersistentStore>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            primary_language: primary_language.into().trim().to_lowercase().replace('_', "-"),
            corpus,
            cache,
            store,
            provider,
            canonical: None,
            store_timeout: Some(Duration::from_secs(5)),
        }
    }

    /// 设置非主语言的原文来源
    pub fn with_canonical_source(mut self, source: Arc<dyn CanonicalSource>) -> Self {
        self.canonical = Some(source);
        self
    }

    /// 设置交互式读取持久存储的超时
    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn primary_language(&self) -> &str {
        &self.primary_language
    }

    /// 持久存储（批量任务直接查询存在性时使用）
    pub fn store(&self) -> Arc<dyn PersistentStore> {
        Arc::clone(&self.store)
    }

    /// 按 (语言, 书名, 章) 读取
    pub async fn resolve_chapter(
        &self,
        language: &str,
        book: &str,
        chapter: u32,
    ) -> Result<FluidContent, ResolutionError> {
        let key = ChapterKey::new(language, book, chapter)?;
        self.resolve(&key).await
    }

    /// 读取一章的流畅版内容
    pub async fn resolve(&self, key: &ChapterKey) -> Result<FluidContent, ResolutionError> {
        // ========== 第 1 层: 临时缓存 ==========
        if let Some(content) = self.cache.get(key) {
            debug!("{} 临时缓存命中", key);
            return Ok(content);
        }

        // ========== 第 2 层: 持久存储 ==========
        match store::get_with_timeout(self.store.as_ref(), key, self.store_timeout).await {
            Ok(Some(content)) => {
                debug!("{} 持久存储命中，回写临时缓存", key);
                self.cache.set(key, content.clone());
                return Ok(content);
            }
            Ok(None) => {
                debug!("{} 持久存储未命中", key);
            }
            Err(e) => {
                // 读取失败不等于不存在，但只能按未命中处理
                warn!("⚠️ {} 持久存储读取失败，按未命中处理: {}", key, e);
            }
        }

        // ========== 第 3 层: 生成 ==========
        let generated = self.generate(key, PersistMode::Detached).await?;
        Ok(generated.content)
    }

    /// 直接生成（跳过缓存查询）
    ///
    /// 成功后写临时缓存，再按 `mode` 写持久存储。段落为空视为失败，不写任何地方。
    pub async fn generate(
        &self,
        key: &ChapterKey,
        mode: PersistMode,
    ) -> Result<Generated, ResolutionError> {
        let verses = self.source_verses(key).await;
        info!("🤖 {} 开始生成 (经文 {} 节)", key, verses.len());

        let content = self
            .provider
            .generate(key, &verses)
            .await
            .map_err(|source| ResolutionError::Provider {
                key: key.clone(),
                source,
            })?
            .normalized();

        if content.is_empty() {
            warn!("⚠️ {} 生成结果没有段落，丢弃", key);
            return Err(ResolutionError::EmptyContent { key: key.clone() });
        }

        info!("✓ {} 生成完成: {} ({} 段)", key, content.title, content.paragraphs.len());
        self.cache.set(key, content.clone());

        let persist = match mode {
            PersistMode::Detached => {
                self.persist_detached(key, &content);
                PersistOutcome::Detached
            }
            PersistMode::Awaited => match self.store.put_fluid(key, &content).await {
                Ok(()) => PersistOutcome::Stored,
                Err(e) => {
                    warn!("⚠️ {} 持久存储写入失败: {}", key, e);
                    PersistOutcome::Failed(e)
                }
            },
        };

        Ok(Generated { content, persist })
    }

    /// 后台写入持久存储，不等待结果
    fn persist_detached(&self, key: &ChapterKey, content: &FluidContent) {
        let store = Arc::clone(&self.store);
        let key = key.clone();
        let content = content.clone();

        tokio::spawn(async move {
            match store.put_fluid(&key, &content).await {
                Ok(()) => debug!("{} 已写入持久存储", key),
                Err(e) => warn!("⚠️ {} 后台写入持久存储失败: {}", key, e),
            }
        });
    }

    /// 生成用的经文
    ///
    /// 主语言取静态数据；其他语言取网络原文。都取不到时返回空经文，
    /// 生成只依据章节引用。
    async fn source_verses(&self, key: &ChapterKey) -> VerseSet {
        if key.language == self.primary_language {
            if let Some(verses) = self.corpus.chapter(&key.book, key.chapter) {
                return verses.clone();
            }
            warn!("⚠️ {} 静态经文中没有这一章", key);
            return VerseSet::empty();
        }

        let Some(source) = &self.canonical else {
            debug!("{} 未配置原文来源", key);
            return VerseSet::empty();
        };

        match source.fetch(key).await {
            Ok(Some(verses)) => verses,
            Ok(None) => {
                warn!("⚠️ {} 原文来源没有这一章", key);
                VerseSet::empty()
            }
            Err(e) => {
                warn!("⚠️ {} 原文获取失败，继续生成: {}", key, e);
                VerseSet::empty()
            }
        }
    }
}
