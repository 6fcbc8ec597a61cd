use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};
use crate::error::{BatchError, ResolutionError};
use crate::infrastructure::{
    BibleApiSource, EphemeralCache, FileStore, HttpStore, MemoryCache, PersistentStore,
    StaticCorpus,
};
use crate::models::FluidContent;
use crate::orchestrator::{BatchHandle, BatchOrchestrator};
use crate::services::LlmService;
use crate::utils::logging;
use crate::workflow::ChapterResolver;

/// 原文 API 的请求超时
const CANONICAL_TIMEOUT: Duration = Duration::from_secs(15);

/// 应用主结构
///
/// 组装缓存、存储、经文、生成服务，对外提供单章读取和批量生成。
pub struct App {
    config: Config,
    resolver: Arc<ChapterResolver>,
    orchestrator: BatchOrchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let corpus = Arc::new(load_corpus(&config).await?);
        let cache: Arc<dyn EphemeralCache> = Arc::new(MemoryCache::new());
        let store = build_store(&config)?;
        let provider = Arc::new(LlmService::new(&config));
        let canonical = BibleApiSource::new(&config.canonical_api_base_url, CANONICAL_TIMEOUT)
            .context("无法创建原文 API 客户端")?;

        let resolver = Arc::new(
            ChapterResolver::new(&config.primary_language, corpus, cache, store, provider)
                .with_canonical_source(Arc::new(canonical))
                .with_store_timeout(config.store_timeout()),
        );

        let orchestrator = BatchOrchestrator::new(Arc::clone(&resolver), config.retry_policy())
            .with_store_timeout(config.batch_store_timeout());

        Ok(Self {
            config,
            resolver,
            orchestrator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<ChapterResolver> {
        &self.resolver
    }

    /// 读取一章
    pub async fn read(
        &self,
        language: &str,
        book: &str,
        chapter: u32,
    ) -> Result<FluidContent, ResolutionError> {
        self.resolver.resolve_chapter(language, book, chapter).await
    }

    /// 启动批量生成；`total` 为空时处理整本书
    pub fn start_batch(&self, book: &str, total: Option<u32>) -> Result<BatchHandle, BatchError> {
        match total {
            Some(total) => self.orchestrator.start_batch(book, total),
            None => self.orchestrator.start_book(book),
        }
    }
}

/// 加载静态经文；文件不存在时使用空数据
async fn load_corpus(config: &Config) -> Result<StaticCorpus> {
    let path = Path::new(&config.corpus_path);
    if !path.exists() {
        warn!("⚠️ 静态经文文件不存在: {}，主语言将只依据章节引用生成", path.display());
        return Ok(StaticCorpus::empty());
    }
    StaticCorpus::load(path).await
}

fn build_store(config: &Config) -> Result<Arc<dyn PersistentStore>> {
    match config.store_backend {
        StoreBackend::File => {
            info!("💾 使用本地存储: {}", config.store_dir);
            Ok(Arc::new(FileStore::new(&config.store_dir)))
        }
        StoreBackend::Http => {
            info!("💾 使用远程存储: {}", config.store_base_url);
            // 读取时限由解析流程和批量检查各自决定，这里只限制写入
            let store = HttpStore::new(&config.store_base_url, config.store_timeout())
                .context("无法创建远程存储客户端")?;
            Ok(Arc::new(store))
        }
    }
}
