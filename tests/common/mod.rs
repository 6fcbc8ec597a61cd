//! 集成测试共用的替身实现
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use biblia_fluida::error::{ProviderError, SourceError, StoreError};
use biblia_fluida::infrastructure::{
    CanonicalSource, EphemeralCache, MemoryCache, PersistentStore, StaticCorpus,
};
use biblia_fluida::models::Verse;
use biblia_fluida::services::GenerationProvider;
use biblia_fluida::{ChapterKey, ChapterResolver, FluidContent, RetryPolicy, VerseSet};

pub fn key(language: &str, book: &str, chapter: u32) -> ChapterKey {
    ChapterKey::new(language, book, chapter).unwrap()
}

pub fn content(title: &str) -> FluidContent {
    FluidContent::new(title, vec!["p1".to_string(), "p2".to_string()])
}

pub fn corpus() -> Arc<StaticCorpus> {
    Arc::new(StaticCorpus::from_json_str(include_str!("../../data/corpus_pt.json")).unwrap())
}

/// 毫秒级的重试策略，测试不必真的等几秒
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(1),
        max_attempts: 5,
        inter_chapter_delay: Duration::from_millis(1),
    }
}

/// 主语言 pt、内存缓存、给定存储和生成服务的解析器
pub fn resolver(
    store: Arc<RecordingStore>,
    provider: Arc<ScriptedProvider>,
) -> (ChapterResolver, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let resolver = ChapterResolver::new(
        "pt",
        corpus(),
        Arc::clone(&cache) as Arc<dyn EphemeralCache>,
        store,
        provider,
    );
    (resolver, cache)
}

// ========== 持久存储 ==========

/// 记录调用次数、可注入失败的内存存储
#[derive(Default)]
pub struct RecordingStore {
    entries: Mutex<HashMap<ChapterKey, FluidContent>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    put_done: Notify,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: &ChapterKey, content: FluidContent) {
        self.entries.lock().unwrap().insert(key.clone(), content);
    }

    pub fn stored(&self, key: &ChapterKey) -> Option<FluidContent> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 等到至少 `n` 次写入（后台写入测试用）
    pub async fn wait_for_puts(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.put_count() < n {
                self.put_done.notified().await;
            }
        })
        .await
        .expect("persistent write did not happen in time");
    }
}

#[async_trait]
impl PersistentStore for RecordingStore {
    async fn get_fluid(&self, key: &ChapterKey) -> Result<Option<FluidContent>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout {
                after: Duration::from_secs(5),
            });
        }
        Ok(self.stored(key))
    }

    async fn put_fluid(&self, key: &ChapterKey, content: &FluidContent) -> Result<(), StoreError> {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Status {
                status: 503,
                url: format!("memory://{}", key),
            })
        } else {
            self.insert(key, content.clone());
            Ok(())
        };
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.put_done.notify_one();
        result
    }
}

// ========== 生成服务 ==========

/// 一次生成调用的预设结果
#[derive(Debug, Clone)]
pub enum Step {
    Ok(FluidContent),
    RateLimited,
    Fatal,
    Empty,
}

/// 按章节预设结果的生成服务
///
/// 没有预设的章节返回 `"Capítulo N"` 标题的两段内容。
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<u32, VecDeque<Step>>>,
    calls: AtomicUsize,
    verse_counts: Mutex<Vec<(ChapterKey, usize)>>,
    gate: Option<Semaphore>,
    entered: Notify,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 每次调用都要先取得一个许可，由测试用 `release` 放行
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        })
    }

    pub fn script(self: &Arc<Self>, chapter: u32, steps: Vec<Step>) -> Arc<Self> {
        self.scripts
            .lock()
            .unwrap()
            .insert(chapter, steps.into_iter().collect());
        Arc::clone(self)
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    /// 等到有一次调用进入
    pub async fn wait_entered(&self) {
        tokio::time::timeout(Duration::from_secs(2), self.entered.notified())
            .await
            .expect("provider was not called in time");
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 每次调用收到的经文节数
    pub fn verse_counts(&self) -> Vec<(ChapterKey, usize)> {
        self.verse_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(
        &self,
        key: &ChapterKey,
        verses: &VerseSet,
    ) -> Result<FluidContent, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verse_counts
            .lock()
            .unwrap()
            .push((key.clone(), verses.len()));
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&key.chapter)
            .and_then(|steps| steps.pop_front());

        match step {
            None => Ok(content(&format!("Capítulo {}", key.chapter))),
            Some(Step::Ok(content)) => Ok(content),
            Some(Step::RateLimited) => Err(ProviderError::RateLimited {
                message: "429 Too Many Requests".to_string(),
            }),
            Some(Step::Fatal) => Err(ProviderError::Failed {
                message: "401 Unauthorized".to_string(),
            }),
            Some(Step::Empty) => Ok(FluidContent::new("X", Vec::new())),
        }
    }
}

// ========== 原文来源 ==========

/// 原文来源的预设行为
pub enum SourceMode {
    Verses(usize),
    Missing,
    Failing,
}

pub struct FakeSource {
    mode: SourceMode,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(mode: SourceMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanonicalSource for FakeSource {
    async fn fetch(&self, key: &ChapterKey) -> Result<Option<VerseSet>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            SourceMode::Verses(n) => {
                let verses = (1..=n as u32)
                    .map(|number| Verse {
                        number,
                        text: format!("{} verse {}", key, number),
                    })
                    .collect();
                Ok(Some(VerseSet::new(verses)?))
            }
            SourceMode::Missing => Ok(None),
            SourceMode::Failing => Err(SourceError::Status {
                status: 500,
                url: format!("https://bible-api.test/{}", key),
            }),
        }
    }
}
