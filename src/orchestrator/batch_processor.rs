//! 批量章节生成器 - 编排层
//!
//! ## 职责
//!
//! 对一本书的所有章节依次执行"检查 → 生成 → 退避重试"，
//! 并把每一步的结果交给状态机 `batch_state::transition`。
//!
//! ## 核心功能
//!
//! 1. **存在性检查**：直接查询持久存储（绕过临时缓存）
//! 2. **生成**：调用解析器的生成路径，等待持久写入完成
//! 3. **退避重试**：限流时按 `base * 2^(n-1)` 等待，最多 5 次
//! 4. **章间节流**：每生成一章后固定等待
//! 5. **取消**：每次检查、生成、退避前查看取消标志
//! 6. **进度快照**：每次状态转移后发布一次 `BatchRun`
//!
//! ## 设计特点
//!
//! - **严格串行**：第 i 章结束前不会开始第 i+1 章，以配合上游限流
//! - **同书互斥**：同一语言同一本书同时只允许一个批量任务

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{BatchError, KeyError};
use crate::infrastructure::store;
use crate::models::{canonical_book, BatchRun, Book, ChapterKey};
use crate::orchestrator::batch_state::{transition, Event, Phase, Presence, RetryPolicy};
use crate::orchestrator::handle::{BatchHandle, CancelFlag};
use crate::utils::logging;
use crate::workflow::{ChapterResolver, PersistMode, PersistOutcome};

/// 批量生成器
#[derive(Clone)]
pub struct BatchOrchestrator {
    resolver: Arc<ChapterResolver>,
    language: String,
    policy: RetryPolicy,
    store_timeout: Option<Duration>,
    active: Arc<Mutex<HashSet<String>>>,
}

impl BatchOrchestrator {
    /// 创建批量生成器
    ///
    /// 语言默认为解析器的主语言，存在性检查默认不限时。
    pub fn new(resolver: Arc<ChapterResolver>, policy: RetryPolicy) -> Self {
        let language = resolver.primary_language().to_string();
        Self {
            resolver,
            language,
            policy,
            store_timeout: None,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 指定生成语言
    pub fn with_language(mut self, language: &str) -> Result<Self, KeyError> {
        self.language = crate::models::key::normalize_language(language)?;
        Ok(self)
    }

    /// 存在性检查的超时
    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 对整本书启动批量生成，章节数取自书卷目录
    pub fn start_book(&self, book: &str) -> Result<BatchHandle, BatchError> {
        let info = canonical_book(book)?;
        self.start_batch(book, info.chapters)
    }

    /// 对第 1..=total 章启动批量生成
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn start_batch(&self, book: &str, total: u32) -> Result<BatchHandle, BatchError> {
        let info = canonical_book(book)?;
        if total == 0 || total > info.chapters {
            return Err(BatchError::InvalidTotal {
                book: info.id.to_string(),
                total,
                max: info.chapters,
            });
        }

        let slot = format!("{}/{}", self.language, info.id);
        let guard = ActiveGuard::acquire(Arc::clone(&self.active), slot)
            .ok_or_else(|| BatchError::AlreadyRunning {
                book: info.id.to_string(),
            })?;

        let run = BatchRun::new(&self.language, info.id, total);
        let (tx, rx) = watch::channel(run.clone());
        let cancel = CancelFlag::new();

        let ctx = RunContext {
            resolver: Arc::clone(&self.resolver),
            language: self.language.clone(),
            book: info,
            policy: self.policy,
            store_timeout: self.store_timeout,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(async move {
            let _guard = guard;
            ctx.drive(run, tx).await
        });

        Ok(BatchHandle::new(info.id.to_string(), rx, cancel, task))
    }
}

/// 同书互斥的占位，任务结束时释放
struct ActiveGuard {
    active: Arc<Mutex<HashSet<String>>>,
    slot: String,
}

impl ActiveGuard {
    fn acquire(active: Arc<Mutex<HashSet<String>>>, slot: String) -> Option<Self> {
        let inserted = active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(slot.clone());
        inserted.then(|| Self { active, slot })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.slot);
    }
}

/// 单次批量任务的执行上下文
struct RunContext {
    resolver: Arc<ChapterResolver>,
    language: String,
    book: &'static Book,
    policy: RetryPolicy,
    store_timeout: Option<Duration>,
    cancel: CancelFlag,
}

impl RunContext {
    /// 执行循环：执行当前阶段 → 状态转移 → 发布快照
    async fn drive(self, mut run: BatchRun, tx: watch::Sender<BatchRun>) -> BatchRun {
        logging::log_batch_start(&run);
        run.push_log(format!(
            "Iniciando geração de {} ({} capítulos, idioma {})",
            self.book.name_pt, run.total, run.language
        ));
        tx.send_replace(run.clone());

        let mut phase = Phase::start(run.total);
        while !phase.is_terminal() {
            let event = self.execute(phase).await;
            phase = transition(&mut run, phase, event, &self.policy);
            tx.send_replace(run.clone());
        }

        logging::print_batch_summary(&run);
        run
    }

    /// 执行一个阶段，返回结果事件
    async fn execute(&self, phase: Phase) -> Event {
        match phase {
            Phase::Check { chapter } => {
                if self.cancel.is_cancelled() {
                    return Event::CancelObserved;
                }
                self.check(chapter).await
            }
            Phase::Generate { chapter, attempt } => {
                if self.cancel.is_cancelled() {
                    return Event::CancelObserved;
                }
                self.generate(chapter, attempt).await
            }
            Phase::Backoff { attempt, .. } => {
                if self.cancel.is_cancelled() {
                    return Event::CancelObserved;
                }
                self.wait(self.policy.backoff_delay(attempt)).await
            }
            Phase::Pause { .. } => self.wait(self.policy.inter_chapter_delay).await,
            Phase::Completed | Phase::Cancelled => Event::Waited,
        }
    }

    fn key(&self, chapter: u32) -> ChapterKey {
        ChapterKey::for_validated(&self.language, self.book, chapter)
    }

    async fn check(&self, chapter: u32) -> Event {
        let key = self.key(chapter);
        let store = self.resolver.store();

        match store::get_with_timeout(store.as_ref(), &key, self.store_timeout).await {
            Ok(Some(_)) => {
                info!("[{}] 已存在，跳过", key);
                Event::Checked(Presence::Present)
            }
            Ok(None) => Event::Checked(Presence::Absent),
            Err(e) => {
                warn!("⚠️ [{}] 存在性检查失败，按不存在处理: {}", key, e);
                Event::Checked(Presence::Unknown(e.to_string()))
            }
        }
    }

    async fn generate(&self, chapter: u32, attempt: u32) -> Event {
        let key = self.key(chapter);
        info!(
            "[{}] 📝 生成第 {}/{} 次尝试",
            key, attempt, self.policy.max_attempts
        );

        match self.resolver.generate(&key, PersistMode::Awaited).await {
            Ok(generated) => match generated.persist {
                PersistOutcome::Failed(e) => Event::PersistFailed(e.to_string()),
                PersistOutcome::Stored | PersistOutcome::Detached => Event::Generated,
            },
            Err(e) => {
                let transient = e.is_transient();
                if transient {
                    warn!("[{}] ⏳ 限流: {}", key, e);
                } else {
                    error!("[{}] ❌ 生成失败: {}", key, e);
                }
                Event::GenerationFailed {
                    transient,
                    message: e.to_string(),
                }
            }
        }
    }

    /// 等待；被取消时提前结束，由下一阶段处理取消
    async fn wait(&self, duration: Duration) -> Event {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => {}
        }
        Event::Waited
    }
}
