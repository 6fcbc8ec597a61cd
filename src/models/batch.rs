//! 批量生成状态
//!
//! 一次批量生成的全部可观察状态。只由编排层修改，
//! 外部通过快照读取。

use serde::Serialize;

/// 批量任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    Running,
    Completed,
    Cancelled,
}

/// 批量任务快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRun {
    /// 书卷标准标识
    pub book_name: String,
    pub language: String,
    /// 章节总数
    pub total: u32,
    /// 当前处理到的章节（0 表示尚未开始）
    pub current: u32,
    pub generated: u32,
    pub skipped: u32,
    pub errors: u32,
    pub cancelled: bool,
    /// 已进入终止状态，之后不再变化
    pub finished: bool,
    /// 按时间顺序的日志，每行带 `[HH:MM:SS]` 前缀
    pub log: Vec<String>,
}

impl BatchRun {
    pub fn new(language: impl Into<String>, book_name: impl Into<String>, total: u32) -> Self {
        Self {
            book_name: book_name.into(),
            language: language.into(),
            total,
            current: 0,
            generated: 0,
            skipped: 0,
            errors: 0,
            cancelled: false,
            finished: false,
            log: Vec::new(),
        }
    }

    /// 追加一行带时间戳的日志
    pub fn push_log(&mut self, message: impl AsRef<str>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.log.push(format!("[{}] {}", stamp, message.as_ref()));
    }

    pub fn status(&self) -> BatchStatus {
        if self.cancelled {
            BatchStatus::Cancelled
        } else if self.finished {
            BatchStatus::Completed
        } else {
            BatchStatus::Running
        }
    }

    /// 已有结论的章节数
    pub fn processed(&self) -> u32 {
        self.skipped + self.generated + self.errors
    }

    /// `skipped + generated + errors <= current <= total`
    pub fn counters_consistent(&self) -> bool {
        self.processed() <= self.current && self.current <= self.total
    }
}
