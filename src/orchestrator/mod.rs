//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 对整本书按章节顺序批量生成流畅版内容，是批量任务的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_state` - 状态机
//! - 阶段（Check / Generate / Backoff / Pause）与事件的纯转移函数
//! - 计数、当前章节、用户可见日志都只在这里修改
//! - 重试策略（指数退避、最多尝试次数、章间等待）
//!
//! ### `batch_processor` - 批量执行器
//! - 执行每个阶段的 I/O（查询存储、调用生成、等待）
//! - 同一本书同时只允许一个任务
//! - 每次转移后发布快照
//!
//! ### `handle` - 任务句柄
//! - 快照读取与订阅
//! - 取消标志
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 1..=total 章)
//!     ↓
//! workflow::ChapterResolver (处理单章)
//!     ↓
//! services (能力层：生成)
//!     ↓
//! infrastructure (缓存 / 存储 / 经文)
//! ```

pub mod batch_processor;
pub mod batch_state;
pub mod handle;

// 重新导出主要类型
pub use batch_processor::BatchOrchestrator;
pub use batch_state::RetryPolicy;
pub use handle::{BatchHandle, CancelFlag};
