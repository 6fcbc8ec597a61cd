//! # Bíblia Fluida
//!
//! 按章节读取和批量生成"流畅版"经文（把一章改写成连贯段落的版本）
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有存储和数据，只暴露能力
//! - `MemoryCache` - 进程内临时缓存
//! - `FileStore` / `HttpStore` - 持久存储
//! - `StaticCorpus` / `BibleApiSource` - 生成用的原文经文
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单章
//! - `LlmService` - 调用模型生成流畅版内容
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一章"从哪里取得内容
//! - `ChapterResolver` - 临时缓存 → 持久存储 → 生成
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 整本书的批量生成、退避重试、取消和进度快照
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use models::{BatchRun, ChapterKey, FluidContent, VerseSet};
pub use orchestrator::{BatchHandle, BatchOrchestrator, RetryPolicy};
pub use workflow::{ChapterResolver, PersistMode};
