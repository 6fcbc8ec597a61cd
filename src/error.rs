//! 错误类型
//!
//! 每一层各有自己的错误枚举，程序入口用 `anyhow` 汇总。
//! 区分三类情况：
//! - "没找到"（`Ok(None)`，不是错误）
//! - 基础设施故障（`StoreError`，不能当作"没找到"）
//! - 生成失败（`ProviderError`，带有是否可重试的分类）

use std::time::Duration;

use thiserror::Error;

use crate::models::ChapterKey;

/// 章节标识错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// 语言代码为空
    #[error("语言代码不能为空")]
    EmptyLanguage,
    /// 不是语言代码
    #[error("无效的语言代码: {0}")]
    InvalidLanguage(String),
    /// 书卷无法识别
    #[error("无法识别的书卷: {0}")]
    UnknownBook(String),
    /// 章节超出范围
    #[error("{book} 没有第 {chapter} 章 (共 {max} 章)")]
    ChapterOutOfRange { book: String, chapter: u32, max: u32 },
}

/// 静态经文数据错误
#[derive(Debug, Error)]
pub enum CorpusError {
    /// 经文编号不连续
    #[error("经文编号不连续: 期望 {expected}, 实际 {found}")]
    VerseNumbering { expected: u32, found: u32 },
    /// 章节数据无效
    #[error("章节数据无效 ({book} {chapter}): {reason}")]
    InvalidChapter {
        book: String,
        chapter: String,
        reason: String,
    },
    /// JSON 解析失败
    #[error("经文数据解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 临时缓存错误（只在缓存内部使用，不会传给调用方）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("缓存已满 (上限 {quota} 条)")]
    QuotaExceeded { quota: usize },
}

/// 持久存储错误
///
/// 与"没找到"严格区分：读取失败时内容可能存在，只是暂时拿不到。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 文件读写失败
    #[error("存储读写失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容无法解析
    #[error("存储内容无法解析 ({location}): {detail}")]
    Decode { location: String, detail: String },
    /// HTTP 请求失败
    #[error("存储请求失败: {0}")]
    Http(#[from] reqwest::Error),
    /// 服务端返回异常状态码
    #[error("存储服务返回状态 {status} ({url})")]
    Status { status: u16, url: String },
    /// 超时
    #[error("存储请求超时 ({after:?})")]
    Timeout { after: Duration },
    /// 配置错误
    #[error("存储配置无效: {0}")]
    Config(String),
}

/// 生成服务错误
///
/// 分类由生成服务自己给出，调用方只看 `is_transient()`。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 频率限制或配额耗尽，等待后可重试
    #[error("生成服务限流或配额不足: {message}")]
    RateLimited { message: String },
    /// 返回内容格式错误
    #[error("生成结果格式错误: {message}")]
    Malformed { message: String },
    /// 其他失败（鉴权、网络等）
    #[error("生成服务调用失败: {message}")]
    Failed { message: String },
}

impl ProviderError {
    /// 是否为可重试的临时错误
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// 原文获取错误（网络来源，尽力而为）
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("原文请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("原文服务返回状态 {status} ({url})")]
    Status { status: u16, url: String },
    #[error("原文地址无效: {0}")]
    InvalidUrl(String),
    #[error("原文数据无效: {0}")]
    Corpus(#[from] CorpusError),
}

/// 章节解析错误（交互式读取的返回错误）
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// 章节标识无效
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    /// 生成服务失败
    #[error("{key} 生成失败: {source}")]
    Provider {
        key: ChapterKey,
        #[source]
        source: ProviderError,
    },
    /// 生成结果没有段落
    #[error("{key} 生成结果没有任何段落")]
    EmptyContent { key: ChapterKey },
}

impl ResolutionError {
    /// 是否为可重试的临时错误（限流/配额）
    pub fn is_transient(&self) -> bool {
        match self {
            ResolutionError::Provider { source, .. } => source.is_transient(),
            ResolutionError::InvalidKey(_) | ResolutionError::EmptyContent { .. } => false,
        }
    }
}

/// 批量生成错误
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    /// 章节总数无效
    #[error("{book} 的章节总数无效: {total} (应在 1..={max})")]
    InvalidTotal { book: String, total: u32, max: u32 },
    /// 同一本书已有任务在运行
    #[error("{book} 已有批量任务在运行")]
    AlreadyRunning { book: String },
    /// 后台任务异常退出
    #[error("批量任务异常退出: {0}")]
    TaskFailed(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件解析失败 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置项 {field} 的值无效: {value}")]
    Invalid { field: String, value: String },
}
