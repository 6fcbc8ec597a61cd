//! 静态经文数据 - 基础设施层
//!
//! 随程序打包的只读经文，按 (书卷, 章) 查询，不走网络。
//!
//! 数据格式：
//! ```json
//! { "Gênesis": { "1": [ { "number": 1, "text": "No princípio..." } ] } }
//! ```
//! 书名可以是任意写法，加载时统一为标准标识。

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::info;

use crate::error::CorpusError;
use crate::models::{canonical_book, Verse, VerseSet};

type RawCorpus = HashMap<String, HashMap<String, Vec<Verse>>>;

/// 静态经文
#[derive(Debug, Default)]
pub struct StaticCorpus {
    chapters: HashMap<(String, u32), VerseSet>,
}

impl StaticCorpus {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(json: &str) -> Result<Self, CorpusError> {
        let raw: RawCorpus = serde_json::from_str(json)?;
        let mut corpus = Self::empty();

        for (book, chapters) in raw {
            for (chapter, verses) in chapters {
                let number: u32 = chapter.trim().parse().map_err(|_| CorpusError::InvalidChapter {
                    book: book.clone(),
                    chapter: chapter.clone(),
                    reason: "章节号不是正整数".to_string(),
                })?;
                let verses = VerseSet::new(verses).map_err(|e| CorpusError::InvalidChapter {
                    book: book.clone(),
                    chapter: chapter.clone(),
                    reason: e.to_string(),
                })?;
                corpus.insert(&book, number, verses)?;
            }
        }

        Ok(corpus)
    }

    /// 从文件加载
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取经文文件: {}", path.display()))?;

        let corpus = Self::from_json_str(&content)
            .with_context(|| format!("无法解析经文文件: {}", path.display()))?;

        info!("📖 已加载静态经文 {} 章 ({})", corpus.len(), path.display());
        Ok(corpus)
    }

    /// 插入一章
    pub fn insert(&mut self, book: &str, chapter: u32, verses: VerseSet) -> Result<(), CorpusError> {
        let info = canonical_book(book).map_err(|e| CorpusError::InvalidChapter {
            book: book.to_string(),
            chapter: chapter.to_string(),
            reason: e.to_string(),
        })?;

        if chapter == 0 || chapter > info.chapters {
            return Err(CorpusError::InvalidChapter {
                book: book.to_string(),
                chapter: chapter.to_string(),
                reason: format!("超出范围 1..={}", info.chapters),
            });
        }

        self.chapters.insert((info.id.to_string(), chapter), verses);
        Ok(())
    }

    /// 查询一章（书名需为标准标识）
    pub fn chapter(&self, book: &str, chapter: u32) -> Option<&VerseSet> {
        self.chapters.get(&(book.to_string(), chapter))
    }

    /// 已收录的章节数
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
