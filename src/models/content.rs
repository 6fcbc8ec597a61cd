//! 经文与生成内容

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::models::ChapterKey;

/// 单节经文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

/// 一章的经文，编号从 1 开始严格连续
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Verse>", into = "Vec<Verse>")]
pub struct VerseSet {
    verses: Vec<Verse>,
}

impl VerseSet {
    /// 创建并校验编号
    pub fn new(verses: Vec<Verse>) -> Result<Self, CorpusError> {
        for (index, verse) in verses.iter().enumerate() {
            let expected = index as u32 + 1;
            if verse.number != expected {
                return Err(CorpusError::VerseNumbering {
                    expected,
                    found: verse.number,
                });
            }
        }
        Ok(Self { verses })
    }

    /// 空经文（原文获取失败时使用）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verse> {
        self.verses.iter()
    }

    /// 每节一行，`{编号} {内容}`
    pub fn to_prompt_text(&self) -> String {
        self.verses
            .iter()
            .map(|v| format!("{} {}", v.number, v.text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Verse>> for VerseSet {
    type Error = CorpusError;

    fn try_from(verses: Vec<Verse>) -> Result<Self, Self::Error> {
        Self::new(verses)
    }
}

impl From<VerseSet> for Vec<Verse> {
    fn from(set: VerseSet) -> Self {
        set.verses
    }
}

/// 生成的"流畅版"章节内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidContent {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl FluidContent {
    pub fn new(title: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            title: title.into(),
            paragraphs,
        }
    }

    /// 去掉首尾空白和空段落
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            paragraphs: self
                .paragraphs
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// 没有任何段落
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// 渲染为 markdown
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.title);
        for paragraph in &self.paragraphs {
            out.push('\n');
            out.push_str(paragraph);
            out.push('\n');
        }
        out
    }
}

/// 缓存记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: ChapterKey,
    pub value: FluidContent,
    pub written_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: ChapterKey, value: FluidContent) -> Self {
        Self {
            key,
            value,
            written_at: Utc::now(),
        }
    }
}
