//! 网络原文来源 - 基础设施层
//!
//! 非主语言的章节没有打包的经文，从 bible-api.com 风格的接口获取。
//! 结果只作为生成的输入材料，获取失败时调用方继续生成。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::models::{ChapterKey, Verse, VerseSet};

/// 原文来源接口
#[async_trait]
pub trait CanonicalSource: Send + Sync {
    /// 获取一章原文；该语言不受支持或章节不存在时返回 `Ok(None)`
    async fn fetch(&self, key: &ChapterKey) -> Result<Option<VerseSet>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct ApiChapter {
    verses: Vec<ApiVerse>,
}

#[derive(Debug, Deserialize)]
struct ApiVerse {
    verse: u32,
    text: String,
}

/// bible-api.com 客户端
#[derive(Debug, Clone)]
pub struct BibleApiSource {
    client: Client,
    base_url: String,
}

impl BibleApiSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
        })
    }

    /// 语言 → 译本
    pub fn translation_for(language: &str) -> Option<&'static str> {
        match language {
            "pt" => Some("almeida"),
            "en" => Some("web"),
            "la" => Some("clementine"),
            _ => None,
        }
    }

    /// 构造请求地址，如 `{base}/1%20samuel%203?translation=web`
    pub fn url_for(&self, key: &ChapterKey, translation: &str) -> Result<Url, SourceError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(&format!("{} {}", key.book.replace('-', " "), key.chapter));
        url.query_pairs_mut().append_pair("translation", translation);
        Ok(url)
    }
}

#[async_trait]
impl CanonicalSource for BibleApiSource {
    async fn fetch(&self, key: &ChapterKey) -> Result<Option<VerseSet>, SourceError> {
        let Some(translation) = Self::translation_for(&key.language) else {
            debug!("语言 {} 没有可用译本", key.language);
            return Ok(None);
        };

        let url = self.url_for(key, translation)?;
        debug!("获取原文: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let chapter: ApiChapter = response.json().await?;
                let verses = chapter
                    .verses
                    .into_iter()
                    .map(|v| Verse {
                        number: v.verse,
                        text: v.text.trim().to_string(),
                    })
                    .collect();
                Ok(Some(VerseSet::new(verses)?))
            }
            status => Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}
