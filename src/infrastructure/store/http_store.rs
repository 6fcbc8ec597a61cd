//! HTTP 持久存储
//!
//! 服务端接口：
//! - `GET {base}/fluid/{language}/{book}/{chapter}` → 200 内容 / 404 不存在
//! - `PUT {base}/fluid/{language}/{book}/{chapter}`，JSON 内容
//!
//! 客户端不设全局超时：读取的时限由调用方通过 `get_with_timeout` 决定，
//! 写入使用构造时给出的 `write_timeout`。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::PersistentStore;
use crate::error::StoreError;
use crate::models::{ChapterKey, FluidContent};

/// HTTP 存储
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    write_timeout: Option<Duration>,
}

impl HttpStore {
    /// 创建 HTTP 存储；`write_timeout` 只作用于 PUT
    pub fn new(base_url: impl Into<String>, write_timeout: Option<Duration>) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Config("store_base_url 为空".to_string()));
        }

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            write_timeout,
        })
    }

    /// 某一章对应的地址
    pub fn url_for(&self, key: &ChapterKey) -> String {
        format!(
            "{}/fluid/{}/{}/{}",
            self.base_url, key.language, key.book, key.chapter
        )
    }
}

#[async_trait]
impl PersistentStore for HttpStore {
    async fn get_fluid(&self, key: &ChapterKey) -> Result<Option<FluidContent>, StoreError> {
        let url = self.url_for(key);
        debug!("HTTP 存储读取: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let content = response
                    .json::<FluidContent>()
                    .await
                    .map_err(|e| StoreError::Decode {
                        location: url,
                        detail: e.to_string(),
                    })?;
                Ok(Some(content))
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
                url,
            }),
        }
    }

    async fn put_fluid(&self, key: &ChapterKey, content: &FluidContent) -> Result<(), StoreError> {
        let url = self.url_for(key);
        debug!("HTTP 存储写入: {}", url);

        let request = self.client.put(&url).json(content).send();
        let response = match self.write_timeout {
            Some(after) => tokio::time::timeout(after, request)
                .await
                .map_err(|_| StoreError::Timeout { after })??,
            None => request.await?,
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                url,
            })
        }
    }
}
