//! 批量任务句柄
//!
//! 调用方通过句柄读取快照、订阅进度和请求取消。
//! 取消标志由句柄和任务共同持有，显式传入执行循环。

use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::BatchError;
use crate::models::BatchRun;

/// 取消标志
///
/// 协作式：只阻止下一个阶段开始，不会中断正在进行的生成请求。
#[derive(Debug, Clone)]
pub struct CancelFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// 等到被取消为止
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // 发送端由自身持有，不会关闭
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// 批量任务句柄
#[derive(Debug)]
pub struct BatchHandle {
    book: String,
    snapshots: watch::Receiver<BatchRun>,
    cancel: CancelFlag,
    task: JoinHandle<BatchRun>,
}

impl BatchHandle {
    pub(crate) fn new(
        book: String,
        snapshots: watch::Receiver<BatchRun>,
        cancel: CancelFlag,
        task: JoinHandle<BatchRun>,
    ) -> Self {
        Self {
            book,
            snapshots,
            cancel,
            task,
        }
    }

    /// 书卷标准标识
    pub fn book(&self) -> &str {
        &self.book
    }

    /// 当前快照
    pub fn snapshot(&self) -> BatchRun {
        self.snapshots.borrow().clone()
    }

    /// 快照流
    ///
    /// 先给出当前快照，之后每次变化给出一次（连续变化可能合并），
    /// 给出终止快照后结束。
    pub fn snapshots(&self) -> impl Stream<Item = BatchRun> + Send + 'static {
        let rx = self.snapshots.clone();

        stream::unfold(Some((rx, true)), |state| async move {
            let Some((mut rx, first)) = state else {
                return None;
            };

            if !first && rx.changed().await.is_err() {
                // 任务已结束：若最后的值是终止快照且尚未给出，补发一次
                let run = rx.borrow_and_update().clone();
                return if run.finished { Some((run, None)) } else { None };
            }

            let run = rx.borrow_and_update().clone();
            let next = if run.finished { None } else { Some((rx, false)) };
            Some((run, next))
        })
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 取消标志的副本（可交给信号处理等其他任务）
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 等待任务结束，返回最终快照
    pub async fn join(self) -> Result<BatchRun, BatchError> {
        self.task
            .await
            .map_err(|e| BatchError::TaskFailed(e.to_string()))
    }
}
