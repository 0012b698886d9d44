//! 并发许可池 - 基础设施层
//!
//! 持有稀缺资源（同时进行中的 LLM 调用名额），只暴露"获取许可"的能力

use crate::error::{AppResult, BatchError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

/// 许可变化类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Acquired,
    Released,
}

/// 活跃数变化事件，用于界面或日志展示 "k/limit active"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityEvent {
    pub batch_number: usize,
    pub kind: ActivityKind,
    pub active: usize,
    pub limit: usize,
}

pub type ActivityCallback = Arc<dyn Fn(ActivityEvent) + Send + Sync>;

/// 默认回调：写一行日志
pub fn log_activity(event: ActivityEvent) {
    match event.kind {
        ActivityKind::Acquired => info!(
            "[active {}/{}] 正在处理批次 {}",
            event.active, event.limit, event.batch_number
        ),
        ActivityKind::Released => info!(
            "[active {}/{}] 批次 {} 释放并发许可",
            event.active, event.limit, event.batch_number
        ),
    }
}

/// 并发许可池
///
/// 职责：
/// - 限制同时进行中的批次调用数
/// - 维护活跃计数（只在同一把锁下修改）
/// - 不认识 Batch / Item，只认识批次号
#[derive(Clone)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    active: Arc<Mutex<usize>>,
    limit: usize,
    callback: ActivityCallback,
}

impl PermitPool {
    pub fn new(limit: usize) -> Self {
        Self::with_callback(limit, Arc::new(log_activity))
    }

    pub fn with_callback(limit: usize, callback: ActivityCallback) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            active: Arc::new(Mutex::new(0)),
            limit,
            callback,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 当前活跃的批次数
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// 等待并获取一个许可，返回的守卫在 drop 时归还许可
    pub async fn acquire(&self, batch_number: usize) -> AppResult<ActivePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BatchError::PermitClosed { batch_number })?;

        // 回调在锁内触发，事件顺序与计数变化一致
        {
            let mut count = self.active.lock();
            *count += 1;
            (self.callback)(ActivityEvent {
                batch_number,
                kind: ActivityKind::Acquired,
                active: *count,
                limit: self.limit,
            });
        }

        Ok(ActivePermit {
            _permit: permit,
            pool: self.clone(),
            batch_number,
        })
    }
}

/// 持有中的许可，drop 时减少活跃计数并归还名额（成功、失败或 panic 都一样）
pub struct ActivePermit {
    _permit: OwnedSemaphorePermit,
    pool: PermitPool,
    batch_number: usize,
}

impl Drop for ActivePermit {
    fn drop(&mut self) {
        let mut count = self.pool.active.lock();
        *count -= 1;
        (self.pool.callback)(ActivityEvent {
            batch_number: self.batch_number,
            kind: ActivityKind::Released,
            active: *count,
            limit: self.pool.limit,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_active_count_never_exceeds_limit() {
        let peak = Arc::new(Mutex::new(0usize));
        let peak_clone = peak.clone();
        let pool = PermitPool::with_callback(
            3,
            Arc::new(move |event: ActivityEvent| {
                assert!(event.active <= event.limit);
                let mut p = peak_clone.lock();
                *p = (*p).max(event.active);
            }),
        );

        let mut handles = Vec::new();
        for n in 1..=12 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let _permit = pool.acquire(n).await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(pool.active(), 0);
        assert!(*peak.lock() <= 3);
        assert!(*peak.lock() >= 1);
    }

    #[tokio::test]
    async fn test_permit_released_on_panic() {
        let pool = PermitPool::with_callback(1, Arc::new(|_| {}));
        let task_pool = pool.clone();
        let result = tokio::spawn(async move {
            let _permit = task_pool.acquire(1).await.unwrap();
            panic!("批次内部异常");
        })
        .await;
        assert!(result.is_err());
        assert_eq!(pool.active(), 0);

        // 名额已归还，可以再次获取
        let permit = tokio::time::timeout(Duration::from_secs(1), pool.acquire(2))
            .await
            .expect("许可应该已被归还")
            .unwrap();
        assert_eq!(pool.active(), 1);
        drop(permit);
        assert_eq!(pool.active(), 0);
    }
}
