// ==========================================
// 禽场生产跟踪系统 - 共享状态句柄
// ==========================================
// 职责: 持有唯一的当前快照，串行化所有变更
// 提交流程: 构建新快照 -> 替换 -> 持久化（尽力）-> 活动上报
// 红线: 持久化失败只告警，不回滚内存快照
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::FarmDirectory;
use crate::engine::{ActivityAction, ActivityEvent, ActivityPublisher, FarmData};
use crate::repository::FarmDataRepository;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub struct FarmStateHandle {
    snapshot: Mutex<FarmData>,
    repo: Arc<FarmDataRepository>,
    publisher: Arc<dyn ActivityPublisher>,
    directory: FarmDirectory,
}

impl FarmStateHandle {
    pub fn new(
        initial: FarmData,
        repo: Arc<FarmDataRepository>,
        publisher: Arc<dyn ActivityPublisher>,
        directory: FarmDirectory,
    ) -> Self {
        Self {
            snapshot: Mutex::new(initial),
            repo,
            publisher,
            directory,
        }
    }

    pub fn directory(&self) -> &FarmDirectory {
        &self.directory
    }

    /// 获取快照锁
    ///
    /// 快照只在变更闭包成功返回后才被替换，锁中毒时其中仍是最后一次成功提交的数据
    fn lock(&self) -> MutexGuard<'_, FarmData> {
        self.snapshot.lock().unwrap_or_else(|poisoned| {
            warn!("状态锁已中毒，沿用最后一次成功提交的快照");
            poisoned.into_inner()
        })
    }

    /// 只读访问当前快照
    pub fn read<T>(&self, f: impl FnOnce(&FarmData) -> T) -> ApiResult<T> {
        let guard = self.lock();
        Ok(f(&guard))
    }

    /// 当前快照的副本
    pub fn snapshot(&self) -> ApiResult<FarmData> {
        self.read(|data| data.clone())
    }

    /// 提交一次变更
    ///
    /// # 参数
    /// - action: 活动类型
    /// - mutate: 基于当前快照构建新快照；返回错误时快照保持不变
    /// - payload: 由变更结果生成活动载荷
    pub fn commit<T>(
        &self,
        action: ActivityAction,
        mutate: impl FnOnce(&FarmData) -> ApiResult<(FarmData, T)>,
        payload: impl FnOnce(&T) -> serde_json::Value,
    ) -> ApiResult<T> {
        let mut guard = self.lock();
        let (next, value) = mutate(&guard)?;
        *guard = next;

        if let Err(e) = self.repo.save(&guard) {
            warn!(action = action.as_str(), error = %e, "状态持久化失败，内存快照已更新");
        }
        drop(guard);

        debug!(action = action.as_str(), "变更已提交");
        self.publisher.publish(ActivityEvent::new(action, payload(&value)));
        Ok(value)
    }
}
