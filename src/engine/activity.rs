// ==========================================
// 禽场生产跟踪系统 - 活动事件发布
// ==========================================
// 职责: 定义活动日志发布 trait（依赖倒置）
// 说明: 引擎层只定义 trait，应用层提供 HTTP 实现
// 语义: fire-and-forget，至多一次，无确认，失败不上抛
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// 活动类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    StartNewCycle,
    UpdateFarmCycleDetails,
    FinishFarmCycle,
    ReopenFarmCycle,
    UpsertRecord,
    ImportEmployees,
    ImportChicksReceiving,
    ImportBackup,
    UpsertUser,
    RemoveUser,
    SetMaintenanceMode,
    PushNotification,
    MarkNotificationRead,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::StartNewCycle => "START_NEW_CYCLE",
            ActivityAction::UpdateFarmCycleDetails => "UPDATE_FARM_CYCLE_DETAILS",
            ActivityAction::FinishFarmCycle => "FINISH_FARM_CYCLE",
            ActivityAction::ReopenFarmCycle => "REOPEN_FARM_CYCLE",
            ActivityAction::UpsertRecord => "UPSERT_RECORD",
            ActivityAction::ImportEmployees => "IMPORT_EMPLOYEES",
            ActivityAction::ImportChicksReceiving => "IMPORT_CHICKS_RECEIVING",
            ActivityAction::ImportBackup => "IMPORT_BACKUP",
            ActivityAction::UpsertUser => "UPSERT_USER",
            ActivityAction::RemoveUser => "REMOVE_USER",
            ActivityAction::SetMaintenanceMode => "SET_MAINTENANCE_MODE",
            ActivityAction::PushNotification => "PUSH_NOTIFICATION",
            ActivityAction::MarkNotificationRead => "MARK_NOTIFICATION_READ",
        }
    }
}

/// 活动事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// 本地追踪用，不随请求发送
    pub event_id: String,
    pub action: ActivityAction,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(action: ActivityAction, payload: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            action,
            payload,
            occurred_at: Utc::now(),
        }
    }

    /// 远程日志请求体: {action, payload}
    pub fn wire_body(&self) -> serde_json::Value {
        serde_json::json!({
            "action": self.action.as_str(),
            "payload": self.payload,
        })
    }
}

// ==========================================
// 发布 Trait
// ==========================================

/// 活动发布者
///
/// 实现不得阻塞调用方，也不得返回错误
pub trait ActivityPublisher: Send + Sync {
    fn publish(&self, event: ActivityEvent);
}

/// 空操作发布者（未配置远程日志时使用）
#[derive(Debug, Clone, Default)]
pub struct NoOpActivityPublisher;

impl ActivityPublisher for NoOpActivityPublisher {
    fn publish(&self, event: ActivityEvent) {
        tracing::debug!(
            event_id = %event.event_id,
            action = event.action.as_str(),
            "NoOpActivityPublisher: 跳过活动上报"
        );
    }
}

/// 内存记录发布者，便于校验上报内容
#[derive(Debug, Clone, Default)]
pub struct RecordingActivityPublisher {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl RecordingActivityPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<ActivityAction> {
        self.events().into_iter().map(|e| e.action).collect()
    }
}

impl ActivityPublisher for RecordingActivityPublisher {
    fn publish(&self, event: ActivityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
