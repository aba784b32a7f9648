// ==========================================
// 禽场生产跟踪系统 - 通知
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
}

impl Notification {
    pub fn new(message: &str, farm_name: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            timestamp: crate::domain::to_iso_millis(now),
            read: false,
            farm_name: farm_name.map(|s| s.to_string()),
        }
    }
}
