// ==========================================
// 禽场生产跟踪系统 - 生产批次实体
// ==========================================
// 职责: 批次 (Cycle) 与场区批次条目 (FarmCycleEntry)
// 红线: 不含注册表逻辑,只描述数据形状
// ==========================================

use crate::domain::types::FarmCycleState;
use serde::{Deserialize, Serialize};

// ==========================================
// Cycle - 生产批次
// ==========================================
/// 一个生产批次，跨多个场区，每个场区独立开始/结束
///
/// `id` 为创建时刻的 ISO-8601 UTC 字符串，字典序即时间序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    pub cycle_no: String,
    #[serde(default)]
    pub farms: Vec<FarmCycleEntry>,
}

impl Cycle {
    /// 查找指定场区的条目
    pub fn farm_entry(&self, farm_name: &str) -> Option<&FarmCycleEntry> {
        self.farms.iter().find(|f| f.farm_name == farm_name)
    }

    /// 是否存在未结束的场区条目
    pub fn has_open_farm(&self) -> bool {
        self.farms.iter().any(|f| f.is_open())
    }

    /// 指定场区在本批次中是否仍在进行
    pub fn is_open_for(&self, farm_name: &str) -> bool {
        self.farm_entry(farm_name).map(|f| f.is_open()).unwrap_or(false)
    }
}

// ==========================================
// FarmCycleEntry - 场区批次条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmCycleEntry {
    pub farm_name: String,
    #[serde(default)]
    pub crop_no: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
}

impl FarmCycleEntry {
    pub fn new(farm_name: &str, crop_no: &str, start_date: &str) -> Self {
        Self {
            farm_name: farm_name.to_string(),
            crop_no: crop_no.to_string(),
            start_date: start_date.to_string(),
            finish_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.finish_date.is_none()
    }

    pub fn state(&self) -> FarmCycleState {
        if self.is_open() {
            FarmCycleState::Open
        } else {
            FarmCycleState::Finished
        }
    }
}

// ==========================================
// 输入/上下文类型
// ==========================================

/// 新建批次的输入（尚无 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCycle {
    pub cycle_no: String,
    pub farms: Vec<FarmCycleEntry>,
}

/// 场区批次详情的可修改字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmCycleUpdate {
    pub crop_no: String,
    pub start_date: String,
}

/// 当前选中的批次（upsert 的前置上下文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCycle {
    pub cycle_id: String,
    pub cycle_no: String,
}

impl SelectedCycle {
    pub fn of(cycle: &Cycle) -> Self {
        Self {
            cycle_id: cycle.id.clone(),
            cycle_no: cycle.cycle_no.clone(),
        }
    }
}
