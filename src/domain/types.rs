// ==========================================
// 禽场生产跟踪系统 - 领域类型定义
// ==========================================
// 职责: 批次状态、数据类别、用户角色等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 场区批次状态 (Farm Cycle State)
// ==========================================
// 状态机: Open -> Finished (finish), Finished -> Open (reopen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FarmCycleState {
    Open,     // 进行中
    Finished, // 已结束
}

impl fmt::Display for FarmCycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FarmCycleState::Open => write!(f, "OPEN"),
            FarmCycleState::Finished => write!(f, "FINISHED"),
        }
    }
}

// ==========================================
// 按批次存储的数据类别 (Record Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordCategory {
    ChicksReceiving, // 雏鸡接收
    WeeklyWeight,    // 周称重
    ChicksGrading,   // 雏鸡分级
    CatchingDetails, // 抓鸡明细
    Salmonella,      // 沙门氏菌检测
}

impl RecordCategory {
    pub const ALL: [RecordCategory; 5] = [
        RecordCategory::ChicksReceiving,
        RecordCategory::WeeklyWeight,
        RecordCategory::ChicksGrading,
        RecordCategory::CatchingDetails,
        RecordCategory::Salmonella,
    ];

    /// 持久化 blob 中对应的顶层键
    pub fn storage_key(&self) -> &'static str {
        match self {
            RecordCategory::ChicksReceiving => "allFarmsChicksReceivingData",
            RecordCategory::WeeklyWeight => "allFarmsWeeklyWeightData",
            RecordCategory::ChicksGrading => "allFarmsChicksGradingData",
            RecordCategory::CatchingDetails => "allFarmsCatchingDetailsData",
            RecordCategory::Salmonella => "allFarmsSalmonellaData",
        }
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordCategory::ChicksReceiving => write!(f, "CHICKS_RECEIVING"),
            RecordCategory::WeeklyWeight => write!(f, "WEEKLY_WEIGHT"),
            RecordCategory::ChicksGrading => write!(f, "CHICKS_GRADING"),
            RecordCategory::CatchingDetails => write!(f, "CATCHING_DETAILS"),
            RecordCategory::Salmonella => write!(f, "SALMONELLA"),
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Admin,      // 管理员
    Supervisor, // 主管
    User,       // 场区用户
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Supervisor => write!(f, "supervisor"),
            UserRole::User => write!(f, "user"),
        }
    }
}

// ==========================================
// 沙门氏菌检测结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SalmonellaResult {
    #[default]
    Pending,  // 待出结果
    Negative, // 阴性
    Positive, // 阳性
}

impl fmt::Display for SalmonellaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalmonellaResult::Pending => write!(f, "pending"),
            SalmonellaResult::Negative => write!(f, "negative"),
            SalmonellaResult::Positive => write!(f, "positive"),
        }
    }
}
