// ==========================================
// 禽场生产跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod cycle;
pub mod employee;
pub mod farm;
pub mod notification;
pub mod records;
pub mod types;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};

// 重导出核心类型
pub use cycle::{Cycle, FarmCycleEntry, FarmCycleUpdate, NewCycle, SelectedCycle};
pub use employee::Employee;
pub use farm::{FarmDirectory, DEFAULT_HOUSE_COUNT};
pub use notification::Notification;
pub use records::{
    CatchingDetailsRecord, CatchingHouse, ChicksGradingHouse, ChicksGradingRecord,
    ChicksReceivingHouse, ChicksReceivingRecord, CycleRecord, RecordMeta, SalmonellaHouse,
    SalmonellaRecord, WeeklyWeightHouse, WeeklyWeightRecord, MAX_HOUSE_FIELD_VALUE,
};
pub use types::{FarmCycleState, RecordCategory, SalmonellaResult, UserRole};
pub use user::{default_users, merge_with_defaults, User, UserRoster};

/// ISO-8601 UTC，毫秒精度（如 2024-03-01T08:00:00.000Z）
///
/// 批次 id 依赖该格式的字典序等于时间序
pub fn to_iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
