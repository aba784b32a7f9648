// ==========================================
// 禽场生产跟踪系统 - 引擎层
// ==========================================
// 职责: 批次/记录对账规则，不访问存储
// 红线: Engine 不拼 SQL，所有变更返回新快照
// ==========================================

pub mod activity;
pub mod chicks_receiving;
pub mod cycle_registry;
pub mod error;
pub mod farm_data;
pub mod migration;
pub mod record_store;

// 重导出核心引擎
pub use activity::{
    ActivityAction, ActivityEvent, ActivityPublisher, NoOpActivityPublisher,
    RecordingActivityPublisher,
};
pub use chicks_receiving::{ChicksHouseEdit, DataQualityWarning};
pub use cycle_registry::CycleRegistry;
pub use error::{CycleError, CycleResult};
pub use farm_data::{FarmData, FarmDataCategory, UserMergePolicy, MAX_NOTIFICATIONS};
pub use migration::{MigrationReport, StoredCategory, StoredFarmEntry};
pub use record_store::{CycleRecordStore, UpsertOutcome};
