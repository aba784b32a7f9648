// ==========================================
// 禽场生产跟踪系统 - API 层
// ==========================================
// 职责: 对外业务接口，所有变更经 FarmStateHandle 串行提交
// ==========================================

pub mod admin_api;
pub mod backup_api;
pub mod cycle_api;
pub mod error;
pub mod farm_state;
pub mod import_api;
pub mod record_api;

// 重导出核心类型
pub use admin_api::{AdminApi, AuthOutcome};
pub use backup_api::BackupApi;
pub use cycle_api::CycleApi;
pub use error::{ApiError, ApiResult, OperationResult};
pub use farm_state::FarmStateHandle;
pub use import_api::{ImportApi, ImportApiResponse};
pub use record_api::RecordApi;
