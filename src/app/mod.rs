// ==========================================
// 禽场生产跟踪系统 - 应用层
// ==========================================
// 职责: 组装各层，提供远程活动日志实现
// ==========================================

pub mod remote_log;
pub mod state;

// 重导出
pub use remote_log::HttpActivityPublisher;
pub use state::{get_default_db_path, AppState};
