// ==========================================
// 禽场生产跟踪系统 - 配置层
// ==========================================
// 职责: 系统配置管理（存储键、远程日志、场区栋舍数）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod farm_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use farm_config_trait::FarmConfigReader;
