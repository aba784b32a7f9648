// ==========================================
// 禽场生产跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 按批次的数据对账（批次注册表 / 按批次记录仓 / 旧版迁移 / CSV 导入）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 状态 blob 读写
pub mod repository;

// 引擎层 - 批次与记录对账规则
pub mod engine;

// 导入层 - CSV
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与远程活动日志
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FarmCycleState, RecordCategory, SalmonellaResult, UserRole};

// 领域实体
pub use domain::{
    CatchingDetailsRecord, ChicksGradingRecord, ChicksReceivingRecord, Cycle, Employee,
    FarmCycleEntry, Notification, SalmonellaRecord, SelectedCycle, User, WeeklyWeightRecord,
};

// 引擎
pub use engine::{CycleRecordStore, CycleRegistry, FarmData, MigrationReport};

// API
pub use api::{AdminApi, BackupApi, CycleApi, ImportApi, OperationResult, RecordApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "禽场生产跟踪系统";
