// ==========================================
// 禽场生产跟踪系统 - 导入层
// ==========================================
// 职责: CSV 导入（员工名册、雏鸡接收）
// 流程: 解析 -> 表头别名归一 -> 映射 -> 冲突检测 -> 写入
// ==========================================

pub mod chicks_receiving_importer;
pub mod conflict_handler;
pub mod employee_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod summary;

pub use chicks_receiving_importer::{ChicksReceivingImportOutcome, ChicksReceivingImporter};
pub use conflict_handler::ConflictHandler;
pub use employee_importer::{EmployeeImportOutcome, EmployeeImporter};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, HeaderAliases, CHICKS_RECEIVING_ALIASES, EMPLOYEE_ALIASES};
pub use file_parser::{CsvParser, ParsedCsv, RawRow};
pub use summary::ImportSummary;
