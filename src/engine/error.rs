// ==========================================
// 禽场生产跟踪系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 批次注册表错误
///
/// 所有变更操作在目标缺失时统一返回错误，由调用方保留旧快照（即 no-op）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("批次不存在: cycle_id={0}")]
    CycleNotFound(String),

    #[error("批次中不存在该场区: cycle_id={cycle_id}, farm={farm_name}")]
    FarmNotInCycle { cycle_id: String, farm_name: String },

    #[error("批次号不能为空")]
    EmptyCycleNo,

    #[error("批次至少需要一个场区")]
    NoFarms,

    #[error("栋舍数值超出允许范围: field={field}, value={value}")]
    ValueOutOfRange { field: String, value: i64 },

    #[error("栋舍号超出范围: farm={farm_name}, house={house_no}, 栋舍数={house_count}")]
    HouseOutOfRange {
        farm_name: String,
        house_no: u32,
        house_count: usize,
    },
}

pub type CycleResult<T> = Result<T, CycleError>;
