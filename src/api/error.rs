// ==========================================
// 禽场生产跟踪系统 - API 层错误类型
// ==========================================
// 职责: 汇总各层错误，转换为用户可读的消息
// ==========================================

use crate::engine::CycleError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据序列化失败: {0}")]
    SerializationError(String),

    #[error("文件读写失败: {0}")]
    FileError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::BlobCodecError(msg) => ApiError::SerializationError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 CycleError 转换
// ==========================================
impl From<CycleError> for ApiError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::CycleNotFound(_) | CycleError::FarmNotInCycle { .. } => {
                ApiError::NotFound(err.to_string())
            }
            CycleError::EmptyCycleNo | CycleError::NoFarms | CycleError::ValueOutOfRange { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
            CycleError::HouseOutOfRange { .. } => ApiError::BusinessRuleViolation(err.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::FileError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// OperationResult - 面向用户的操作结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// 将 API 结果折叠为操作结果，失败时消息取错误描述
    pub fn from_result<T>(result: ApiResult<T>, on_success: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self::ok(on_success(&value)),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_mapping() {
        let err: ApiError = CycleError::CycleNotFound("x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = CycleError::EmptyCycleNo.into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::MissingRequiredColumn("sapNo".to_string()).into();
        assert!(err.to_string().contains("sapNo"));
    }

    #[test]
    fn test_operation_result_from_result() {
        let ok = OperationResult::from_result(Ok::<_, ApiError>(3), |n| format!("完成 {}", n));
        assert!(ok.success);
        assert_eq!(ok.message, "完成 3");

        let failed = OperationResult::from_result::<()>(
            Err(ApiError::NotFound("批次".to_string())),
            |_| String::new(),
        );
        assert!(!failed.success);
        assert!(failed.message.contains("批次"));
    }
}
