// ==========================================
// 禽场生产跟踪系统 - CSV 导入 API
// ==========================================
// 职责: 员工名册、雏鸡接收 CSV 导入，结果折叠为 {success, message} + 计数
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::farm_state::FarmStateHandle;
use crate::engine::{ActivityAction, DataQualityWarning};
use crate::importer::{ChicksReceivingImporter, EmployeeImporter, ImportSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// 导入 API 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    pub success: bool,
    pub message: String,
    /// 导入失败（文件/表头错误）时为默认值
    pub summary: ImportSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_warnings: Vec<DataQualityWarning>,
}

impl ImportApiResponse {
    fn completed(summary: ImportSummary, subject: &str, quality_warnings: Vec<DataQualityWarning>) -> Self {
        Self {
            success: true,
            message: summary.message(subject),
            summary,
            quality_warnings,
        }
    }

    fn failed(err: ApiError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            summary: ImportSummary::default(),
            quality_warnings: Vec::new(),
        }
    }

    pub fn processed_rows(&self) -> usize {
        self.summary.processed_rows
    }
}

/// CSV 来源
enum CsvSource<'a> {
    File(&'a Path),
    Text(&'a str),
}

pub struct ImportApi {
    state: Arc<FarmStateHandle>,
}

impl ImportApi {
    pub fn new(state: Arc<FarmStateHandle>) -> Self {
        Self { state }
    }

    // ==========================================
    // 员工名册
    // ==========================================

    pub fn import_employees_file(&self, path: &Path) -> ImportApiResponse {
        self.fold(self.import_employees(CsvSource::File(path)), "员工")
    }

    pub fn import_employees_str(&self, content: &str) -> ImportApiResponse {
        self.fold(self.import_employees(CsvSource::Text(content)), "员工")
    }

    fn import_employees(&self, source: CsvSource<'_>) -> ApiResult<(ImportSummary, Vec<DataQualityWarning>)> {
        let importer = EmployeeImporter::new();
        self.state.commit(
            ActivityAction::ImportEmployees,
            |data| {
                let outcome = match source {
                    CsvSource::File(path) => importer.import_file(path, &data.employees)?,
                    CsvSource::Text(content) => importer.import_str(content, &data.employees)?,
                };
                let mut next = data.clone();
                next.employees = outcome.employees;
                Ok((next, (outcome.summary, Vec::new())))
            },
            |(summary, _)| {
                json!({
                    "processedRows": summary.processed_rows,
                    "skippedDuplicates": summary.skipped_duplicates,
                    "skippedMissingKey": summary.skipped_missing_key,
                })
            },
        )
    }

    // ==========================================
    // 雏鸡接收
    // ==========================================

    pub fn import_chicks_receiving_file(&self, path: &Path) -> ImportApiResponse {
        self.fold(self.import_chicks_receiving(CsvSource::File(path)), "雏鸡接收")
    }

    pub fn import_chicks_receiving_str(&self, content: &str) -> ImportApiResponse {
        self.fold(self.import_chicks_receiving(CsvSource::Text(content)), "雏鸡接收")
    }

    fn import_chicks_receiving(
        &self,
        source: CsvSource<'_>,
    ) -> ApiResult<(ImportSummary, Vec<DataQualityWarning>)> {
        let importer = ChicksReceivingImporter::new(self.state.directory());
        self.state.commit(
            ActivityAction::ImportChicksReceiving,
            |data| {
                let outcome = match source {
                    CsvSource::File(path) => {
                        importer.import_file(path, &data.cycles, &data.chicks_receiving)?
                    }
                    CsvSource::Text(content) => {
                        importer.import_str(content, &data.cycles, &data.chicks_receiving)?
                    }
                };
                let mut next = data.clone();
                next.chicks_receiving = outcome.store;
                Ok((next, (outcome.summary, outcome.quality_warnings)))
            },
            |(summary, warnings)| {
                json!({
                    "processedRows": summary.processed_rows,
                    "skipped": summary.skipped(),
                    "negativeNetHouses": warnings.len(),
                })
            },
        )
    }

    fn fold(
        &self,
        result: ApiResult<(ImportSummary, Vec<DataQualityWarning>)>,
        subject: &str,
    ) -> ImportApiResponse {
        match result {
            Ok((summary, warnings)) => ImportApiResponse::completed(summary, subject, warnings),
            Err(err) => {
                warn!(subject, error = %err, "CSV 导入失败");
                ImportApiResponse::failed(err)
            }
        }
    }
}
