// ==========================================
// 禽场生产跟踪系统 - 员工名册导入
// ==========================================
// 主键: SAP 编号
// 流程: 解析 -> 映射 -> 冲突检测 -> 追加
// 策略: 缺主键/与已有重复/批内重复均跳过并计数
// ==========================================

use crate::domain::Employee;
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, EMPLOYEE_ALIASES};
use crate::importer::file_parser::{CsvParser, ParsedCsv};
use crate::importer::summary::ImportSummary;
use std::path::Path;
use tracing::{debug, info, warn};

/// 员工导入结果
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeImportOutcome {
    /// 追加新员工后的完整名册
    pub employees: Vec<Employee>,
    pub summary: ImportSummary,
}

pub struct EmployeeImporter {
    parser: CsvParser,
    mapper: FieldMapper,
    conflict_handler: ConflictHandler,
}

impl Default for EmployeeImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeImporter {
    pub fn new() -> Self {
        Self {
            parser: CsvParser,
            mapper: FieldMapper,
            conflict_handler: ConflictHandler,
        }
    }

    /// 从 CSV 文件导入
    pub fn import_file(&self, path: &Path, existing: &[Employee]) -> ImportResult<EmployeeImportOutcome> {
        info!(file = %path.display(), "开始导入员工名册");
        let parsed = self.parser.parse_file(path, &EMPLOYEE_ALIASES)?;
        self.import_parsed(parsed, existing)
    }

    /// 从 CSV 文本导入
    pub fn import_str(&self, content: &str, existing: &[Employee]) -> ImportResult<EmployeeImportOutcome> {
        let parsed = self.parser.parse_str(content, &EMPLOYEE_ALIASES)?;
        self.import_parsed(parsed, existing)
    }

    fn import_parsed(
        &self,
        parsed: ParsedCsv,
        existing: &[Employee],
    ) -> ImportResult<EmployeeImportOutcome> {
        parsed.require_columns(&["sapNo"])?;

        let mut summary = ImportSummary {
            total_rows: parsed.rows.len(),
            ..Default::default()
        };

        // 1. 映射
        let mut candidates: Vec<(usize, Employee)> = Vec::with_capacity(parsed.rows.len());
        for (row_number, row) in &parsed.rows {
            match self.mapper.map_employee(row, *row_number) {
                Ok(employee) => candidates.push((*row_number, employee)),
                Err(ImportError::PrimaryKeyMissing { row, field }) => {
                    debug!(row, field = %field, "缺少 SAP 编号，跳过");
                    summary.skipped_missing_key += 1;
                }
                Err(e) => return Err(e),
            }
        }

        // 2. 冲突检测
        let keys: Vec<(usize, String)> = candidates
            .iter()
            .map(|(row, e)| (*row, e.sap_no.clone()))
            .collect();
        let existing_keys: Vec<String> = existing.iter().map(|e| e.sap_no.clone()).collect();
        let skip = self.conflict_handler.rows_to_skip(&keys, &existing_keys);

        // 3. 追加
        let mut employees = existing.to_vec();
        for (row_number, employee) in candidates {
            if let Some(sap_no) = skip.get(&row_number) {
                summary.skipped_duplicates += 1;
                summary
                    .warnings
                    .push(format!("第 {} 行: SAP 编号 {} 重复，已跳过", row_number, sap_no));
                continue;
            }
            employees.push(employee);
            summary.processed_rows += 1;
        }

        if summary.skipped() > 0 {
            warn!(
                skipped_duplicates = summary.skipped_duplicates,
                skipped_missing_key = summary.skipped_missing_key,
                "员工导入存在跳过行"
            );
        }
        info!(
            total = summary.total_rows,
            processed = summary.processed_rows,
            "员工名册导入完成"
        );

        Ok(EmployeeImportOutcome { employees, summary })
    }
}
