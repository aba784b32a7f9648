// ==========================================
// 禽场生产跟踪系统 - 备份导入导出 API
// ==========================================
// 导出: 当前快照的格式化 JSON
// 导入: 解析 -> 旧版迁移 -> 用户名册合并默认值 -> 整体替换快照
// 红线: 解析失败时快照不变，返回 success=false
// ==========================================

use crate::api::error::{ApiResult, OperationResult};
use crate::api::farm_state::FarmStateHandle;
use crate::engine::{ActivityAction, FarmData, UserMergePolicy};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BackupApi {
    state: Arc<FarmStateHandle>,
}

impl BackupApi {
    pub fn new(state: Arc<FarmStateHandle>) -> Self {
        Self { state }
    }

    /// 导出为格式化 JSON
    pub fn export_json(&self) -> ApiResult<String> {
        let json = self.state.read(|data| data.to_json_pretty())??;
        Ok(json)
    }

    /// 导出到文件
    pub fn export_to_file(&self, path: &Path) -> ApiResult<()> {
        let json = self.export_json()?;
        std::fs::write(path, json)?;
        info!(file = %path.display(), "备份已导出");
        Ok(())
    }

    /// 从 JSON 文本导入
    pub fn import_json(&self, raw: &str) -> OperationResult {
        let (data, report) = match FarmData::from_json(raw, UserMergePolicy::MergeWithDefaults) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "备份文件解析失败，保留当前数据");
                return OperationResult::failed(format!("备份文件解析失败: {}", e));
            }
        };

        let cycle_count = data.cycles.len();
        let result = self.state.commit(
            ActivityAction::ImportBackup,
            move |_| Ok((data, report)),
            |report| {
                json!({
                    "cycles": cycle_count,
                    "migratedRecords": report.migrated(),
                    "orphanedRecords": report.orphaned,
                    "skippedMalformed": report.skipped_malformed,
                })
            },
        );

        OperationResult::from_result(result, |report| {
            info!(cycles = cycle_count, migrated = report.migrated(), "备份导入完成");
            let mut notes = Vec::new();
            if report.orphaned > 0 {
                notes.push(format!("{} 条旧版记录未匹配到批次，已保留", report.orphaned));
            }
            if report.skipped_malformed > 0 {
                notes.push(format!("{} 条格式错误的数据已跳过", report.skipped_malformed));
            }
            if notes.is_empty() {
                "数据导入成功".to_string()
            } else {
                format!("数据导入成功（{}）", notes.join("；"))
            }
        })
    }

    /// 从文件导入
    pub fn import_from_file(&self, path: &Path) -> OperationResult {
        match std::fs::read_to_string(path) {
            Ok(raw) => self.import_json(&raw),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "备份文件读取失败");
                OperationResult::failed(format!("备份文件读取失败: {}", e))
            }
        }
    }
}
