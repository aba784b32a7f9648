// ==========================================
// 禽场生产跟踪系统 - 导入结果汇总
// ==========================================

use serde::{Deserialize, Serialize};

/// 单次导入的计数与告警
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// 数据行总数（不含空行）
    pub total_rows: usize,
    /// 成功写入的行
    pub processed_rows: usize,
    /// 主键重复跳过
    pub skipped_duplicates: usize,
    /// 主键缺失跳过
    pub skipped_missing_key: usize,
    /// 数据无效或无可写入批次而跳过
    pub skipped_invalid: usize,
    pub warnings: Vec<String>,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_duplicates + self.skipped_missing_key + self.skipped_invalid
    }

    /// 面向用户的结果消息
    ///
    /// # 参数
    /// - subject: 导入对象名称，如 "员工"
    pub fn message(&self, subject: &str) -> String {
        let mut message = format!("成功导入 {} 条{}记录", self.processed_rows, subject);
        if self.skipped_duplicates > 0 {
            message.push_str(&format!("，跳过 {} 条重复记录", self.skipped_duplicates));
        }
        if self.skipped_missing_key > 0 {
            message.push_str(&format!("，跳过 {} 条缺少主键的记录", self.skipped_missing_key));
        }
        if self.skipped_invalid > 0 {
            message.push_str(&format!("，跳过 {} 条无效记录", self.skipped_invalid));
        }
        message
    }
}
