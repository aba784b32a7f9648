// ==========================================
// 禽场生产跟踪系统 - 冲突处理器
// ==========================================
// 职责: 检测同批次内/与已有数据重复的主键
// 策略: 保留首次出现，后续重复行跳过并计数
// ==========================================

use std::collections::{HashMap, HashSet};

pub struct ConflictHandler;

impl ConflictHandler {
    /// 检测同批次内重复主键
    ///
    /// # 参数
    /// - keys: (行号, 主键)
    ///
    /// # 返回
    /// - Vec<(行号, 主键)>: 重复记录列表（不包括第一次出现）
    pub fn detect_duplicates(&self, keys: &[(usize, String)]) -> Vec<(usize, String)> {
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (row_number, key) in keys {
            if first_occurrence.contains_key(key.as_str()) {
                duplicates.push((*row_number, key.clone()));
            } else {
                first_occurrence.insert(key.as_str(), *row_number);
            }
        }

        duplicates
    }

    /// 检测与已有数据重复的主键
    ///
    /// # 参数
    /// - keys: (行号, 主键)
    /// - existing_keys: 已存在的主键
    pub fn detect_existing_duplicates(
        &self,
        keys: &[(usize, String)],
        existing_keys: &[String],
    ) -> Vec<(usize, String)> {
        let existing: HashSet<&str> = existing_keys.iter().map(|k| k.as_str()).collect();
        keys.iter()
            .filter(|(_, key)| existing.contains(key.as_str()))
            .cloned()
            .collect()
    }

    /// 合并两类重复，返回需跳过的行号集合
    pub fn rows_to_skip(
        &self,
        keys: &[(usize, String)],
        existing_keys: &[String],
    ) -> HashMap<usize, String> {
        let against_existing = self.detect_existing_duplicates(keys, existing_keys);
        let skipped_rows: HashSet<usize> = against_existing.iter().map(|(row, _)| *row).collect();

        // 已与存量冲突的行不参与批内首次出现的判定
        let remaining: Vec<(usize, String)> = keys
            .iter()
            .filter(|(row, _)| !skipped_rows.contains(row))
            .cloned()
            .collect();

        against_existing
            .into_iter()
            .chain(self.detect_duplicates(&remaining))
            .collect()
    }
}
