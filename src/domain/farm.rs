// ==========================================
// 禽场生产跟踪系统 - 场区目录
// ==========================================
// 职责: 按场区名查询栋舍数（10 或 12）
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HOUSE_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmDirectory {
    pub default_house_count: usize,
    pub house_counts: BTreeMap<String, usize>,
}

impl FarmDirectory {
    pub fn new(default_house_count: usize, house_counts: BTreeMap<String, usize>) -> Self {
        Self {
            default_house_count,
            house_counts,
        }
    }

    /// 场区栋舍数；未配置的场区使用默认值
    pub fn house_count(&self, farm_name: &str) -> usize {
        self.house_counts
            .get(farm_name)
            .copied()
            .unwrap_or(self.default_house_count)
    }

    pub fn farm_names(&self) -> impl Iterator<Item = &str> {
        self.house_counts.keys().map(|s| s.as_str())
    }
}

impl Default for FarmDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_HOUSE_COUNT, BTreeMap::new())
    }
}
