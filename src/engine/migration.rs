// ==========================================
// 禽场生产跟踪系统 - 旧版数据迁移
// ==========================================
// 职责: 单记录/场区 (对象) -> 按批次列表 (数组)
// 时机: 加载时一次；整包导入时再独立执行一次
// 幂等: 已是列表形态的数据原样返回
// ==========================================

use crate::domain::CycleRecord;
use crate::engine::cycle_registry::CycleRegistry;
use crate::engine::record_store::CycleRecordStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// StoredFarmEntry - 单个场区的存储形态
// ==========================================
/// 反序列化时按形状判定：数组 / 对象 / null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredFarmEntry<R> {
    /// 当前形态：按批次的记录列表
    List(Vec<R>),
    /// 旧形态：每个场区一个对象，带 cycleNo/cropNo
    Legacy(R),
    /// 无数据
    Missing,
}

/// 某一数据类别的原始存储：场区 -> 形态
pub type StoredCategory<R> = BTreeMap<String, StoredFarmEntry<R>>;

/// 迁移统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// 成功关联到批次的旧记录
    pub matched: usize,
    /// 未匹配到批次、保留为孤儿的旧记录
    pub orphaned: usize,
    /// 无数据、转为空列表的场区
    pub empty_farms: usize,
    /// 格式错误、加载时跳过的条目（记录/批次/员工等）
    #[serde(default)]
    pub skipped_malformed: usize,
}

impl MigrationReport {
    pub fn migrated(&self) -> usize {
        self.matched + self.orphaned
    }

    pub fn merge(&mut self, other: MigrationReport) {
        self.matched += other.matched;
        self.orphaned += other.orphaned;
        self.empty_farms += other.empty_farms;
        self.skipped_malformed += other.skipped_malformed;
    }
}

/// 是否需要迁移：任一场区为非 null 的对象
pub fn needs_migration<R>(stored: &StoredCategory<R>) -> bool {
    stored
        .values()
        .any(|entry| matches!(entry, StoredFarmEntry::Legacy(_)))
}

/// 迁移单一数据类别，结果中所有场区均为列表形态
///
/// # 匹配规则
/// - cycle.cycleNo == legacy.cycleNo 且存在条目 farmName == 本场区 && cropNo == legacy.cropNo
/// - 匹配成功: 打上 cycleId，包装为单元素列表
/// - 匹配失败: 保留原对象（无 cycleId），包装为单元素列表
/// - null: 空列表
pub fn migrate_category<R: CycleRecord>(
    stored: StoredCategory<R>,
    registry: &CycleRegistry,
) -> (StoredCategory<R>, MigrationReport) {
    let mut report = MigrationReport::default();

    if !needs_migration(&stored) {
        let normalized = stored
            .into_iter()
            .map(|(farm, entry)| {
                let entry = match entry {
                    StoredFarmEntry::Missing => {
                        report.empty_farms += 1;
                        StoredFarmEntry::List(Vec::new())
                    }
                    other => other,
                };
                (farm, entry)
            })
            .collect();
        return (normalized, report);
    }

    let migrated = stored
        .into_iter()
        .map(|(farm_name, entry)| {
            let list = match entry {
                StoredFarmEntry::List(list) => list,
                StoredFarmEntry::Missing => {
                    report.empty_farms += 1;
                    Vec::new()
                }
                StoredFarmEntry::Legacy(mut record) => {
                    match match_legacy(&farm_name, &record, registry) {
                        Some(cycle_id) => {
                            record.meta_mut().cycle_id = Some(cycle_id);
                            report.matched += 1;
                        }
                        None => {
                            tracing::warn!(
                                farm = %farm_name,
                                category = %R::CATEGORY,
                                cycle_no = ?record.meta().cycle_no,
                                crop_no = ?record.meta().crop_no,
                                "旧版记录未匹配到批次，保留为孤儿记录"
                            );
                            report.orphaned += 1;
                        }
                    }
                    vec![record]
                }
            };
            (farm_name, StoredFarmEntry::List(list))
        })
        .collect();

    tracing::info!(
        category = %R::CATEGORY,
        matched = report.matched,
        orphaned = report.orphaned,
        "旧版数据迁移完成"
    );

    (migrated, report)
}

fn match_legacy<R: CycleRecord>(
    farm_name: &str,
    record: &R,
    registry: &CycleRegistry,
) -> Option<String> {
    let meta = record.meta();
    let cycle_no = meta.cycle_no.as_deref()?;
    let crop_no = meta.crop_no.as_deref()?;
    registry
        .find_by_numbers(cycle_no, farm_name, crop_no)
        .map(|c| c.id.clone())
}

/// 迁移并构建记录仓
pub fn into_store<R: CycleRecord>(
    stored: StoredCategory<R>,
    registry: &CycleRegistry,
) -> (CycleRecordStore<R>, MigrationReport) {
    let (migrated, report) = migrate_category(stored, registry);
    let farms = migrated
        .into_iter()
        .map(|(farm, entry)| match entry {
            StoredFarmEntry::List(list) => (farm, list),
            StoredFarmEntry::Legacy(record) => (farm, vec![record]),
            StoredFarmEntry::Missing => (farm, Vec::new()),
        })
        .collect();
    (CycleRecordStore::from_farms(farms), report)
}
