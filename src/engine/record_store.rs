// ==========================================
// 禽场生产跟踪系统 - 按批次记录仓
// ==========================================
// 职责: 场区 -> 有序记录列表，每条记录带批次标记
// 约束: 每个 (farmName, cycleId) 至多一条记录
// 索引: farmName -> cycleId -> 列表下标，O(1) 查找
// ==========================================

use crate::domain::{CycleRecord, SelectedCycle};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// upsert 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOutcome {
    Inserted,        // 追加到列表末尾
    Replaced,        // 原位置替换
    NoCycleSelected, // 未选中批次，跳过
}

impl UpsertOutcome {
    pub fn applied(&self) -> bool {
        !matches!(self, UpsertOutcome::NoCycleSelected)
    }
}

// ==========================================
// CycleRecordStore - 单一数据类别的记录仓
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecordStore<R: CycleRecord> {
    farms: BTreeMap<String, Vec<R>>,
    index: HashMap<String, HashMap<String, usize>>,
}

impl<R: CycleRecord> Default for CycleRecordStore<R> {
    fn default() -> Self {
        Self {
            farms: BTreeMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: CycleRecord> CycleRecordStore<R> {
    /// 从 场区 -> 列表 构建，同步派生字段并重建索引
    ///
    /// 同一场区出现重复 cycleId 时，索引指向第一条
    pub fn from_farms(mut farms: BTreeMap<String, Vec<R>>) -> Self {
        for record in farms.values_mut().flat_map(|v| v.iter_mut()) {
            record.normalize();
        }
        let mut index: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (farm_name, records) in &farms {
            let farm_index = index.entry(farm_name.clone()).or_default();
            for (pos, record) in records.iter().enumerate() {
                if let Some(cycle_id) = record.cycle_id() {
                    farm_index.entry(cycle_id.to_string()).or_insert(pos);
                }
            }
        }
        Self { farms, index }
    }

    pub fn into_farms(self) -> BTreeMap<String, Vec<R>> {
        self.farms
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, farm_name: &str, cycle_id: &str) -> Option<&R> {
        let pos = *self.index.get(farm_name)?.get(cycle_id)?;
        self.farms.get(farm_name)?.get(pos)
    }

    /// 查询记录，缺失时返回该类别的空记录
    pub fn get_or_empty(&self, farm_name: &str, cycle_id: &str, house_count: usize) -> R {
        self.get(farm_name, cycle_id)
            .cloned()
            .unwrap_or_else(|| R::empty(house_count))
    }

    /// 场区全部记录（插入顺序）
    pub fn list_for_farm(&self, farm_name: &str) -> &[R] {
        self.farms.get(farm_name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn farm_names(&self) -> impl Iterator<Item = &str> {
        self.farms.keys().map(|s| s.as_str())
    }

    /// 记录总数
    pub fn len(&self) -> usize {
        self.farms.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 无 cycleId 的记录数（迁移遗留的孤儿记录）
    pub fn orphan_count(&self) -> usize {
        self.farms
            .values()
            .flat_map(|v| v.iter())
            .filter(|r| r.cycle_id().is_none())
            .count()
    }

    // ==========================================
    // 变更
    // ==========================================

    /// upsert，返回新快照
    ///
    /// # 参数
    /// - farm_name: 场区
    /// - selected: 当前选中的批次；None 时不做任何修改
    /// - record: 记录（cycleId/cycleNo 会被覆盖为选中批次，派生字段按源字段重算）
    pub fn upsert(
        &self,
        farm_name: &str,
        selected: Option<&SelectedCycle>,
        record: R,
    ) -> (Self, UpsertOutcome) {
        let Some(selected) = selected else {
            return (self.clone(), UpsertOutcome::NoCycleSelected);
        };
        let mut next = self.clone();
        let outcome = next.upsert_in_place(farm_name, selected, record);
        (next, outcome)
    }

    pub(crate) fn upsert_in_place(
        &mut self,
        farm_name: &str,
        selected: &SelectedCycle,
        mut record: R,
    ) -> UpsertOutcome {
        record.stamp_cycle(&selected.cycle_id, &selected.cycle_no);
        record.normalize();

        let list = self.farms.entry(farm_name.to_string()).or_default();
        let farm_index = self.index.entry(farm_name.to_string()).or_default();

        match farm_index.get(&selected.cycle_id) {
            Some(&pos) => {
                list[pos] = record;
                UpsertOutcome::Replaced
            }
            None => {
                list.push(record);
                farm_index.insert(selected.cycle_id.clone(), list.len() - 1);
                UpsertOutcome::Inserted
            }
        }
    }
}

impl<R: CycleRecord> Serialize for CycleRecordStore<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.farms.serialize(serializer)
    }
}

impl<'de, R: CycleRecord> Deserialize<'de> for CycleRecordStore<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let farms = BTreeMap::<String, Vec<R>>::deserialize(deserializer)?;
        Ok(Self::from_farms(farms))
    }
}
