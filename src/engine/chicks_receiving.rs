// ==========================================
// 禽场生产跟踪系统 - 雏鸡接收派生计算
// ==========================================
// 规则: grossPlaced = noOfBox × perBoxChicks + extraChicks
//       netPlaced   = grossPlaced − doa
// 红线: DOA 超过入舍数只告警，不拒绝
// ==========================================

use crate::domain::{ChicksReceivingHouse, ChicksReceivingRecord, MAX_HOUSE_FIELD_VALUE};
use crate::engine::error::{CycleError, CycleResult};
use serde::{Deserialize, Serialize};

/// 单栋字段编辑（None 表示不修改）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChicksHouseEdit {
    pub flock: Option<String>,
    pub no_of_box: Option<i64>,
    pub per_box_chicks: Option<i64>,
    pub extra_chicks: Option<i64>,
    pub doa: Option<i64>,
}

impl ChicksHouseEdit {
    /// 计数字段须在 ±MAX_HOUSE_FIELD_VALUE 内
    pub fn validate(&self) -> CycleResult<()> {
        let fields = [
            ("noOfBox", self.no_of_box),
            ("perBoxChicks", self.per_box_chicks),
            ("extraChicks", self.extra_chicks),
            ("doa", self.doa),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                if value.abs() > MAX_HOUSE_FIELD_VALUE {
                    return Err(CycleError::ValueOutOfRange {
                        field: field.to_string(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    fn apply_to(&self, house: &mut ChicksReceivingHouse) {
        if let Some(flock) = &self.flock {
            house.flock = Some(flock.clone());
        }
        if let Some(v) = self.no_of_box {
            house.no_of_box = v;
        }
        if let Some(v) = self.per_box_chicks {
            house.per_box_chicks = v;
        }
        if let Some(v) = self.extra_chicks {
            house.extra_chicks = v;
        }
        if let Some(v) = self.doa {
            house.doa = v;
        }
        house.recompute();
    }
}

/// 数据质量告警：netPlaced 为负
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityWarning {
    pub farm_name: String,
    pub house_no: u32,
    pub gross_placed: i64,
    pub doa: i64,
    pub net_placed: i64,
}

impl DataQualityWarning {
    pub fn message(&self) -> String {
        format!(
            "{} 第{}栋: DOA({}) 超过入舍数({})，净入舍为 {}",
            self.farm_name, self.house_no, self.doa, self.gross_placed, self.net_placed
        )
    }
}

/// 编辑单栋并重算该栋派生字段
pub fn apply_house_edit(
    farm_name: &str,
    record: &mut ChicksReceivingRecord,
    house_no: u32,
    edit: &ChicksHouseEdit,
) -> CycleResult<()> {
    edit.validate()?;
    let house_count = record.houses.len();
    let house = record
        .houses
        .iter_mut()
        .find(|h| h.house_no == house_no)
        .ok_or_else(|| CycleError::HouseOutOfRange {
            farm_name: farm_name.to_string(),
            house_no,
            house_count,
        })?;
    edit.apply_to(house);
    Ok(())
}

/// 批量粘贴：按顺序覆盖第 1..n 栋，超出栋舍数的行忽略
///
/// 任一行数值越界时整体拒绝，记录不变
///
/// # 返回
/// - 实际写入的栋数
pub fn apply_bulk_paste(
    record: &mut ChicksReceivingRecord,
    edits: &[ChicksHouseEdit],
) -> CycleResult<usize> {
    for edit in edits {
        edit.validate()?;
    }
    let applied = edits.len().min(record.houses.len());
    for (house, edit) in record.houses.iter_mut().zip(edits.iter()) {
        edit.apply_to(house);
    }
    record.recompute_all();
    Ok(applied)
}

/// 收集 netPlaced 为负的栋舍
pub fn quality_warnings(farm_name: &str, record: &ChicksReceivingRecord) -> Vec<DataQualityWarning> {
    record
        .houses
        .iter()
        .filter(|h| h.has_negative_net())
        .map(|h| DataQualityWarning {
            farm_name: farm_name.to_string(),
            house_no: h.house_no,
            gross_placed: h.gross_placed,
            doa: h.doa,
            net_placed: h.net_placed,
        })
        .collect()
}

/// 检查派生字段是否与源字段一致
pub fn derived_fields_consistent(record: &ChicksReceivingRecord) -> bool {
    record.houses.iter().all(|h| {
        let gross = h.expected_gross();
        h.gross_placed == gross && h.net_placed == gross.saturating_sub(h.doa)
    })
}
