// ==========================================
// 禽场生产跟踪系统 - 按批次记录实体
// ==========================================
// 职责: 五类按 (场区, 批次) 存储的记录及其栋舍明细
// 约束: houses 长度 = 场区配置的栋舍数（10 或 12）
// ==========================================

use crate::domain::types::{RecordCategory, SalmonellaResult};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 栋舍计数字段（箱数、每箱只数、死亡数等）允许的最大绝对值
pub const MAX_HOUSE_FIELD_VALUE: i64 = 1_000_000_000;

/// 宽松整数：接受数字、数字字符串（含千分位逗号）、"12.0"、null
///
/// 旧版前端常把数值存为字符串
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_HOUSE_FIELD_VALUE as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| D::Error::custom(format!("无法解析为整数: {}", n))),
        Value::String(raw) => {
            let cleaned = raw.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(0);
            }
            cleaned
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    cleaned
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_HOUSE_FIELD_VALUE as f64)
                        .map(|f| f as i64)
                })
                .ok_or_else(|| D::Error::custom(format!("无法解析为整数: {}", raw)))
        }
        other => Err(D::Error::custom(format!("无法解析为整数: {}", other))),
    }
}

// ==========================================
// RecordMeta - 记录公共头
// ==========================================
/// 所有类别共享的批次标记字段
///
/// 旧版记录只有 cycleNo/cropNo，没有 cycleId
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_no: Option<String>,
}

// ==========================================
// CycleRecord Trait
// ==========================================
/// 按批次存储的记录
///
/// 实现者: ChicksReceivingRecord / WeeklyWeightRecord / ChicksGradingRecord /
/// CatchingDetailsRecord / SalmonellaRecord
pub trait CycleRecord: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync {
    /// 记录所属类别
    const CATEGORY: RecordCategory;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// 空记录工厂：固定栋舍数，其余字段为空
    fn empty(house_count: usize) -> Self;

    /// 栋舍明细条数
    fn house_count(&self) -> usize;

    fn cycle_id(&self) -> Option<&str> {
        self.meta().cycle_id.as_deref()
    }

    /// 打上批次标记（cycleId + cycleNo）
    fn stamp_cycle(&mut self, cycle_id: &str, cycle_no: &str) {
        let meta = self.meta_mut();
        meta.cycle_id = Some(cycle_id.to_string());
        meta.cycle_no = Some(cycle_no.to_string());
    }

    /// 写入记录仓前同步派生字段（默认无派生字段）
    fn normalize(&mut self) {}
}

macro_rules! impl_cycle_record {
    ($record:ty, $house:ty, $category:expr, { $($extra:tt)* }) => {
        impl CycleRecord for $record {
            const CATEGORY: RecordCategory = $category;

            $($extra)*

            fn meta(&self) -> &RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut RecordMeta {
                &mut self.meta
            }

            fn empty(house_count: usize) -> Self {
                Self {
                    houses: (1..=house_count as u32).map(<$house>::blank).collect(),
                    ..Default::default()
                }
            }

            fn house_count(&self) -> usize {
                self.houses.len()
            }
        }
    };
    ($record:ty, $house:ty, $category:expr) => {
        impl_cycle_record!($record, $house, $category, {});
    };
}

// ==========================================
// 雏鸡接收 (Chicks Receiving)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChicksReceivingRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatchery: Option<String>,
    #[serde(default)]
    pub houses: Vec<ChicksReceivingHouse>,
}

/// 单栋雏鸡接收明细
///
/// grossPlaced / netPlaced 为派生缓存字段，每次编辑后由 `recompute` 同步
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChicksReceivingHouse {
    pub house_no: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flock: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub no_of_box: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub per_box_chicks: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub extra_chicks: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub doa: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub gross_placed: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub net_placed: i64,
}

impl ChicksReceivingHouse {
    fn blank(house_no: u32) -> Self {
        Self {
            house_no,
            ..Default::default()
        }
    }

    /// grossPlaced = noOfBox × perBoxChicks + extraChicks; netPlaced = grossPlaced − doa
    ///
    /// 饱和运算，超大输入不会溢出
    pub fn recompute(&mut self) {
        self.gross_placed = self.expected_gross();
        self.net_placed = self.gross_placed.saturating_sub(self.doa);
    }

    /// 按源字段计算的入舍总数
    pub fn expected_gross(&self) -> i64 {
        self.no_of_box
            .saturating_mul(self.per_box_chicks)
            .saturating_add(self.extra_chicks)
    }

    /// DOA 超过入舍总数（netPlaced 为负）
    pub fn has_negative_net(&self) -> bool {
        self.net_placed < 0
    }
}

impl ChicksReceivingRecord {
    /// 重算所有栋舍的派生字段（批量粘贴/导入后调用）
    pub fn recompute_all(&mut self) {
        for house in &mut self.houses {
            house.recompute();
        }
    }

    /// netPlaced 为负的栋舍号列表
    pub fn negative_net_houses(&self) -> Vec<u32> {
        self.houses
            .iter()
            .filter(|h| h.has_negative_net())
            .map(|h| h.house_no)
            .collect()
    }

    pub fn total_net_placed(&self) -> i64 {
        self.houses
            .iter()
            .fold(0i64, |acc, h| acc.saturating_add(h.net_placed))
    }
}

impl_cycle_record!(
    ChicksReceivingRecord,
    ChicksReceivingHouse,
    RecordCategory::ChicksReceiving,
    {
        fn normalize(&mut self) {
            self.recompute_all();
        }
    }
);

// ==========================================
// 周称重 (Weekly Weight)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWeightRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub houses: Vec<WeeklyWeightHouse>,
}

/// 单栋各日龄平均体重（克）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyWeightHouse {
    pub house_no: u32,
    pub day7: Option<f64>,
    pub day14: Option<f64>,
    pub day21: Option<f64>,
    pub day28: Option<f64>,
    pub day35: Option<f64>,
}

impl WeeklyWeightHouse {
    fn blank(house_no: u32) -> Self {
        Self {
            house_no,
            ..Default::default()
        }
    }

    /// 最近一次录入的体重
    pub fn latest(&self) -> Option<f64> {
        self.day35
            .or(self.day28)
            .or(self.day21)
            .or(self.day14)
            .or(self.day7)
    }
}

impl_cycle_record!(
    WeeklyWeightRecord,
    WeeklyWeightHouse,
    RecordCategory::WeeklyWeight
);

// ==========================================
// 雏鸡分级 (Chicks Grading)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChicksGradingRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_date: Option<String>,
    #[serde(default)]
    pub houses: Vec<ChicksGradingHouse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChicksGradingHouse {
    pub house_no: u32,
    #[serde(deserialize_with = "lenient_i64")]
    pub grade_a: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub grade_b: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub grade_c: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl ChicksGradingHouse {
    fn blank(house_no: u32) -> Self {
        Self {
            house_no,
            ..Default::default()
        }
    }

    pub fn total(&self) -> i64 {
        self.grade_a
            .saturating_add(self.grade_b)
            .saturating_add(self.grade_c)
    }
}

impl_cycle_record!(
    ChicksGradingRecord,
    ChicksGradingHouse,
    RecordCategory::ChicksGrading
);

// ==========================================
// 抓鸡明细 (Catching Details)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchingDetailsRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub houses: Vec<CatchingHouse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatchingHouse {
    pub house_no: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catching_date: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub birds_caught: i64,
    pub avg_weight: Option<f64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub trucks: i64,
}

impl CatchingHouse {
    fn blank(house_no: u32) -> Self {
        Self {
            house_no,
            ..Default::default()
        }
    }
}

impl CatchingDetailsRecord {
    pub fn total_birds_caught(&self) -> i64 {
        self.houses
            .iter()
            .fold(0i64, |acc, h| acc.saturating_add(h.birds_caught))
    }
}

impl_cycle_record!(
    CatchingDetailsRecord,
    CatchingHouse,
    RecordCategory::CatchingDetails
);

// ==========================================
// 沙门氏菌检测 (Salmonella)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalmonellaRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub houses: Vec<SalmonellaHouse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalmonellaHouse {
    pub house_no: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_date: Option<String>,
    pub result: SalmonellaResult,
}

impl SalmonellaHouse {
    fn blank(house_no: u32) -> Self {
        Self {
            house_no,
            ..Default::default()
        }
    }
}

impl SalmonellaRecord {
    pub fn positive_houses(&self) -> Vec<u32> {
        self.houses
            .iter()
            .filter(|h| h.result == SalmonellaResult::Positive)
            .map(|h| h.house_no)
            .collect()
    }
}

impl_cycle_record!(SalmonellaRecord, SalmonellaHouse, RecordCategory::Salmonella);
