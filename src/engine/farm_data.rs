// ==========================================
// 禽场生产跟踪系统 - 应用数据快照
// ==========================================
// 职责: 持久化 blob 的强类型形态（批次注册表 + 五类记录仓 + 外围数据）
// 约束: 快照不可变使用，变更通过克隆后替换字段完成
// 说明: 核心之外的类别（饲料订单、柴油订单、请假等）按原样透传
// ==========================================

use crate::domain::{
    default_users, merge_with_defaults, CatchingDetailsRecord, ChicksGradingRecord,
    ChicksReceivingRecord, CycleRecord, Employee, Notification, SalmonellaRecord, UserRoster,
    WeeklyWeightRecord,
};
use crate::engine::cycle_registry::CycleRegistry;
use crate::engine::migration::{into_store, MigrationReport, StoredCategory, StoredFarmEntry};
use crate::engine::record_store::CycleRecordStore;
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// 通知列表上限
pub const MAX_NOTIFICATIONS: usize = 200;

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

// ==========================================
// FarmData - 当前快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmData {
    pub users: UserRoster,
    pub all_farms_data: Value,
    pub all_farms_feed_orders: Value,
    #[serde(rename = "allFarmsChicksReceivingData")]
    pub chicks_receiving: CycleRecordStore<ChicksReceivingRecord>,
    #[serde(rename = "allFarmsWeeklyWeightData")]
    pub weekly_weight: CycleRecordStore<WeeklyWeightRecord>,
    #[serde(rename = "allFarmsChicksGradingData")]
    pub chicks_grading: CycleRecordStore<ChicksGradingRecord>,
    pub all_farms_feed_delivery_data: Value,
    #[serde(rename = "allFarmsCatchingDetailsData")]
    pub catching_details: CycleRecordStore<CatchingDetailsRecord>,
    #[serde(rename = "allFarmsSalmonellaData")]
    pub salmonella: CycleRecordStore<SalmonellaRecord>,
    pub catching_program_entries: Value,
    pub diesel_orders: Value,
    pub submitted_feed_orders: Value,
    pub cycles: CycleRegistry,
    pub notifications: Vec<Notification>,
    pub leave_requests: Value,
    pub septic_tank_requests: Value,
    pub employees: Vec<Employee>,
    pub feed_bulker_records: Value,
    pub vehicle_movement_logs: Value,
    pub in_charge_time_logs: Value,
    pub is_maintenance_mode: bool,
}

impl Default for FarmData {
    fn default() -> Self {
        Self {
            users: default_users(),
            all_farms_data: empty_object(),
            all_farms_feed_orders: empty_object(),
            chicks_receiving: CycleRecordStore::default(),
            weekly_weight: CycleRecordStore::default(),
            chicks_grading: CycleRecordStore::default(),
            all_farms_feed_delivery_data: empty_object(),
            catching_details: CycleRecordStore::default(),
            salmonella: CycleRecordStore::default(),
            catching_program_entries: empty_array(),
            diesel_orders: empty_array(),
            submitted_feed_orders: empty_array(),
            cycles: CycleRegistry::default(),
            notifications: Vec::new(),
            leave_requests: empty_array(),
            septic_tank_requests: empty_array(),
            employees: Vec::new(),
            feed_bulker_records: empty_array(),
            vehicle_movement_logs: empty_array(),
            in_charge_time_logs: empty_array(),
            is_maintenance_mode: false,
        }
    }
}

/// 用户名册的加载策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMergePolicy {
    /// 本地加载：按存储原样使用，缺失时用默认名册
    AsStored,
    /// 整包导入：合并到默认名册（导入值优先）
    MergeWithDefaults,
}

impl FarmData {
    /// 从持久化 JSON 解析（含旧版迁移）
    ///
    /// 仅 JSON 语法错误或顶层非对象时返回错误；单条格式错误的数据跳过并计入
    /// `MigrationReport::skipped_malformed`
    pub fn from_json(
        raw: &str,
        policy: UserMergePolicy,
    ) -> Result<(Self, MigrationReport), serde_json::Error> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(obj) => Ok(load_farm_data(obj, policy)),
            other => Err(serde_json::Error::custom(format!(
                "状态数据顶层应为对象，实际为 {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_cycles(&self, cycles: CycleRegistry) -> Self {
        Self {
            cycles,
            ..self.clone()
        }
    }

    pub fn find_employee(&self, sap_no: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.sap_no == sap_no)
    }

    /// 新通知置于列表最前；超出上限时先淘汰最旧的已读通知，仍超出则截断最旧的
    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            match self.notifications.iter().rposition(|n| n.read) {
                Some(idx) => {
                    self.notifications.remove(idx);
                }
                None => break,
            }
        }
        self.notifications.truncate(MAX_NOTIFICATIONS);
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

// ==========================================
// 类别访问 Trait
// ==========================================

/// 按记录类型定位 FarmData 中对应的记录仓
pub trait FarmDataCategory: CycleRecord {
    fn store(data: &FarmData) -> &CycleRecordStore<Self>;

    fn store_mut(data: &mut FarmData) -> &mut CycleRecordStore<Self>;
}

macro_rules! impl_farm_data_category {
    ($record:ty, $field:ident) => {
        impl FarmDataCategory for $record {
            fn store(data: &FarmData) -> &CycleRecordStore<Self> {
                &data.$field
            }

            fn store_mut(data: &mut FarmData) -> &mut CycleRecordStore<Self> {
                &mut data.$field
            }
        }
    };
}

impl_farm_data_category!(ChicksReceivingRecord, chicks_receiving);
impl_farm_data_category!(WeeklyWeightRecord, weekly_weight);
impl_farm_data_category!(ChicksGradingRecord, chicks_grading);
impl_farm_data_category!(CatchingDetailsRecord, catching_details);
impl_farm_data_category!(SalmonellaRecord, salmonella);

// ==========================================
// 宽松加载
// ==========================================
// 语法错误: 整体失败，由调用方处理
// 字段/记录格式错误: 跳过该条目并告警，其余数据照常加载
// ==========================================

type JsonObject = Map<String, Value>;

/// 按类型取顶层字段；缺失/null 返回 None，格式错误告警后返回 None
fn take_typed<T: DeserializeOwned>(
    obj: &mut JsonObject,
    key: &str,
    report: &mut MigrationReport,
) -> Option<T> {
    let value = obj.remove(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(e) => {
            warn!(key, error = %e, "字段格式错误，已忽略");
            report.skipped_malformed += 1;
            None
        }
    }
}

/// 原样透传的字段
fn take_opaque(obj: &mut JsonObject, key: &str, default: fn() -> Value) -> Value {
    obj.remove(key).filter(|v| !v.is_null()).unwrap_or_else(default)
}

/// 逐条解析数组，跳过格式错误的元素
fn take_list<T: DeserializeOwned>(
    obj: &mut JsonObject,
    key: &str,
    report: &mut MigrationReport,
) -> Option<Vec<T>> {
    match obj.remove(key)? {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(idx, item)| match serde_json::from_value(item) {
                    Ok(typed) => Some(typed),
                    Err(e) => {
                        warn!(key, index = idx, error = %e, "条目格式错误，已跳过");
                        report.skipped_malformed += 1;
                        None
                    }
                })
                .collect(),
        ),
        other => {
            warn!(key, kind = json_kind(&other), "字段应为数组，已忽略");
            report.skipped_malformed += 1;
            None
        }
    }
}

/// 逐项解析 key -> 对象 映射（用户名册）
fn take_map<T: DeserializeOwned>(
    obj: &mut JsonObject,
    key: &str,
    report: &mut MigrationReport,
) -> Option<BTreeMap<String, T>> {
    match obj.remove(key)? {
        Value::Null => None,
        Value::Object(entries) => Some(
            entries
                .into_iter()
                .filter_map(|(name, item)| match serde_json::from_value(item) {
                    Ok(typed) => Some((name, typed)),
                    Err(e) => {
                        warn!(key, entry = %name, error = %e, "条目格式错误，已跳过");
                        report.skipped_malformed += 1;
                        None
                    }
                })
                .collect(),
        ),
        other => {
            warn!(key, kind = json_kind(&other), "字段应为对象，已忽略");
            report.skipped_malformed += 1;
            None
        }
    }
}

/// 解析一个记录类别：每个场区按形状判定，格式错误的记录单独跳过
fn take_category<R: CycleRecord>(
    obj: &mut JsonObject,
    key: &str,
    report: &mut MigrationReport,
) -> StoredCategory<R> {
    let farms = match obj.remove(key) {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Object(farms)) => farms,
        Some(other) => {
            warn!(key, kind = json_kind(&other), "记录类别应为对象，已忽略");
            report.skipped_malformed += 1;
            return BTreeMap::new();
        }
    };

    let mut parse_record = |farm: &str, value: Value| -> Option<R> {
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(category = %R::CATEGORY, farm, error = %e, "记录格式错误，已跳过");
                report.skipped_malformed += 1;
                None
            }
        }
    };

    farms
        .into_iter()
        .map(|(farm, value)| {
            let entry = match value {
                Value::Null => StoredFarmEntry::Missing,
                Value::Array(items) => StoredFarmEntry::List(
                    items
                        .into_iter()
                        .filter_map(|item| parse_record(&farm, item))
                        .collect(),
                ),
                Value::Object(_) => match parse_record(&farm, value) {
                    Some(record) => StoredFarmEntry::Legacy(record),
                    None => StoredFarmEntry::List(Vec::new()),
                },
                other => {
                    parse_record(&farm, other);
                    StoredFarmEntry::List(Vec::new())
                }
            };
            (farm, entry)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn load_farm_data(
    mut obj: JsonObject,
    policy: UserMergePolicy,
) -> (FarmData, MigrationReport) {
    let mut report = MigrationReport::default();

    let cycles = CycleRegistry::new(take_list(&mut obj, "cycles", &mut report).unwrap_or_default());
    let users: Option<UserRoster> = take_map(&mut obj, "users", &mut report);
    let users = match (policy, users) {
        (UserMergePolicy::MergeWithDefaults, Some(users)) => merge_with_defaults(users),
        (UserMergePolicy::AsStored, Some(users)) if !users.is_empty() => users,
        _ => default_users(),
    };

    fn migrate<R: CycleRecord>(
        stored: StoredCategory<R>,
        cycles: &CycleRegistry,
        report: &mut MigrationReport,
    ) -> CycleRecordStore<R> {
        let (store, r) = into_store(stored, cycles);
        report.merge(r);
        store
    }

    let chicks_receiving = take_category(&mut obj, "allFarmsChicksReceivingData", &mut report);
    let weekly_weight = take_category(&mut obj, "allFarmsWeeklyWeightData", &mut report);
    let chicks_grading = take_category(&mut obj, "allFarmsChicksGradingData", &mut report);
    let catching_details = take_category(&mut obj, "allFarmsCatchingDetailsData", &mut report);
    let salmonella = take_category(&mut obj, "allFarmsSalmonellaData", &mut report);

    let data = FarmData {
        users,
        all_farms_data: take_opaque(&mut obj, "allFarmsData", empty_object),
        all_farms_feed_orders: take_opaque(&mut obj, "allFarmsFeedOrders", empty_object),
        chicks_receiving: migrate(chicks_receiving, &cycles, &mut report),
        weekly_weight: migrate(weekly_weight, &cycles, &mut report),
        chicks_grading: migrate(chicks_grading, &cycles, &mut report),
        all_farms_feed_delivery_data: take_opaque(&mut obj, "allFarmsFeedDeliveryData", empty_object),
        catching_details: migrate(catching_details, &cycles, &mut report),
        salmonella: migrate(salmonella, &cycles, &mut report),
        catching_program_entries: take_opaque(&mut obj, "catchingProgramEntries", empty_array),
        diesel_orders: take_opaque(&mut obj, "dieselOrders", empty_array),
        submitted_feed_orders: take_opaque(&mut obj, "submittedFeedOrders", empty_array),
        notifications: take_list(&mut obj, "notifications", &mut report).unwrap_or_default(),
        leave_requests: take_opaque(&mut obj, "leaveRequests", empty_array),
        septic_tank_requests: take_opaque(&mut obj, "septicTankRequests", empty_array),
        employees: take_list(&mut obj, "employees", &mut report).unwrap_or_default(),
        feed_bulker_records: take_opaque(&mut obj, "feedBulkerRecords", empty_array),
        vehicle_movement_logs: take_opaque(&mut obj, "vehicleMovementLogs", empty_array),
        in_charge_time_logs: take_opaque(&mut obj, "inChargeTimeLogs", empty_array),
        is_maintenance_mode: take_typed(&mut obj, "isMaintenanceMode", &mut report).unwrap_or(false),
        cycles,
    };

    if report.skipped_malformed > 0 {
        warn!(skipped = report.skipped_malformed, "部分数据格式错误，已跳过");
    }
    (data, report)
}
