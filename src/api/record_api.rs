// ==========================================
// 禽场生产跟踪系统 - 批次记录 API
// ==========================================
// 职责: 五类按批次记录的 upsert / 查询，雏鸡接收的逐栋编辑与批量粘贴
// 前置: upsert 需要选中批次；未选中时静默跳过（不提交、不上报）
// ==========================================

use crate::api::error::ApiResult;
use crate::api::farm_state::FarmStateHandle;
use crate::domain::{ChicksReceivingRecord, CycleRecord, SelectedCycle};
use crate::engine::chicks_receiving::{apply_bulk_paste, apply_house_edit, quality_warnings};
use crate::engine::{
    ActivityAction, ChicksHouseEdit, DataQualityWarning, FarmData, FarmDataCategory, UpsertOutcome,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RecordApi {
    state: Arc<FarmStateHandle>,
}

impl RecordApi {
    pub fn new(state: Arc<FarmStateHandle>) -> Self {
        Self { state }
    }

    // ==========================================
    // 通用记录操作
    // ==========================================

    /// 写入/替换记录
    ///
    /// # 参数
    /// - farm_name: 场区
    /// - selected: 选中批次；None 时不做任何修改
    /// - record: 记录（cycleId/cycleNo 按选中批次覆盖）
    pub fn upsert<R: FarmDataCategory>(
        &self,
        farm_name: &str,
        selected: Option<&SelectedCycle>,
        record: R,
    ) -> ApiResult<UpsertOutcome> {
        let Some(selected) = selected else {
            debug!(farm = farm_name, category = %R::CATEGORY, "未选中批次，跳过保存");
            return Ok(UpsertOutcome::NoCycleSelected);
        };

        self.state.commit(
            ActivityAction::UpsertRecord,
            |data| {
                let mut next = data.clone();
                let outcome = R::store_mut(&mut next).upsert_in_place(farm_name, selected, record);
                Ok((next, outcome))
            },
            |outcome| {
                json!({
                    "category": R::CATEGORY.storage_key(),
                    "farmName": farm_name,
                    "cycleId": selected.cycle_id,
                    "outcome": outcome,
                })
            },
        )
    }

    /// 写入场区当前进行中的批次
    pub fn upsert_for_open_cycle<R: FarmDataCategory>(
        &self,
        farm_name: &str,
        record: R,
    ) -> ApiResult<UpsertOutcome> {
        let selected = self.selected_for_farm(farm_name)?;
        self.upsert(farm_name, selected.as_ref(), record)
    }

    pub fn get<R: FarmDataCategory>(&self, farm_name: &str, cycle_id: &str) -> ApiResult<Option<R>> {
        self.state
            .read(|data| R::store(data).get(farm_name, cycle_id).cloned())
    }

    /// 查询记录，缺失时返回按场区栋舍数初始化的空记录
    pub fn get_or_empty<R: FarmDataCategory>(&self, farm_name: &str, cycle_id: &str) -> ApiResult<R> {
        let house_count = self.state.directory().house_count(farm_name);
        self.state
            .read(|data| R::store(data).get_or_empty(farm_name, cycle_id, house_count))
    }

    pub fn list_for_farm<R: FarmDataCategory>(&self, farm_name: &str) -> ApiResult<Vec<R>> {
        self.state
            .read(|data| R::store(data).list_for_farm(farm_name).to_vec())
    }

    // ==========================================
    // 雏鸡接收
    // ==========================================

    /// 编辑单栋字段并保存
    ///
    /// # 返回
    /// - 该记录当前的数据质量告警（netPlaced 为负的栋舍）
    pub fn edit_chicks_house(
        &self,
        farm_name: &str,
        selected: &SelectedCycle,
        house_no: u32,
        edit: ChicksHouseEdit,
    ) -> ApiResult<Vec<DataQualityWarning>> {
        let house_count = self.state.directory().house_count(farm_name);
        self.state.commit(
            ActivityAction::UpsertRecord,
            |data| {
                let mut record =
                    data.chicks_receiving
                        .get_or_empty(farm_name, &selected.cycle_id, house_count);
                apply_house_edit(farm_name, &mut record, house_no, &edit)?;
                Ok(Self::save_chicks(data, farm_name, selected, record))
            },
            |_| {
                json!({
                    "category": ChicksReceivingRecord::CATEGORY.storage_key(),
                    "farmName": farm_name,
                    "cycleId": selected.cycle_id,
                    "houseNo": house_no,
                })
            },
        )
    }

    /// 批量粘贴：按顺序覆盖第 1..n 栋，超出部分忽略
    ///
    /// # 返回
    /// - (实际写入栋数, 数据质量告警)
    pub fn paste_chicks_houses(
        &self,
        farm_name: &str,
        selected: &SelectedCycle,
        edits: &[ChicksHouseEdit],
    ) -> ApiResult<(usize, Vec<DataQualityWarning>)> {
        let house_count = self.state.directory().house_count(farm_name);
        self.state.commit(
            ActivityAction::UpsertRecord,
            |data| {
                let mut record =
                    data.chicks_receiving
                        .get_or_empty(farm_name, &selected.cycle_id, house_count);
                let applied = apply_bulk_paste(&mut record, edits)?;
                if applied < edits.len() {
                    warn!(
                        farm = farm_name,
                        pasted = edits.len(),
                        applied,
                        "粘贴行数超过栋舍数，多余行已忽略"
                    );
                }
                let (next, warnings) = Self::save_chicks(data, farm_name, selected, record);
                Ok((next, (applied, warnings)))
            },
            |(applied, _)| {
                json!({
                    "category": ChicksReceivingRecord::CATEGORY.storage_key(),
                    "farmName": farm_name,
                    "cycleId": selected.cycle_id,
                    "pastedHouses": applied,
                })
            },
        )
    }

    /// 数据质量报告：netPlaced 为负的栋舍
    pub fn chicks_receiving_warnings(
        &self,
        farm_name: &str,
        cycle_id: &str,
    ) -> ApiResult<Vec<DataQualityWarning>> {
        self.state.read(|data| {
            data.chicks_receiving
                .get(farm_name, cycle_id)
                .map(|record| quality_warnings(farm_name, record))
                .unwrap_or_default()
        })
    }

    fn save_chicks(
        data: &FarmData,
        farm_name: &str,
        selected: &SelectedCycle,
        record: ChicksReceivingRecord,
    ) -> (FarmData, Vec<DataQualityWarning>) {
        let warnings = quality_warnings(farm_name, &record);
        for w in &warnings {
            warn!(farm = farm_name, house_no = w.house_no, net_placed = w.net_placed, "净入舍为负");
        }
        let mut next = data.clone();
        next.chicks_receiving
            .upsert_in_place(farm_name, selected, record);
        (next, warnings)
    }

    fn selected_for_farm(&self, farm_name: &str) -> ApiResult<Option<SelectedCycle>> {
        self.state.read(|data| {
            data.cycles
                .open_cycle_for_farm(farm_name)
                .map(SelectedCycle::of)
        })
    }
}
