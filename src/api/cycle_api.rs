// ==========================================
// 禽场生产跟踪系统 - 批次 API
// ==========================================
// 职责: 批次生命周期（新建/修改/结束/重开）与派生查询
// 失败语义: 目标缺失时快照不变，返回错误（由调用方折叠为 success=false）
// ==========================================

use crate::api::error::ApiResult;
use crate::api::farm_state::FarmStateHandle;
use crate::domain::{Cycle, FarmCycleUpdate, NewCycle, Notification};
use crate::engine::ActivityAction;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CycleApi {
    state: Arc<FarmStateHandle>,
}

impl CycleApi {
    pub fn new(state: Arc<FarmStateHandle>) -> Self {
        Self { state }
    }

    // ==========================================
    // 变更
    // ==========================================

    /// 新建批次（id 取当前时刻）
    pub fn start_new_cycle(&self, new_cycle: NewCycle) -> ApiResult<Cycle> {
        self.start_new_cycle_at(new_cycle, Utc::now())
    }

    /// 新建批次
    ///
    /// # 参数
    /// - new_cycle: 批次号与各场区条目
    /// - now: 创建时刻（作为批次 id）
    ///
    /// # 说明
    /// 允许某场区同时存在两个进行中的条目，此时仅记录告警
    pub fn start_new_cycle_at(&self, new_cycle: NewCycle, now: DateTime<Utc>) -> ApiResult<Cycle> {
        self.state.commit(
            ActivityAction::StartNewCycle,
            |data| {
                let (cycles, cycle) = data.cycles.start_new_cycle(new_cycle, now)?;

                let doubled = cycles.farms_with_multiple_open_entries();
                if !doubled.is_empty() {
                    warn!(
                        cycle_id = %cycle.id,
                        farms = ?doubled,
                        "场区存在多个进行中的批次条目"
                    );
                }

                let mut next = data.with_cycles(cycles);
                next.push_notification(Notification::new(
                    &format!("批次 {} 已开始（{} 个场区）", cycle.cycle_no, cycle.farms.len()),
                    None,
                    now,
                ));
                info!(cycle_id = %cycle.id, cycle_no = %cycle.cycle_no, "新批次已创建");
                Ok((next, cycle))
            },
            |cycle| json!(cycle),
        )
    }

    /// 修改场区批次详情
    pub fn update_farm_cycle_details(
        &self,
        cycle_id: &str,
        farm_name: &str,
        update: FarmCycleUpdate,
    ) -> ApiResult<()> {
        self.state.commit(
            ActivityAction::UpdateFarmCycleDetails,
            |data| {
                let cycles = data
                    .cycles
                    .update_farm_cycle_details(cycle_id, farm_name, &update)?;
                Ok((data.with_cycles(cycles), ()))
            },
            |_| json!({ "cycleId": cycle_id, "farmName": farm_name, "details": update }),
        )
    }

    /// 结束场区批次
    pub fn finish_farm_cycle(&self, cycle_id: &str, farm_name: &str, finish_date: &str) -> ApiResult<()> {
        self.state.commit(
            ActivityAction::FinishFarmCycle,
            |data| {
                let cycles = data.cycles.finish_farm_cycle(cycle_id, farm_name, finish_date)?;
                let cycle_no = cycles
                    .find(cycle_id)
                    .map(|c| c.cycle_no.clone())
                    .unwrap_or_default();
                let mut next = data.with_cycles(cycles);
                next.push_notification(Notification::new(
                    &format!("{} 批次 {} 已于 {} 结束", farm_name, cycle_no, finish_date),
                    Some(farm_name),
                    Utc::now(),
                ));
                info!(cycle_id, farm = farm_name, finish_date, "场区批次已结束");
                Ok((next, ()))
            },
            |_| json!({ "cycleId": cycle_id, "farmName": farm_name, "finishDate": finish_date }),
        )
    }

    /// 重新打开场区批次；startDate / cropNo 保持不变
    pub fn reopen_farm_cycle(&self, cycle_id: &str, farm_name: &str) -> ApiResult<()> {
        self.state.commit(
            ActivityAction::ReopenFarmCycle,
            |data| {
                let cycles = data.cycles.reopen_farm_cycle(cycle_id, farm_name)?;
                let cycle_no = cycles
                    .find(cycle_id)
                    .map(|c| c.cycle_no.clone())
                    .unwrap_or_default();
                let mut next = data.with_cycles(cycles);
                next.push_notification(Notification::new(
                    &format!("{} 批次 {} 已重新打开", farm_name, cycle_no),
                    Some(farm_name),
                    Utc::now(),
                ));
                info!(cycle_id, farm = farm_name, "场区批次已重新打开");
                Ok((next, ()))
            },
            |_| json!({ "cycleId": cycle_id, "farmName": farm_name }),
        )
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list_cycles(&self) -> ApiResult<Vec<Cycle>> {
        self.state.read(|data| data.cycles.cycles().to_vec())
    }

    pub fn find_cycle(&self, cycle_id: &str) -> ApiResult<Option<Cycle>> {
        self.state.read(|data| data.cycles.find(cycle_id).cloned())
    }

    pub fn active_cycle(&self) -> ApiResult<Option<Cycle>> {
        self.state.read(|data| data.cycles.active_cycle().cloned())
    }

    pub fn cycles_for_farm(&self, farm_name: &str) -> ApiResult<Vec<Cycle>> {
        self.state.read(|data| {
            data.cycles
                .cycles_for_farm(farm_name)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn open_cycle_for_farm(&self, farm_name: &str) -> ApiResult<Option<Cycle>> {
        self.state
            .read(|data| data.cycles.open_cycle_for_farm(farm_name).cloned())
    }
}
