// ==========================================
// 禽场生产跟踪系统 - 批次注册表
// ==========================================
// 职责: 批次创建、查询、场区批次生命周期变更
// 约束: 所有变更返回新快照（copy-on-write），不原地修改
// ==========================================

use crate::domain::{to_iso_millis, Cycle, FarmCycleUpdate, NewCycle};
use crate::engine::error::{CycleError, CycleResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CycleRegistry - 批次注册表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleRegistry {
    cycles: Vec<Cycle>,
}

impl CycleRegistry {
    pub fn new(cycles: Vec<Cycle>) -> Self {
        Self { cycles }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn find(&self, cycle_id: &str) -> Option<&Cycle> {
        self.cycles.iter().find(|c| c.id == cycle_id)
    }

    // ==========================================
    // 变更操作
    // ==========================================

    /// 新建批次
    ///
    /// # 参数
    /// - new_cycle: 批次号与场区条目（无 id）
    /// - now: 创建时刻，作为 id
    ///
    /// # 返回
    /// - (新注册表, 新批次)
    ///
    /// # 说明
    /// - 不检查同一场区是否已有进行中的条目（调用方负责）
    /// - 同一毫秒内重复创建时 id 顺延 1ms，保证唯一且有序
    pub fn start_new_cycle(
        &self,
        new_cycle: NewCycle,
        now: DateTime<Utc>,
    ) -> CycleResult<(Self, Cycle)> {
        if new_cycle.cycle_no.trim().is_empty() {
            return Err(CycleError::EmptyCycleNo);
        }
        if new_cycle.farms.is_empty() {
            return Err(CycleError::NoFarms);
        }

        let mut ts = now;
        let mut id = to_iso_millis(ts);
        while self.find(&id).is_some() {
            ts += Duration::milliseconds(1);
            id = to_iso_millis(ts);
        }

        let cycle = Cycle {
            id,
            cycle_no: new_cycle.cycle_no.trim().to_string(),
            farms: new_cycle.farms,
        };

        let mut cycles = self.cycles.clone();
        cycles.push(cycle.clone());
        Ok((Self { cycles }, cycle))
    }

    /// 修改场区批次详情（cropNo / startDate），其余条目不变
    pub fn update_farm_cycle_details(
        &self,
        cycle_id: &str,
        farm_name: &str,
        update: &FarmCycleUpdate,
    ) -> CycleResult<Self> {
        self.with_farm_entry(cycle_id, farm_name, |entry| {
            entry.crop_no = update.crop_no.clone();
            entry.start_date = update.start_date.clone();
        })
    }

    /// 结束场区批次（不校验 finishDate 晚于 startDate）
    pub fn finish_farm_cycle(
        &self,
        cycle_id: &str,
        farm_name: &str,
        finish_date: &str,
    ) -> CycleResult<Self> {
        self.with_farm_entry(cycle_id, farm_name, |entry| {
            entry.finish_date = Some(finish_date.to_string());
        })
    }

    /// 重新打开场区批次（移除 finishDate）
    pub fn reopen_farm_cycle(&self, cycle_id: &str, farm_name: &str) -> CycleResult<Self> {
        self.with_farm_entry(cycle_id, farm_name, |entry| {
            entry.finish_date = None;
        })
    }

    fn with_farm_entry<F>(&self, cycle_id: &str, farm_name: &str, apply: F) -> CycleResult<Self>
    where
        F: FnOnce(&mut crate::domain::FarmCycleEntry),
    {
        let cycle_idx = self
            .cycles
            .iter()
            .position(|c| c.id == cycle_id)
            .ok_or_else(|| CycleError::CycleNotFound(cycle_id.to_string()))?;

        let farm_idx = self.cycles[cycle_idx]
            .farms
            .iter()
            .position(|f| f.farm_name == farm_name)
            .ok_or_else(|| CycleError::FarmNotInCycle {
                cycle_id: cycle_id.to_string(),
                farm_name: farm_name.to_string(),
            })?;

        let mut cycles = self.cycles.clone();
        apply(&mut cycles[cycle_idx].farms[farm_idx]);
        Ok(Self { cycles })
    }

    // ==========================================
    // 派生查询（每次读取时重新计算）
    // ==========================================

    /// 当前活动批次：存在未结束场区的批次中 id 最大者
    pub fn active_cycle(&self) -> Option<&Cycle> {
        self.cycles
            .iter()
            .filter(|c| c.has_open_farm())
            .max_by(|a, b| a.id.cmp(&b.id))
    }

    /// 包含该场区的所有批次，按该场区 startDate 降序
    pub fn cycles_for_farm(&self, farm_name: &str) -> Vec<&Cycle> {
        let mut matched: Vec<(&Cycle, &str)> = self
            .cycles
            .iter()
            .filter_map(|c| c.farm_entry(farm_name).map(|e| (c, e.start_date.as_str())))
            .collect();
        matched.sort_by(|a, b| b.1.cmp(a.1));
        matched.into_iter().map(|(c, _)| c).collect()
    }

    /// 场区当前进行中的批次：含该场区未结束条目的批次中最新创建者
    pub fn open_cycle_for_farm(&self, farm_name: &str) -> Option<&Cycle> {
        self.cycles
            .iter()
            .filter(|c| c.is_open_for(farm_name))
            .max_by(|a, b| a.id.cmp(&b.id))
    }

    /// 按 (cycleNo, farmName, cropNo) 匹配批次（旧数据迁移用）
    pub fn find_by_numbers(&self, cycle_no: &str, farm_name: &str, crop_no: &str) -> Option<&Cycle> {
        self.cycles.iter().find(|c| {
            c.cycle_no == cycle_no
                && c
                    .farms
                    .iter()
                    .any(|f| f.farm_name == farm_name && f.crop_no == crop_no)
        })
    }

    /// 同时存在多个未结束条目的场区（约定违反，仅告警）
    pub fn farms_with_multiple_open_entries(&self) -> Vec<String> {
        let mut open_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for cycle in &self.cycles {
            for entry in cycle.farms.iter().filter(|f| f.is_open()) {
                *open_counts.entry(entry.farm_name.as_str()).or_default() += 1;
            }
        }
        open_counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(farm, _)| farm.to_string())
            .collect()
    }
}
