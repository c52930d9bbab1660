// ==========================================
// 营地勤务排班系统 - 覆盖一致性校验器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.5 校验器
// ==========================================
// 职责: 配对勤务在其人员模式匹配的每个开展日都必须出现,
//       且同模式各日人员一致; 缺口优先延伸既有人员覆盖,
//       否则招募同模式替补
// 红线: 不得把人从角色配比勤务上撤下 (保护策略统一判定)
// ==========================================

use crate::domain::types::{pattern_for_day, AssignmentKind};
use crate::domain::{Assignment, DutyCatalog, RosterState};
use crate::engine::DutyProtectionPolicy;
use chrono::Weekday;
use tracing::{error, info, instrument};

// ==========================================
// CoverageValidator - 覆盖一致性校验器
// ==========================================

pub struct CoverageValidator;

impl CoverageValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验并修复配对勤务覆盖
    ///
    /// 预期人员集合 = 对该勤务持有钉住分配的人员
    /// (招募来的替补不改变预期集合, 保证幂等)
    ///
    /// # 返回
    /// 修复次数 (幂等: 对自身输出重跑返回 0)
    #[instrument(skip_all)]
    pub fn validate(
        &self,
        state: &mut RosterState,
        _catalog: &DutyCatalog,
        policy: &DutyProtectionPolicy,
        days: &[Weekday],
    ) -> u32 {
        let mut repairs = 0;
        for &duty_id in policy.paired_duty_ids().iter() {
            repairs += self.repair_duty(state, policy, duty_id, days);
        }
        if repairs > 0 {
            info!(repairs, "覆盖一致性校验完成");
        }
        repairs
    }

    fn repair_duty(
        &self,
        state: &mut RosterState,
        policy: &DutyProtectionPolicy,
        duty_id: i64,
        days: &[Weekday],
    ) -> u32 {
        // 预期人员: 对该勤务持有钉住分配者
        let expected: Vec<i64> = {
            let mut ids: Vec<i64> = state
                .assignments
                .iter()
                .filter(|a| a.duty_id == Some(duty_id) && a.kind.is_pinned())
                .map(|a| a.staff_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let mut repairs = 0;
        for staff_id in expected {
            let pattern = match state.find_staff(staff_id) {
                Some(s) => s.pattern,
                None => continue,
            };
            for &day in days {
                if pattern_for_day(day) != pattern || policy.is_all_staff_day(day) {
                    continue;
                }
                let covered = state
                    .assignments
                    .iter()
                    .any(|a| a.day == day && a.staff_id == staff_id && a.duty_id == Some(duty_id));
                if covered {
                    continue;
                }
                if self.fill_gap(state, policy, duty_id, day, staff_id) {
                    repairs += 1;
                }
            }
        }
        repairs
    }

    /// 补一个 (day, staff) 覆盖缺口
    ///
    /// 1. 当日无任何分配 → 直接补记录
    /// 2. 当日分配在可换勤务上且未锁定 → 改派回配对勤务
    /// 3. 当日分配受保护 → 招募同模式替补 (优先多人勤务)
    fn fill_gap(
        &self,
        state: &mut RosterState,
        policy: &DutyProtectionPolicy,
        duty_id: i64,
        day: Weekday,
        staff_id: i64,
    ) -> bool {
        let existing = state
            .assignments
            .iter()
            .position(|a| a.day == day && a.staff_id == staff_id);

        match existing {
            None => {
                state.push_assignment(Assignment::new(
                    day,
                    staff_id,
                    duty_id,
                    AssignmentKind::Normal,
                ));
                info!(day = %day, duty_id, staff_id, "覆盖修复: 补齐缺失分配");
                true
            }
            Some(idx) => {
                let movable = {
                    let a = &state.assignments[idx];
                    a.duty_id
                        .map(|d| policy.is_swappable_duty(d))
                        .unwrap_or(true)
                        && !policy.is_locked(day, staff_id)
                };
                if movable {
                    let a = &mut state.assignments[idx];
                    a.duty_id = Some(duty_id);
                    info!(day = %day, duty_id, staff_id, "覆盖修复: 延伸既有人员覆盖");
                    return true;
                }
                // 本人不可动 → 招募同模式替补
                match self.find_recruit(state, policy, duty_id, day) {
                    Some(recruit_id) => {
                        for a in state.assignments.iter_mut() {
                            if a.day == day && a.staff_id == recruit_id {
                                a.duty_id = Some(duty_id);
                            }
                        }
                        info!(day = %day, duty_id, staff_id, recruit_id, "覆盖修复: 招募同模式替补");
                        true
                    }
                    None => {
                        error!(day = %day, duty_id, staff_id, "覆盖修复无安全候选, 缺口保留");
                        false
                    }
                }
            }
        }
    }

    /// 招募候选: 同日同模式、在可换勤务上且未锁定, 且尚未在目标勤务上
    fn find_recruit(
        &self,
        state: &RosterState,
        policy: &DutyProtectionPolicy,
        target_duty: i64,
        day: Weekday,
    ) -> Option<i64> {
        let day_pattern = pattern_for_day(day);
        let mut fallback = None;
        for a in state.assignments.iter().filter(|a| a.day == day) {
            let src_duty = match a.duty_id {
                Some(d) if d != target_duty => d,
                _ => continue,
            };
            if !policy.is_swappable_duty(src_duty) || policy.is_locked(day, a.staff_id) {
                continue;
            }
            match state.find_staff(a.staff_id) {
                Some(s) if s.pattern == day_pattern => {}
                _ => continue,
            }
            if state.duty_count_on(day, src_duty) > 1 {
                return Some(a.staff_id);
            }
            fallback.get_or_insert(a.staff_id);
        }
        fallback
    }
}

impl Default for CoverageValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
