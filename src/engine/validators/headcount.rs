// ==========================================
// 营地勤务排班系统 - 最低人数校验器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.5 校验器
// ==========================================
// 职责: 轮转特殊勤务每个开展日人数 ≥ 2;
//       不足时从可换勤务抽调同模式人员 (非交换, 直接改派)
// 红线: 锁定分配与保护勤务不得触碰
// ==========================================

use crate::domain::types::pattern_for_day;
use crate::domain::{DutyCatalog, RosterState};
use crate::engine::override_processor::MIN_SPECIAL_HEADCOUNT;
use crate::engine::DutyProtectionPolicy;
use chrono::Weekday;
use tracing::{error, info, instrument};

// ==========================================
// HeadcountValidator - 最低人数校验器
// ==========================================

pub struct HeadcountValidator;

impl HeadcountValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验并修复最低人数
    ///
    /// 只检查当日实际开展 (已有 ≥1 条分配) 的日子
    ///
    /// # 返回
    /// 改派人数 (幂等: 对自身输出重跑返回 0)
    #[instrument(skip_all)]
    pub fn validate(
        &self,
        state: &mut RosterState,
        catalog: &DutyCatalog,
        policy: &DutyProtectionPolicy,
        days: &[Weekday],
    ) -> u32 {
        let duty_id = match catalog.rotating_duty() {
            Some(d) => d.duty_id,
            None => return 0,
        };

        let mut repairs = 0;
        for &day in days {
            let mut count = state.duty_count_on(day, duty_id);
            if count == 0 {
                // 当日未开展
                continue;
            }
            while count < MIN_SPECIAL_HEADCOUNT {
                match self.find_pull_candidate(state, policy, duty_id, day) {
                    Some(staff_id) => {
                        for a in state.assignments.iter_mut() {
                            if a.day == day && a.staff_id == staff_id {
                                a.duty_id = Some(duty_id);
                            }
                        }
                        repairs += 1;
                        count += 1;
                        info!(day = %day, duty_id, staff_id, "最低人数修复: 抽调完成");
                    }
                    None => {
                        error!(day = %day, duty_id, count, "最低人数修复无安全候选, 残余违规保留");
                        break;
                    }
                }
            }
        }
        if repairs > 0 {
            info!(repairs, "最低人数校验完成");
        }
        repairs
    }

    /// 抽调候选: 同日、同模式、在可换勤务上且未锁定
    ///
    /// 优先当日人数 > 1 的勤务
    fn find_pull_candidate(
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

impl Default for HeadcountValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
