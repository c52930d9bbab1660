// ==========================================
// 营地勤务排班系统 - 贪心填充引擎
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.4 贪心填充
// ==========================================
// 职责: 逐日三阶段填充 (最低 → 目标 → 优先级溢出),
//       剩余人员记为替补
// 红线: 钉住分配不得改动; 池内洗牌是本引擎唯一随机来源
// ==========================================

use crate::domain::types::{pattern_for_day, AssignmentKind};
use crate::domain::{Assignment, DutyCatalog, RosterState};
use crate::engine::DutyProtectionPolicy;
use chrono::Weekday;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, instrument, warn};

// ==========================================
// FillDaySummary / FillSummary - 填充结果
// ==========================================

/// 单日填充结果
#[derive(Debug, Clone)]
pub struct FillDaySummary {
    pub day: Weekday,
    /// 当日可用池大小 (洗牌后)
    pub pool_size: usize,
    /// 常规填充人数 (阶段1+2)
    pub normal_assigned: u32,
    /// 溢出填充人数 (阶段3)
    pub overflow_assigned: u32,
    /// 替补人数
    pub substitutes: u32,
    /// 最低人数未达标的勤务
    pub unmet_min: Vec<i64>,
}

/// 整周填充结果
#[derive(Debug, Clone, Default)]
pub struct FillSummary {
    pub days: Vec<FillDaySummary>,
    /// 跳过的全员勤务日
    pub skipped_days: Vec<Weekday>,
}

impl FillSummary {
    pub fn total_substitutes(&self) -> u32 {
        self.days.iter().map(|d| d.substitutes).sum()
    }
}

// ==========================================
// DutyFiller - 贪心填充引擎
// ==========================================

pub struct DutyFiller;

impl DutyFiller {
    pub fn new() -> Self {
        Self
    }

    /// 整周填充
    ///
    /// # 参数
    /// - state: 排班工作状态 (追加分配记录)
    /// - catalog: 勤务目录 (目录顺序即填充顺序)
    /// - days: 开展日 (有序)
    /// - policy: 保护策略 (全员日跳过判定)
    /// - rng: 注入的随机源
    #[instrument(skip_all, fields(days = days.len()))]
    pub fn fill(
        &self,
        state: &mut RosterState,
        catalog: &DutyCatalog,
        days: &[Weekday],
        policy: &DutyProtectionPolicy,
        rng: &mut StdRng,
    ) -> FillSummary {
        let mut summary = FillSummary::default();
        for &day in days {
            if policy.is_all_staff_day(day) {
                debug!(day = %day, "全员勤务日, 填充跳过");
                summary.skipped_days.push(day);
                continue;
            }
            let day_summary = self.fill_single_day(state, catalog, day, rng);
            summary.days.push(day_summary);
        }
        info!(
            filled_days = summary.days.len(),
            skipped_days = summary.skipped_days.len(),
            substitutes = summary.total_substitutes(),
            "贪心填充完成"
        );
        summary
    }

    /// 单日三阶段填充
    fn fill_single_day(
        &self,
        state: &mut RosterState,
        catalog: &DutyCatalog,
        day: Weekday,
        rng: &mut StdRng,
    ) -> FillDaySummary {
        let day_pattern = pattern_for_day(day);

        // 可用池: 模式匹配且当日尚无分配的人员, 洗牌
        let assigned_today = state.staff_assigned_on(day);
        let mut pool_vec: Vec<i64> = state
            .staff
            .iter()
            .filter(|s| s.pattern == day_pattern && !assigned_today.contains(&s.staff_id))
            .map(|s| s.staff_id)
            .collect();
        pool_vec.shuffle(rng);
        let pool_size = pool_vec.len();
        let mut pool: VecDeque<i64> = pool_vec.into();

        // 可填充勤务: 循环类别、未免填充、无特殊角色;
        // 当日已有钉住的勤务退出填充, 角色配比勤务除外
        // (其目标人数按已钉住者折减)
        let fillable: Vec<(i64, u32, u32, u32, i32)> = catalog
            .duties
            .iter()
            .filter(|d| {
                d.category == crate::domain::types::DutyCategory::Recurring
                    && !d.fill_exempt
                    && (d.special_role.is_none() || d.is_role_mix())
            })
            .filter(|d| d.is_role_mix() || state.duty_count_on(day, d.duty_id) == 0)
            .map(|d| {
                (
                    d.duty_id,
                    d.min_required,
                    d.normal_target,
                    d.max_allowed,
                    d.priority,
                )
            })
            .collect();

        // 当前人数含钉住分配 → 折减自然生效
        let mut counts: HashMap<i64, u32> = fillable
            .iter()
            .map(|&(id, ..)| (id, state.duty_count_on(day, id) as u32))
            .collect();

        let mut normal_assigned = 0;
        let mut unmet_min = Vec::new();

        // ==========================================
        // 阶段1: 最低人数填充
        // ==========================================
        for &(duty_id, min_required, ..) in &fillable {
            while counts[&duty_id] < min_required {
                match pool.pop_front() {
                    Some(staff_id) => {
                        state.push_assignment(Assignment::new(
                            day,
                            staff_id,
                            duty_id,
                            AssignmentKind::Normal,
                        ));
                        *counts.get_mut(&duty_id).unwrap() += 1;
                        normal_assigned += 1;
                    }
                    None => break,
                }
            }
            if counts[&duty_id] < min_required {
                warn!(
                    day = %day,
                    duty_id,
                    count = counts[&duty_id],
                    min_required,
                    "最低人数未达标, 部分填充"
                );
                unmet_min.push(duty_id);
            }
        }

        // ==========================================
        // 阶段2: 目标人数填充
        // ==========================================
        for &(duty_id, _, normal_target, ..) in &fillable {
            while counts[&duty_id] < normal_target {
                match pool.pop_front() {
                    Some(staff_id) => {
                        state.push_assignment(Assignment::new(
                            day,
                            staff_id,
                            duty_id,
                            AssignmentKind::Normal,
                        ));
                        *counts.get_mut(&duty_id).unwrap() += 1;
                        normal_assigned += 1;
                    }
                    None => break,
                }
            }
        }

        // ==========================================
        // 阶段3: 优先级溢出 (每轮每勤务最多补1人)
        // ==========================================
        let mut by_priority = fillable.clone();
        by_priority.sort_by_key(|&(.., priority)| priority);

        let mut overflow_assigned = 0;
        loop {
            let mut progressed = false;
            for &(duty_id, _, _, max_allowed, _) in &by_priority {
                if pool.is_empty() {
                    break;
                }
                if counts[&duty_id] < max_allowed {
                    if let Some(staff_id) = pool.pop_front() {
                        state.push_assignment(Assignment::new(
                            day,
                            staff_id,
                            duty_id,
                            AssignmentKind::Overflow,
                        ));
                        *counts.get_mut(&duty_id).unwrap() += 1;
                        overflow_assigned += 1;
                        progressed = true;
                    }
                }
            }
            if pool.is_empty() || !progressed {
                break;
            }
        }

        // 剩余人员记为替补
        let substitutes = pool.len() as u32;
        for staff_id in pool {
            debug!(day = %day, staff_id, "池内剩余人员记为替补");
            state.push_assignment(Assignment::substitute(day, staff_id));
        }

        debug!(
            day = %day,
            pool_size,
            normal_assigned,
            overflow_assigned,
            substitutes,
            "单日填充完成"
        );
        FillDaySummary {
            day,
            pool_size,
            normal_assigned,
            overflow_assigned,
            substitutes,
            unmet_min,
        }
    }
}

impl Default for DutyFiller {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverrideSpec;
    use crate::domain::types::{DutyCategory, DutyRole, Pattern, Role};
    use crate::domain::{Duty, StaffMember};
    use rand::SeedableRng;

    fn create_test_duty(duty_id: i64, min: u32, normal: u32, max: u32, priority: i32) -> Duty {
        Duty {
            duty_id,
            duty_code: format!("D{:03}", duty_id),
            duty_name: format!("勤务{}", duty_id),
            category: DutyCategory::Recurring,
            min_required: min,
            normal_target: normal,
            max_allowed: max,
            priority,
            instructions: String::new(),
            special_role: None,
            fill_exempt: false,
        }
    }

    fn create_a_pattern_staff(count: i64) -> Vec<StaffMember> {
        (1..=count)
            .map(|id| {
                let mut s = StaffMember::new(id, format!("员工{}", id), Role::Senior, Some(1));
                s.pattern = Pattern::A;
                s
            })
            .collect()
    }

    fn empty_policy(catalog: &DutyCatalog, state: &RosterState) -> DutyProtectionPolicy {
        DutyProtectionPolicy::build(catalog, &OverrideSpec::default(), state)
    }

    #[test]
    fn test_fill_curve_min_normal_overflow_substitute() {
        // 1个勤务 (min=2, normal=3, max=5), 6名同模式人员:
        // 阶段1补2人, 阶段2补1人, 阶段3补至5人, 第6人替补
        let catalog = DutyCatalog::new(vec![create_test_duty(100, 2, 3, 5, 1)]);
        let mut state = RosterState::new(create_a_pattern_staff(6));
        let policy = empty_policy(&catalog, &state);
        let mut rng = StdRng::seed_from_u64(1);

        let summary = DutyFiller::new().fill(
            &mut state,
            &catalog,
            &[Weekday::Mon],
            &policy,
            &mut rng,
        );

        assert_eq!(state.duty_count_on(Weekday::Mon, 100), 5);
        let day = &summary.days[0];
        assert_eq!(day.normal_assigned, 3);
        assert_eq!(day.overflow_assigned, 2);
        assert_eq!(day.substitutes, 1);

        let kinds: Vec<AssignmentKind> = state.assignments.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == AssignmentKind::Normal)
                .count(),
            3
        );
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == AssignmentKind::Overflow)
                .count(),
            2
        );
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == AssignmentKind::Substitute)
                .count(),
            1
        );
    }

    #[test]
    fn test_overflow_follows_priority_order() {
        // 两个勤务目标已满后, 溢出先补优先级小的
        let catalog = DutyCatalog::new(vec![
            create_test_duty(100, 1, 1, 3, 9),
            create_test_duty(200, 1, 1, 3, 1),
        ]);
        let mut state = RosterState::new(create_a_pattern_staff(3));
        let policy = empty_policy(&catalog, &state);
        let mut rng = StdRng::seed_from_u64(2);

        DutyFiller::new().fill(&mut state, &catalog, &[Weekday::Mon], &policy, &mut rng);

        // 2人进目标, 第3人溢出 → 优先级1的勤务200
        assert_eq!(state.duty_count_on(Weekday::Mon, 100), 1);
        assert_eq!(state.duty_count_on(Weekday::Mon, 200), 2);
    }

    #[test]
    fn test_min_unmet_is_warning_not_fatal() {
        let catalog = DutyCatalog::new(vec![create_test_duty(100, 4, 5, 6, 1)]);
        let mut state = RosterState::new(create_a_pattern_staff(2));
        let policy = empty_policy(&catalog, &state);
        let mut rng = StdRng::seed_from_u64(3);

        let summary =
            DutyFiller::new().fill(&mut state, &catalog, &[Weekday::Mon], &policy, &mut rng);
        assert_eq!(summary.days[0].unmet_min, vec![100]);
        assert_eq!(state.duty_count_on(Weekday::Mon, 100), 2);
    }

    #[test]
    fn test_pinned_staff_excluded_from_pool() {
        let catalog = DutyCatalog::new(vec![create_test_duty(100, 1, 2, 3, 1)]);
        let mut state = RosterState::new(create_a_pattern_staff(3));
        // 员工1当日已有钉住分配
        state.push_assignment(Assignment::new(
            Weekday::Mon,
            1,
            900,
            AssignmentKind::Pinned,
        ));
        let policy = empty_policy(&catalog, &state);
        let mut rng = StdRng::seed_from_u64(4);

        DutyFiller::new().fill(&mut state, &catalog, &[Weekday::Mon], &policy, &mut rng);
        assert!(state
            .assignments
            .iter()
            .filter(|a| a.duty_id == Some(100))
            .all(|a| a.staff_id != 1));
    }

    #[test]
    fn test_role_mix_target_reduced_by_pins() {
        // 角色配比勤务 normal=3, 已钉2人 → 阶段2只补1人
        let mut duty = create_test_duty(400, 1, 3, 4, 1);
        duty.special_role = Some(DutyRole::RoleMix);
        let catalog = DutyCatalog::new(vec![duty]);

        let mut state = RosterState::new(create_a_pattern_staff(5));
        state.push_assignment(Assignment::new(
            Weekday::Mon,
            1,
            400,
            AssignmentKind::PinnedLocked,
        ));
        state.push_assignment(Assignment::new(
            Weekday::Mon,
            2,
            400,
            AssignmentKind::PinnedLocked,
        ));
        let policy = empty_policy(&catalog, &state);
        let mut rng = StdRng::seed_from_u64(5);

        let summary =
            DutyFiller::new().fill(&mut state, &catalog, &[Weekday::Mon], &policy, &mut rng);
        // 总人数 3 (2钉 + 1补), 另外2人溢出到上限4后剩1替补
        assert_eq!(summary.days[0].normal_assigned, 1);
        assert_eq!(state.duty_count_on(Weekday::Mon, 400), 4);
        assert_eq!(summary.days[0].substitutes, 1);
    }

    #[test]
    fn test_all_staff_day_skipped() {
        let catalog = DutyCatalog::new(vec![create_test_duty(100, 1, 2, 3, 1)]);
        let mut state = RosterState::new(create_a_pattern_staff(3));
        let mut overrides = OverrideSpec::default();
        overrides.all_staff_days.push(Weekday::Mon);
        let policy = DutyProtectionPolicy::build(&catalog, &overrides, &state);
        let mut rng = StdRng::seed_from_u64(6);

        let summary =
            DutyFiller::new().fill(&mut state, &catalog, &[Weekday::Mon], &policy, &mut rng);
        assert_eq!(summary.skipped_days, vec![Weekday::Mon]);
        assert!(state.assignments.is_empty());
    }
}
