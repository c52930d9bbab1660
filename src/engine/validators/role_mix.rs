// ==========================================
// 营地勤务排班系统 - 角色配比校验器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.5 校验器
// ==========================================
// 职责: 角色配比勤务每日须有 1-2 名正式 + 1-2 名见习;
//       违规时在非保护勤务中寻找同日同模式候选换入
// 红线: 有界修复, 无候选时记错误并放行 (残余违规留给人工)
// ==========================================

use crate::domain::types::{pattern_for_day, Role};
use crate::domain::{DutyCatalog, RosterState};
use crate::engine::DutyProtectionPolicy;
use chrono::Weekday;
use tracing::{error, info, instrument};

/// 单日修复尝试上限
const MAX_REPAIR_ATTEMPTS: u32 = 4;

// ==========================================
// RoleMixValidator - 角色配比校验器
// ==========================================

pub struct RoleMixValidator;

impl RoleMixValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验并修复角色配比
    ///
    /// # 返回
    /// 实施的修复次数 (幂等: 对自身输出重跑返回 0)
    #[instrument(skip_all)]
    pub fn validate(
        &self,
        state: &mut RosterState,
        catalog: &DutyCatalog,
        policy: &DutyProtectionPolicy,
        days: &[Weekday],
    ) -> u32 {
        let duty_id = match catalog.role_mix_duty() {
            Some(d) => d.duty_id,
            None => return 0,
        };

        let mut repairs = 0;
        for &day in days {
            if policy.is_all_staff_day(day) {
                continue;
            }
            repairs += self.repair_single_day(state, policy, duty_id, day);
        }
        if repairs > 0 {
            info!(repairs, "角色配比校验完成");
        }
        repairs
    }

    fn repair_single_day(
        &self,
        state: &mut RosterState,
        policy: &DutyProtectionPolicy,
        duty_id: i64,
        day: Weekday,
    ) -> u32 {
        let mut repairs = 0;
        let mut attempts = 0;

        loop {
            let members: Vec<(i64, Role)> = state
                .assignments
                .iter()
                .filter(|a| a.day == day && a.duty_id == Some(duty_id))
                .filter_map(|a| state.find_staff(a.staff_id).map(|s| (s.staff_id, s.role)))
                .collect();

            // 当日未开展或人数不足以配比时不处理
            if members.len() < 2 {
                break;
            }

            let seniors = members.iter().filter(|(_, r)| *r == Role::Senior).count();
            let juniors = members.len() - seniors;
            let in_band = |c: usize| (1..=2).contains(&c);
            if in_band(seniors) && in_band(juniors) {
                break;
            }

            if attempts >= MAX_REPAIR_ATTEMPTS {
                error!(day = %day, duty_id, seniors, juniors, "角色配比修复次数达上限, 残余违规保留");
                break;
            }
            attempts += 1;

            // 缺口角色 = 人数少的一侧, 过剩角色 = 人数多的一侧
            let (needed, excess) = if seniors < juniors {
                (Role::Senior, Role::Junior)
            } else {
                (Role::Junior, Role::Senior)
            };

            let donor = members
                .iter()
                .find(|(id, r)| *r == excess && !policy.is_locked(day, *id))
                .map(|(id, _)| *id);

            let candidate = self.find_swap_candidate(state, policy, duty_id, day, needed);

            match (donor, candidate) {
                (Some(donor_id), Some(candidate_id)) => {
                    self.swap_duties(state, day, duty_id, donor_id, candidate_id);
                    repairs += 1;
                    info!(
                        day = %day,
                        duty_id,
                        swapped_out = donor_id,
                        swapped_in = candidate_id,
                        needed_role = %needed,
                        "角色配比修复: 交换完成"
                    );
                }
                _ => {
                    error!(
                        day = %day,
                        duty_id,
                        needed_role = %needed,
                        "角色配比修复无安全候选, 跳过"
                    );
                    break;
                }
            }
        }
        repairs
    }

    /// 在非保护勤务中寻找同日、同模式、目标角色的换入候选
    ///
    /// 优先选择当日人数 > 1 的勤务 (避免抽空单人勤务)
    fn find_swap_candidate(
        &self,
        state: &RosterState,
        policy: &DutyProtectionPolicy,
        target_duty: i64,
        day: Weekday,
        needed: Role,
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
            let staff = match state.find_staff(a.staff_id) {
                Some(s) => s,
                None => continue,
            };
            if staff.role != needed || staff.pattern != day_pattern {
                continue;
            }
            if state.duty_count_on(day, src_duty) > 1 {
                return Some(a.staff_id);
            }
            fallback.get_or_insert(a.staff_id);
        }
        fallback
    }

    /// 交换两人当日的勤务
    fn swap_duties(
        &self,
        state: &mut RosterState,
        day: Weekday,
        duty_id: i64,
        donor_id: i64,
        candidate_id: i64,
    ) {
        let candidate_duty = state
            .assignments
            .iter()
            .find(|a| a.day == day && a.staff_id == candidate_id)
            .and_then(|a| a.duty_id);
        for a in state.assignments.iter_mut().filter(|a| a.day == day) {
            if a.staff_id == donor_id && a.duty_id == Some(duty_id) {
                a.duty_id = candidate_duty;
            } else if a.staff_id == candidate_id {
                a.duty_id = Some(duty_id);
            }
        }
    }
}

impl Default for RoleMixValidator {
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
    use crate::domain::types::{AssignmentKind, DutyCategory, DutyRole, Pattern};
    use crate::domain::{Assignment, Duty, StaffMember};

    fn create_test_duty(duty_id: i64, role: Option<DutyRole>) -> Duty {
        Duty {
            duty_id,
            duty_code: format!("D{:03}", duty_id),
            duty_name: format!("勤务{}", duty_id),
            category: DutyCategory::Recurring,
            min_required: 1,
            normal_target: 2,
            max_allowed: 4,
            priority: 0,
            instructions: String::new(),
            special_role: role,
            fill_exempt: false,
        }
    }

    fn create_catalog() -> DutyCatalog {
        DutyCatalog::new(vec![
            create_test_duty(400, Some(DutyRole::RoleMix)),
            create_test_duty(100, None),
            create_test_duty(500, None),
        ])
    }

    fn create_staff(id: i64, role: Role) -> StaffMember {
        let mut s = StaffMember::new(id, format!("员工{}", id), role, Some(1));
        s.pattern = Pattern::A; // 周一 = A 日
        s
    }

    #[test]
    fn test_zero_senior_gets_swapped_in() {
        // 配比勤务当日 2 见习 0 正式 → 从多人勤务换入 1 名正式
        let catalog = create_catalog();
        let mut state = RosterState::new(vec![
            create_staff(1, Role::Junior),
            create_staff(2, Role::Junior),
            create_staff(3, Role::Senior),
            create_staff(4, Role::Senior),
        ]);
        for (id, duty) in [(1, 400), (2, 400), (3, 100), (4, 100)] {
            state.push_assignment(Assignment::new(
                Weekday::Mon,
                id,
                duty,
                AssignmentKind::Normal,
            ));
        }
        let policy = DutyProtectionPolicy::build(&catalog, &OverrideSpec::default(), &state);

        let repairs = RoleMixValidator::new().validate(
            &mut state,
            &catalog,
            &policy,
            &[Weekday::Mon],
        );
        assert_eq!(repairs, 1);

        // 配比勤务现在 1 正式 + 1 见习
        let on_duty: Vec<Role> = state
            .assignments
            .iter()
            .filter(|a| a.duty_id == Some(400))
            .map(|a| state.find_staff(a.staff_id).unwrap().role)
            .collect();
        assert!(on_duty.contains(&Role::Senior));
        assert!(on_duty.contains(&Role::Junior));
        // 被换出的见习落到勤务100
        assert_eq!(state.duty_count_on(Weekday::Mon, 100), 2);
    }

    #[test]
    fn test_no_candidate_leaves_violation() {
        // 唯一的正式辅导员在受保护勤务上 → 无候选, 违规保留
        let mut catalog = create_catalog();
        catalog.duties[1].fill_exempt = true; // 勤务100 受保护
        let mut state = RosterState::new(vec![
            create_staff(1, Role::Junior),
            create_staff(2, Role::Junior),
            create_staff(3, Role::Senior),
        ]);
        for (id, duty) in [(1, 400), (2, 400), (3, 100)] {
            state.push_assignment(Assignment::new(
                Weekday::Mon,
                id,
                duty,
                AssignmentKind::Normal,
            ));
        }
        let policy = DutyProtectionPolicy::build(&catalog, &OverrideSpec::default(), &state);

        let repairs = RoleMixValidator::new().validate(
            &mut state,
            &catalog,
            &policy,
            &[Weekday::Mon],
        );
        assert_eq!(repairs, 0);
        assert_eq!(state.duty_count_on(Weekday::Mon, 100), 1);
    }

    #[test]
    fn test_validator_is_idempotent() {
        let catalog = create_catalog();
        let mut state = RosterState::new(vec![
            create_staff(1, Role::Junior),
            create_staff(2, Role::Junior),
            create_staff(3, Role::Senior),
            create_staff(4, Role::Senior),
        ]);
        for (id, duty) in [(1, 400), (2, 400), (3, 100), (4, 100)] {
            state.push_assignment(Assignment::new(
                Weekday::Mon,
                id,
                duty,
                AssignmentKind::Normal,
            ));
        }
        let policy = DutyProtectionPolicy::build(&catalog, &OverrideSpec::default(), &state);

        let validator = RoleMixValidator::new();
        let first = validator.validate(&mut state, &catalog, &policy, &[Weekday::Mon]);
        assert!(first > 0);
        // 对自身输出重跑不再产生修复
        let second = validator.validate(&mut state, &catalog, &policy, &[Weekday::Mon]);
        assert_eq!(second, 0);
    }

    #[test]
    fn test_compliant_day_untouched() {
        let catalog = create_catalog();
        let mut state = RosterState::new(vec![
            create_staff(1, Role::Senior),
            create_staff(2, Role::Junior),
        ]);
        for id in [1, 2] {
            state.push_assignment(Assignment::new(
                Weekday::Mon,
                id,
                400,
                AssignmentKind::Normal,
            ));
        }
        let policy = DutyProtectionPolicy::build(&catalog, &OverrideSpec::default(), &state);

        let repairs = RoleMixValidator::new().validate(
            &mut state,
            &catalog,
            &policy,
            &[Weekday::Mon],
        );
        assert_eq!(repairs, 0);
    }
}
