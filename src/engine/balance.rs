// ==========================================
// 营地勤务排班系统 - 模式均衡引擎
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.3 模式均衡
// ==========================================
// 职责: 覆盖处理后校正全局与分角色的模式人数偏差
// 红线: 钉住人员与模式例外人员一律不得翻转;
//       小组优先整组翻转, 角色层面才允许个体翻转
// ==========================================

use crate::domain::types::{Pattern, Role};
use crate::domain::RosterState;
use tracing::{debug, info, instrument, warn};

/// 全局模式偏差容忍度
pub const GLOBAL_SKEW_TOLERANCE: usize = 2;
/// 分角色模式偏差容忍度
pub const ROLE_SKEW_TOLERANCE: usize = 3;

// ==========================================
// BalanceSummary - 均衡结果
// ==========================================

#[derive(Debug, Clone, Default)]
pub struct BalanceSummary {
    /// 整组翻转次数
    pub group_flips: u32,
    /// 个体翻转人数 (角色层面)
    pub role_flips: u32,
}

// ==========================================
// BalanceEngine - 模式均衡引擎
// ==========================================

pub struct BalanceEngine;

impl BalanceEngine {
    pub fn new() -> Self {
        Self
    }

    /// 两阶段均衡: 先按小组, 后按角色
    ///
    /// # 参数
    /// - state: 排班工作状态 (改写 staff[].pattern)
    #[instrument(skip_all)]
    pub fn balance(&self, state: &mut RosterState) -> BalanceSummary {
        let mut summary = BalanceSummary::default();
        self.balance_by_group(state, &mut summary);
        self.balance_by_role(state, &mut summary);

        let (a, b) = state.pattern_counts();
        info!(
            count_a = a,
            count_b = b,
            group_flips = summary.group_flips,
            role_flips = summary.role_flips,
            "模式均衡完成"
        );
        summary
    }

    // ===== 阶段1: 按小组整组翻转 =====

    /// 全局偏差超过容忍度时, 按净收益降序翻转整组,
    /// 直到达标或没有任何翻转能严格缩小偏差
    fn balance_by_group(&self, state: &mut RosterState, summary: &mut BalanceSummary) {
        loop {
            let (a, b) = state.pattern_counts();
            let diff = a.abs_diff(b);
            if diff <= GLOBAL_SKEW_TOLERANCE {
                break;
            }
            let larger = if a > b { Pattern::A } else { Pattern::B };

            // 候选: 不含钉住/例外成员的小组, 按净收益降序
            let mut best: Option<(i64, i64)> = None;
            for gid in state.sorted_group_ids() {
                if state.group_has_protected_member(gid) {
                    continue;
                }
                let members = state.group_members(gid);
                let in_larger = members.iter().filter(|s| s.pattern == larger).count() as i64;
                let net = in_larger * 2 - members.len() as i64;
                let new_diff = (diff as i64 - 2 * net).unsigned_abs() as usize;
                if new_diff >= diff {
                    continue;
                }
                if best.map_or(true, |(_, best_net)| net > best_net) {
                    best = Some((gid, net));
                }
            }

            match best {
                Some((gid, net)) => {
                    let flipped = state.flip_group(gid);
                    summary.group_flips += 1;
                    info!(group_id = gid, net, flipped, "小组均衡: 整组翻转");
                }
                None => {
                    debug!(diff, "无可安全翻转的小组, 小组均衡止步");
                    break;
                }
            }
        }
    }

    // ===== 阶段2: 按角色个体翻转 =====

    /// 各角色独立检查; 偏差超容忍度时从多数侧翻转 ⌊diff/2⌋ 名
    /// 可动人员 (不翻整组)
    fn balance_by_role(&self, state: &mut RosterState, summary: &mut BalanceSummary) {
        for role in [Role::Senior, Role::Junior] {
            let (a, b) = state.role_pattern_counts(role);
            let diff = a.abs_diff(b);
            if diff <= ROLE_SKEW_TOLERANCE {
                continue;
            }
            let larger = if a > b { Pattern::A } else { Pattern::B };
            let target = diff / 2;

            let candidates: Vec<i64> = state
                .staff
                .iter()
                .filter(|s| {
                    s.role == role
                        && s.pattern == larger
                        && !s.pattern_exception
                        && !state.is_pinned(s.staff_id)
                })
                .map(|s| s.staff_id)
                .take(target)
                .collect();

            for &staff_id in &candidates {
                if let Some(s) = state.find_staff_mut(staff_id) {
                    s.pattern = s.pattern.flip();
                    summary.role_flips += 1;
                    debug!(staff_id, role = %role, "角色均衡: 个体翻转");
                }
            }
            if candidates.len() < target {
                warn!(
                    role = %role,
                    needed = target,
                    flipped = candidates.len(),
                    "角色均衡候选不足, 残余偏差保留"
                );
            }
        }
    }
}

impl Default for BalanceEngine {
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
    use crate::domain::StaffMember;

    fn create_staff(id: i64, role: Role, group_id: Option<i64>, pattern: Pattern) -> StaffMember {
        let mut s = StaffMember::new(id, format!("员工{}", id), role, group_id);
        s.pattern = pattern;
        s
    }

    #[test]
    fn test_group_pass_reduces_global_skew() {
        // 3组×2人全部 A → 偏差 6, 翻转一组后偏差 2 达标
        let mut staff = Vec::new();
        for gid in 1..=3 {
            staff.push(create_staff(gid * 10, Role::Senior, Some(gid), Pattern::A));
            staff.push(create_staff(gid * 10 + 1, Role::Junior, Some(gid), Pattern::A));
        }
        let mut state = RosterState::new(staff);

        let summary = BalanceEngine::new().balance(&mut state);
        let (a, b) = state.pattern_counts();
        assert!(a.abs_diff(b) <= GLOBAL_SKEW_TOLERANCE);
        // 6/0 → 翻一组 (净收益2) → 4/2, 已达标
        assert_eq!(summary.group_flips, 1);
    }

    #[test]
    fn test_group_pass_never_touches_pinned_group() {
        let mut staff = Vec::new();
        for gid in 1..=2 {
            staff.push(create_staff(gid * 10, Role::Senior, Some(gid), Pattern::A));
            staff.push(create_staff(gid * 10 + 1, Role::Junior, Some(gid), Pattern::A));
        }
        let mut state = RosterState::new(staff);
        // 组1含钉住成员 → 只能翻组2
        state.mark_pinned(10);

        BalanceEngine::new().balance(&mut state);
        assert_eq!(state.find_staff(10).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(11).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(20).unwrap().pattern, Pattern::B);
    }

    #[test]
    fn test_group_pass_stops_when_no_safe_flip() {
        // 唯一小组含钉住成员 → 偏差保留, 不 panic
        let staff = vec![
            create_staff(1, Role::Senior, Some(1), Pattern::A),
            create_staff(2, Role::Senior, Some(1), Pattern::A),
            create_staff(3, Role::Senior, Some(1), Pattern::A),
            create_staff(4, Role::Senior, Some(1), Pattern::A),
        ];
        let mut state = RosterState::new(staff);
        state.mark_pinned(1);

        let summary = BalanceEngine::new().balance(&mut state);
        assert_eq!(summary.group_flips, 0);
        let (a, _) = state.pattern_counts();
        assert_eq!(a, 4);
    }

    #[test]
    fn test_role_pass_individual_flips() {
        // 全局 4/4 平衡, 但正式 4A/0B、见习 0A/4B → 各翻 2 人
        let mut staff = Vec::new();
        for id in 1..=4 {
            staff.push(create_staff(id, Role::Senior, None, Pattern::A));
        }
        for id in 5..=8 {
            staff.push(create_staff(id, Role::Junior, None, Pattern::B));
        }
        let mut state = RosterState::new(staff);

        let summary = BalanceEngine::new().balance(&mut state);
        assert_eq!(summary.group_flips, 0);
        assert_eq!(summary.role_flips, 4);
        assert_eq!(state.role_pattern_counts(Role::Senior), (2, 2));
        assert_eq!(state.role_pattern_counts(Role::Junior), (2, 2));
    }

    #[test]
    fn test_role_pass_skips_pinned() {
        let mut staff = Vec::new();
        for id in 1..=4 {
            staff.push(create_staff(id, Role::Senior, None, Pattern::A));
        }
        for id in 5..=8 {
            staff.push(create_staff(id, Role::Junior, None, Pattern::B));
        }
        let mut state = RosterState::new(staff);
        state.mark_pinned(1);
        state.mark_pinned(2);

        BalanceEngine::new().balance(&mut state);
        // 钉住的 1/2 不动, 翻转的是 3/4
        assert_eq!(state.find_staff(1).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(2).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(3).unwrap().pattern, Pattern::B);
        assert_eq!(state.find_staff(4).unwrap().pattern, Pattern::B);
    }
}
