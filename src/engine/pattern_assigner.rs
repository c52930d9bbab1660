// ==========================================
// 营地勤务排班系统 - 模式分配器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.1 模式分配
// ==========================================
// 职责: 为每个小组派生交替的基础模式, 按角色展开到个人;
//       例外构成的小组改为组内随机均分
// 红线: 随机源必须由外部注入 (可复现)
// ==========================================

use crate::domain::types::{Pattern, Role};
use crate::domain::RosterState;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

// ==========================================
// PatternAssigner - 模式分配器
// ==========================================

pub struct PatternAssigner;

impl PatternAssigner {
    pub fn new() -> Self {
        Self
    }

    /// 全量模式分配
    ///
    /// 流程:
    /// 1. 小组按ID升序, 随机选起始标签, 逐组交替得到基础模式
    /// 2. 常规小组: 正式辅导员继承基础模式, 见习辅导员取反
    /// 3. 例外小组 (构成为 1正2见 或 1正1见): 组内洗牌后尽量均分,
    ///    奇数人数掷硬币决定多出的一人归属
    ///
    /// # 参数
    /// - state: 排班工作状态 (改写 staff[].pattern)
    /// - rng: 注入的随机源
    #[instrument(skip_all, fields(staff_count = state.staff.len()))]
    pub fn assign(&self, state: &mut RosterState, rng: &mut StdRng) {
        let group_ids = state.sorted_group_ids();
        let start = if rng.gen_bool(0.5) {
            Pattern::A
        } else {
            Pattern::B
        };

        // 逐组交替的基础模式
        let mut base_patterns: HashMap<i64, Pattern> = HashMap::new();
        for (idx, gid) in group_ids.iter().enumerate() {
            let p = if idx % 2 == 0 { start } else { start.flip() };
            base_patterns.insert(*gid, p);
        }

        let mut exception_groups = 0;
        for gid in &group_ids {
            let base = base_patterns[gid];
            let members: Vec<(i64, Role)> = state
                .group_members(*gid)
                .iter()
                .map(|s| (s.staff_id, s.role))
                .collect();

            if members.len() == 1 {
                // 单人小组无法同时覆盖两种模式
                warn!(group_id = gid, "单人小组无法覆盖两种模式, 按角色规则分配");
            }

            if Self::is_exception_composition(&members) {
                exception_groups += 1;
                self.randomize_exception_group(state, *gid, &members, rng);
                continue;
            }

            // 常规规则: 正式继承基础模式, 见习取反 (制造组内 A/B 覆盖)
            for (staff_id, role) in &members {
                let pattern = match role {
                    Role::Senior => base,
                    Role::Junior => base.flip(),
                };
                if let Some(s) = state.find_staff_mut(*staff_id) {
                    s.pattern = pattern;
                }
            }
        }

        info!(
            group_count = group_ids.len(),
            start_pattern = %start,
            exception_groups,
            "模式分配完成"
        );
    }

    /// 应用跨周预计算的模式映射 (多周排期时替代随机分配)
    ///
    /// 映射缺失的人员回退到角色规则并告警
    #[instrument(skip_all, fields(preset_count = preset.len()))]
    pub fn apply_preset(&self, state: &mut RosterState, preset: &BTreeMap<i64, Pattern>) {
        let mut missing = 0;
        let staff_ids: Vec<i64> = state.staff.iter().map(|s| s.staff_id).collect();
        for staff_id in staff_ids {
            match preset.get(&staff_id) {
                Some(p) => {
                    if let Some(s) = state.find_staff_mut(staff_id) {
                        s.pattern = *p;
                    }
                }
                None => {
                    missing += 1;
                    let fallback = state.find_staff(staff_id).map(|s| match s.role {
                        Role::Senior => Pattern::A,
                        Role::Junior => Pattern::B,
                    });
                    if let (Some(p), Some(s)) = (fallback, state.find_staff_mut(staff_id)) {
                        warn!(staff_id, pattern = %p, "模式映射缺失, 按角色规则回退");
                        s.pattern = p;
                    }
                }
            }
        }
        info!(missing, "预计算模式应用完成");
    }

    /// 小组覆盖修复: 整组卡在单一模式时翻转部分成员
    ///
    /// - 双角色小组: 翻转人数较少角色的全部可动成员 (平局翻见习)
    /// - 单角色小组: 翻转半数可动成员 (至少1人)
    /// - 单人小组 / 无可动成员: 告警跳过
    ///
    /// # 返回
    /// 修复的小组数
    #[instrument(skip_all)]
    pub fn ensure_group_coverage(&self, state: &mut RosterState) -> u32 {
        let mut repaired = 0;
        for gid in state.sorted_group_ids() {
            let members: Vec<(i64, Role, Pattern, bool)> = state
                .group_members(gid)
                .iter()
                .map(|s| {
                    (
                        s.staff_id,
                        s.role,
                        s.pattern,
                        state.is_pinned(s.staff_id) || s.pattern_exception,
                    )
                })
                .collect();

            if members.len() < 2 {
                if members.len() == 1 {
                    warn!(group_id = gid, "单人小组跳过覆盖修复");
                }
                continue;
            }

            let has_a = members.iter().any(|(_, _, p, _)| *p == Pattern::A);
            let has_b = members.iter().any(|(_, _, p, _)| *p == Pattern::B);
            if has_a && has_b {
                continue;
            }

            // 可动成员 (未钉住且非模式例外)
            let movable: Vec<(i64, Role)> = members
                .iter()
                .filter(|(_, _, _, held)| !held)
                .map(|(id, role, _, _)| (*id, *role))
                .collect();
            if movable.is_empty() {
                warn!(group_id = gid, "无可动成员, 覆盖修复跳过");
                continue;
            }

            let seniors = members.iter().filter(|(_, r, _, _)| *r == Role::Senior).count();
            let juniors = members.len() - seniors;

            let to_flip: Vec<i64> = if seniors > 0 && juniors > 0 {
                // 双角色: 翻转少数角色 (平局翻见习)
                let minority = if seniors < juniors {
                    Role::Senior
                } else {
                    Role::Junior
                };
                movable
                    .iter()
                    .filter(|(_, r)| *r == minority)
                    .map(|(id, _)| *id)
                    .collect()
            } else {
                // 单角色: 翻转半数 (至少1人)
                let count = (movable.len() / 2).max(1).min(members.len() - 1);
                movable.iter().take(count).map(|(id, _)| *id).collect()
            };

            if to_flip.is_empty() {
                warn!(group_id = gid, "少数角色成员均不可动, 覆盖修复跳过");
                continue;
            }

            for staff_id in &to_flip {
                if let Some(s) = state.find_staff_mut(*staff_id) {
                    s.pattern = s.pattern.flip();
                }
            }
            info!(
                group_id = gid,
                flipped = to_flip.len(),
                "小组覆盖修复: 翻转部分成员"
            );
            repaired += 1;
        }
        repaired
    }

    // ===== 内部方法 =====

    /// 例外构成: (1正, 2见) 或 (1正, 1见)
    fn is_exception_composition(members: &[(i64, Role)]) -> bool {
        let seniors = members.iter().filter(|(_, r)| *r == Role::Senior).count();
        let juniors = members.len() - seniors;
        (seniors == 1 && juniors == 2) || (seniors == 1 && juniors == 1)
    }

    /// 例外小组随机均分
    fn randomize_exception_group(
        &self,
        state: &mut RosterState,
        group_id: i64,
        members: &[(i64, Role)],
        rng: &mut StdRng,
    ) {
        let mut ids: Vec<i64> = members.iter().map(|(id, _)| *id).collect();
        ids.shuffle(rng);

        let mut a_count = ids.len() / 2;
        if ids.len() % 2 == 1 && rng.gen_bool(0.5) {
            a_count += 1;
        }

        for (idx, staff_id) in ids.iter().enumerate() {
            let pattern = if idx < a_count { Pattern::A } else { Pattern::B };
            if let Some(s) = state.find_staff_mut(*staff_id) {
                s.pattern = pattern;
            }
        }
        debug!(group_id, a_count, total = ids.len(), "例外小组随机均分");
    }
}

impl Default for PatternAssigner {
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
    use rand::SeedableRng;

    /// 创建测试名册: 每组 2正2见 (常规构成)
    fn create_test_state(group_count: i64) -> RosterState {
        let mut staff = Vec::new();
        let mut id = 1;
        for gid in 1..=group_count {
            for _ in 0..2 {
                staff.push(StaffMember::new(id, format!("正式{}", id), Role::Senior, Some(gid)));
                id += 1;
            }
            for _ in 0..2 {
                staff.push(StaffMember::new(id, format!("见习{}", id), Role::Junior, Some(gid)));
                id += 1;
            }
        }
        RosterState::new(staff)
    }

    #[test]
    fn test_role_flip_within_group() {
        let mut state = create_test_state(3);
        let mut rng = StdRng::seed_from_u64(42);
        PatternAssigner::new().assign(&mut state, &mut rng);

        // 常规小组内: 正式同基础模式, 见习取反
        for gid in state.sorted_group_ids() {
            let members = state.group_members(gid);
            let senior_p = members
                .iter()
                .find(|s| s.role == Role::Senior)
                .unwrap()
                .pattern;
            for s in &members {
                match s.role {
                    Role::Senior => assert_eq!(s.pattern, senior_p),
                    Role::Junior => assert_eq!(s.pattern, senior_p.flip()),
                }
            }
        }
    }

    #[test]
    fn test_base_pattern_alternates() {
        let mut state = create_test_state(4);
        let mut rng = StdRng::seed_from_u64(7);
        PatternAssigner::new().assign(&mut state, &mut rng);

        // 相邻小组的正式辅导员模式相反
        let bases: Vec<Pattern> = state
            .sorted_group_ids()
            .iter()
            .map(|gid| {
                state
                    .group_members(*gid)
                    .iter()
                    .find(|s| s.role == Role::Senior)
                    .unwrap()
                    .pattern
            })
            .collect();
        for pair in bases.windows(2) {
            assert_eq!(pair[0].flip(), pair[1]);
        }
    }

    #[test]
    fn test_exception_group_covers_both_patterns() {
        // 1正2见 → 例外小组, 随机均分后必须同时覆盖 A/B
        let staff = vec![
            StaffMember::new(1, "正式1", Role::Senior, Some(5)),
            StaffMember::new(2, "见习1", Role::Junior, Some(5)),
            StaffMember::new(3, "见习2", Role::Junior, Some(5)),
        ];
        let mut state = RosterState::new(staff);
        let mut rng = StdRng::seed_from_u64(11);
        PatternAssigner::new().assign(&mut state, &mut rng);

        let patterns: Vec<Pattern> = state.staff.iter().map(|s| s.pattern).collect();
        assert!(patterns.contains(&Pattern::A));
        assert!(patterns.contains(&Pattern::B));
    }

    #[test]
    fn test_coverage_repair_single_role_group() {
        // 同角色整组卡在 A → 修复后两种模式都有
        let mut staff = vec![
            StaffMember::new(1, "正式1", Role::Senior, Some(5)),
            StaffMember::new(2, "正式2", Role::Senior, Some(5)),
        ];
        for s in &mut staff {
            s.pattern = Pattern::A;
        }
        let mut state = RosterState::new(staff);

        let repaired = PatternAssigner::new().ensure_group_coverage(&mut state);
        assert_eq!(repaired, 1);
        let (a, b) = state.pattern_counts();
        assert_eq!((a, b), (1, 1));
    }

    #[test]
    fn test_coverage_repair_flips_minority_role() {
        // 2正1见 全部 A → 翻转见习 (少数角色)
        let mut staff = vec![
            StaffMember::new(1, "正式1", Role::Senior, Some(5)),
            StaffMember::new(2, "正式2", Role::Senior, Some(5)),
            StaffMember::new(3, "见习1", Role::Junior, Some(5)),
        ];
        for s in &mut staff {
            s.pattern = Pattern::A;
        }
        let mut state = RosterState::new(staff);

        PatternAssigner::new().ensure_group_coverage(&mut state);
        assert_eq!(state.find_staff(3).unwrap().pattern, Pattern::B);
        assert_eq!(state.find_staff(1).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(2).unwrap().pattern, Pattern::A);
    }

    #[test]
    fn test_coverage_repair_is_idempotent() {
        let mut staff = vec![
            StaffMember::new(1, "正式1", Role::Senior, Some(5)),
            StaffMember::new(2, "正式2", Role::Senior, Some(5)),
        ];
        for s in &mut staff {
            s.pattern = Pattern::B;
        }
        let mut state = RosterState::new(staff);

        let assigner = PatternAssigner::new();
        assert_eq!(assigner.ensure_group_coverage(&mut state), 1);
        // 第二次运行无任何改动
        assert_eq!(assigner.ensure_group_coverage(&mut state), 0);
    }

    #[test]
    fn test_apply_preset_with_fallback() {
        let mut state = create_test_state(1);
        let mut preset = BTreeMap::new();
        preset.insert(1, Pattern::B);
        preset.insert(2, Pattern::B);
        preset.insert(3, Pattern::A);
        // 员工4缺失 → 按角色规则回退 (见习 → B)

        PatternAssigner::new().apply_preset(&mut state, &preset);
        assert_eq!(state.find_staff(1).unwrap().pattern, Pattern::B);
        assert_eq!(state.find_staff(3).unwrap().pattern, Pattern::A);
        assert_eq!(state.find_staff(4).unwrap().pattern, Pattern::B);
    }
}
