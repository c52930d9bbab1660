// ==========================================
// 营地勤务排班系统 - 多周会话规划器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.6 会话规划
// 职责: 跨周模式一致性; 整个会话内每人模式固定不变
// 红线: 指名人员 (配对/特殊/钉点声明中出现者) 须在两种模式间交替落位
// ==========================================

use crate::config::{Catalog, SessionPlan};
use crate::domain::types::{Pattern, Role};
use crate::engine::balance::ROLE_SKEW_TOLERANCE;
use crate::engine::{RosterOrchestrator, WeekRoster};
use crate::error::RosterResult;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

// ==========================================
// SessionRoster - 会话排班结果
// ==========================================

#[derive(Debug, Clone)]
pub struct SessionRoster {
    /// 跨周模式表 (多于一周时生效)
    pub pattern_map: Option<BTreeMap<i64, Pattern>>,
    pub weeks: Vec<WeekRoster>,
}

// ==========================================
// SessionPlanner - 多周会话规划器
// ==========================================

pub struct SessionPlanner {
    orchestrator: RosterOrchestrator,
}

impl SessionPlanner {
    pub fn new() -> Self {
        Self {
            orchestrator: RosterOrchestrator::new(),
        }
    }

    /// 执行整个会话的排班
    ///
    /// 单周会话直接走完整单周管线 (含随机分配与均衡);
    /// 多周会话先预计算跨周模式表, 每周以同一张表生成
    #[instrument(skip_all, fields(weeks = plan.weeks.len()))]
    pub fn run_session(&self, catalog: &Catalog, plan: &SessionPlan) -> RosterResult<SessionRoster> {
        let mut rng = match plan.seed {
            Some(seed) => {
                debug!(seed, "使用固定随机种子");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let pattern_map = if plan.weeks.len() > 1 {
            Some(self.plan_patterns(catalog, plan))
        } else {
            None
        };

        let mut weeks = Vec::with_capacity(plan.weeks.len());
        for week in &plan.weeks {
            let roster = self.orchestrator.generate_week(
                catalog,
                &plan.days,
                week,
                pattern_map.as_ref(),
                &mut rng,
            )?;
            weeks.push(roster);
        }

        info!(weeks = weeks.len(), cross_week = pattern_map.is_some(), "会话排班完成");
        Ok(SessionRoster { pattern_map, weeks })
    }

    /// 预计算跨周模式表
    ///
    /// 1. 指名人员 (任一周的配对/特殊/钉点声明中出现) 按编号升序在 A/B 间交替
    /// 2. 其余人员按小组整组落位, 大组优先, 落到总人数较少的一侧
    /// 3. 角色偏斜超容差时把较大侧的灵活人员个别翻转
    #[instrument(skip_all)]
    pub fn plan_patterns(&self, catalog: &Catalog, plan: &SessionPlan) -> BTreeMap<i64, Pattern> {
        let known: BTreeSet<i64> = catalog.staff.iter().map(|s| s.staff_id).collect();
        let named: BTreeSet<i64> = plan
            .weeks
            .iter()
            .flat_map(|w| w.overrides.named_staff())
            .filter(|id| known.contains(id))
            .collect();

        let mut map: BTreeMap<i64, Pattern> = BTreeMap::new();
        let mut count_a = 0usize;
        let mut count_b = 0usize;

        // 步骤1: 指名人员交替落位
        for &staff_id in &named {
            let pattern = if count_a <= count_b {
                Pattern::A
            } else {
                Pattern::B
            };
            map.insert(staff_id, pattern);
            match pattern {
                Pattern::A => count_a += 1,
                Pattern::B => count_b += 1,
            }
        }

        // 步骤2: 灵活人员整组落位 (无小组者单人成组)
        let mut groups: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        let mut singles: Vec<i64> = Vec::new();
        for s in &catalog.staff {
            if named.contains(&s.staff_id) {
                continue;
            }
            match s.group_id {
                Some(gid) => groups.entry(gid).or_default().push(s.staff_id),
                None => singles.push(s.staff_id),
            }
        }
        let mut units: Vec<Vec<i64>> = groups.into_values().collect();
        units.extend(singles.into_iter().map(|id| vec![id]));
        // 大组优先, 同大小按首个编号保持确定性
        units.sort_by(|x, y| y.len().cmp(&x.len()).then_with(|| x.cmp(y)));

        for unit in units {
            let pattern = if count_a <= count_b {
                Pattern::A
            } else {
                Pattern::B
            };
            match pattern {
                Pattern::A => count_a += unit.len(),
                Pattern::B => count_b += unit.len(),
            }
            for staff_id in unit {
                map.insert(staff_id, pattern);
            }
        }

        // 步骤3: 角色偏斜修正
        self.rebalance_roles(catalog, &named, &mut map);

        info!(
            named = named.len(),
            count_a, count_b, "跨周模式表预计算完成"
        );
        map
    }

    /// 按角色检查 A/B 偏斜, 超容差时翻转较大侧的灵活人员
    fn rebalance_roles(
        &self,
        catalog: &Catalog,
        named: &BTreeSet<i64>,
        map: &mut BTreeMap<i64, Pattern>,
    ) {
        for role in [Role::Senior, Role::Junior] {
            let ids_a: Vec<i64> = catalog
                .staff
                .iter()
                .filter(|s| s.role == role && map.get(&s.staff_id) == Some(&Pattern::A))
                .map(|s| s.staff_id)
                .collect();
            let ids_b: Vec<i64> = catalog
                .staff
                .iter()
                .filter(|s| s.role == role && map.get(&s.staff_id) == Some(&Pattern::B))
                .map(|s| s.staff_id)
                .collect();

            let diff = ids_a.len().abs_diff(ids_b.len());
            if diff <= ROLE_SKEW_TOLERANCE {
                continue;
            }

            let (larger, target) = if ids_a.len() > ids_b.len() {
                (ids_a, Pattern::B)
            } else {
                (ids_b, Pattern::A)
            };
            let flips = diff / 2;
            let flexible: Vec<i64> = larger
                .into_iter()
                .filter(|id| !named.contains(id))
                .take(flips)
                .collect();
            if flexible.len() < flips {
                warn!(role = %role, flips, available = flexible.len(), "角色偏斜修正候选不足");
            }
            for staff_id in flexible {
                map.insert(staff_id, target);
                debug!(staff_id, target = %target, "角色偏斜修正: 翻转");
            }
        }
    }
}

impl Default for SessionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
