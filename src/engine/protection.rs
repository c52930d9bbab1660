// ==========================================
// 营地勤务排班系统 - 勤务保护策略
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.5 校验器 / 9. 设计决策
// ==========================================
// 职责: 全部校验器共享的唯一保护规则来源
// 红线: 禁止在校验器内部维护私有的勤务ID清单
// ==========================================

use crate::config::OverrideSpec;
use crate::domain::types::day_sort_key;
use crate::domain::{DutyCatalog, RosterState};
use chrono::Weekday;
use std::collections::{BTreeSet, HashSet};

// ==========================================
// DutyProtectionPolicy - 勤务保护策略
// ==========================================

/// 勤务保护策略
///
/// 在填充引擎运行前由编排器构建:
/// - 受保护勤务: 特殊角色勤务 ∪ 免填充勤务 ∪ 配对勤务
/// - 锁定分配: 全部钉住类 (day, staff) 组合
#[derive(Debug, Clone, Default)]
pub struct DutyProtectionPolicy {
    protected_duties: BTreeSet<i64>,
    paired_duties: BTreeSet<i64>,
    locked: HashSet<(u32, i64)>,
    all_staff_days: HashSet<Weekday>,
}

impl DutyProtectionPolicy {
    /// 构建保护策略
    ///
    /// # 参数
    /// - catalog: 勤务目录
    /// - overrides: 周覆盖配置 (配对勤务与全员日来源)
    /// - state: 覆盖处理后的状态 (钉住分配来源)
    pub fn build(catalog: &DutyCatalog, overrides: &OverrideSpec, state: &RosterState) -> Self {
        let mut protected_duties = BTreeSet::new();
        for duty in &catalog.duties {
            if duty.special_role.is_some() || duty.fill_exempt {
                protected_duties.insert(duty.duty_id);
            }
        }
        let paired_duties: BTreeSet<i64> = overrides.paired_duties.keys().copied().collect();
        protected_duties.extend(paired_duties.iter().copied());

        let locked = state
            .assignments
            .iter()
            .filter(|a| a.kind.is_pinned())
            .map(|a| (day_sort_key(a.day), a.staff_id))
            .collect();

        Self {
            protected_duties,
            paired_duties,
            locked,
            all_staff_days: overrides.all_staff_days.iter().copied().collect(),
        }
    }

    /// 该勤务是否受保护 (校验器不得从中抽人)
    pub fn is_protected_duty(&self, duty_id: i64) -> bool {
        self.protected_duties.contains(&duty_id)
    }

    /// 该勤务是否可被校验器换人
    pub fn is_swappable_duty(&self, duty_id: i64) -> bool {
        !self.is_protected_duty(duty_id)
    }

    /// 该 (day, staff) 分配是否被钉住锁定
    pub fn is_locked(&self, day: Weekday, staff_id: i64) -> bool {
        self.locked.contains(&(day_sort_key(day), staff_id))
    }

    /// 是否为全员勤务日
    pub fn is_all_staff_day(&self, day: Weekday) -> bool {
        self.all_staff_days.contains(&day)
    }

    /// 配对勤务ID集合 (覆盖一致性校验的对象)
    pub fn paired_duty_ids(&self) -> &BTreeSet<i64> {
        &self.paired_duties
    }
}

// ==========================================
// 单元测试
// ==========================================
