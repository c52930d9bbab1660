// ==========================================
// 营地勤务排班系统 - 排班工作状态
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型
// ==========================================
// 职责: 管线各阶段共享的唯一可变状态
// 红线: 各引擎只改写自己声明的字段, 钉住人员集合只增不减
// ==========================================

use crate::domain::staff::StaffMember;
use crate::domain::types::Pattern;
use crate::domain::Assignment;
use chrono::Weekday;
use std::collections::{BTreeSet, HashSet};

// ==========================================
// RosterState - 排班工作状态
// ==========================================

/// 排班工作状态
///
/// 由编排器创建, 依次穿过模式分配器、覆盖处理器、
/// 均衡引擎、填充引擎与各校验器
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    /// 在册员工 (覆盖处理器可增删)
    pub staff: Vec<StaffMember>,
    /// 钉住人员集合 (覆盖处理器写入, 下游只读)
    pub pinned_staff: BTreeSet<i64>,
    /// 分配记录 (覆盖处理器与填充引擎追加, 校验器可改写 duty_id)
    pub assignments: Vec<Assignment>,
}

impl RosterState {
    pub fn new(staff: Vec<StaffMember>) -> Self {
        Self {
            staff,
            pinned_staff: BTreeSet::new(),
            assignments: Vec::new(),
        }
    }

    // ===== 员工访问 =====

    pub fn find_staff(&self, staff_id: i64) -> Option<&StaffMember> {
        self.staff.iter().find(|s| s.staff_id == staff_id)
    }

    pub fn find_staff_mut(&mut self, staff_id: i64) -> Option<&mut StaffMember> {
        self.staff.iter_mut().find(|s| s.staff_id == staff_id)
    }

    /// 移除员工; 返回是否存在
    pub fn remove_staff(&mut self, staff_id: i64) -> bool {
        let before = self.staff.len();
        self.staff.retain(|s| s.staff_id != staff_id);
        self.staff.len() < before
    }

    // ===== 小组访问 =====

    /// 升序去重的小组ID列表 (无小组人员不计)
    pub fn sorted_group_ids(&self) -> Vec<i64> {
        let set: BTreeSet<i64> = self.staff.iter().filter_map(|s| s.group_id).collect();
        set.into_iter().collect()
    }

    pub fn group_members(&self, group_id: i64) -> Vec<&StaffMember> {
        self.staff
            .iter()
            .filter(|s| s.group_id == Some(group_id))
            .collect()
    }

    /// 翻转整组模式; 返回受影响人数
    pub fn flip_group(&mut self, group_id: i64) -> usize {
        let mut flipped = 0;
        for s in self
            .staff
            .iter_mut()
            .filter(|s| s.group_id == Some(group_id))
        {
            s.pattern = s.pattern.flip();
            flipped += 1;
        }
        flipped
    }

    /// 小组是否含钉住或模式例外人员 (这类小组不得整组翻转)
    pub fn group_has_protected_member(&self, group_id: i64) -> bool {
        self.staff
            .iter()
            .filter(|s| s.group_id == Some(group_id))
            .any(|s| s.pattern_exception || self.pinned_staff.contains(&s.staff_id))
    }

    // ===== 模式统计 =====

    /// 全局 (A人数, B人数)
    pub fn pattern_counts(&self) -> (usize, usize) {
        let a = self
            .staff
            .iter()
            .filter(|s| s.pattern == Pattern::A)
            .count();
        (a, self.staff.len() - a)
    }

    /// 指定角色的 (A人数, B人数)
    pub fn role_pattern_counts(&self, role: crate::domain::types::Role) -> (usize, usize) {
        let mut a = 0;
        let mut b = 0;
        for s in self.staff.iter().filter(|s| s.role == role) {
            match s.pattern {
                Pattern::A => a += 1,
                Pattern::B => b += 1,
            }
        }
        (a, b)
    }

    // ===== 钉住集合 =====

    pub fn mark_pinned(&mut self, staff_id: i64) {
        self.pinned_staff.insert(staff_id);
    }

    pub fn is_pinned(&self, staff_id: i64) -> bool {
        self.pinned_staff.contains(&staff_id)
    }

    // ===== 分配记录 =====

    pub fn push_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// 指定日已有分配的人员集合
    pub fn staff_assigned_on(&self, day: Weekday) -> HashSet<i64> {
        self.assignments
            .iter()
            .filter(|a| a.day == day)
            .map(|a| a.staff_id)
            .collect()
    }

    /// 指定日指定勤务的当前人数
    pub fn duty_count_on(&self, day: Weekday, duty_id: i64) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.day == day && a.duty_id == Some(duty_id))
            .count()
    }
}

// ==========================================
// 单元测试
// ==========================================
