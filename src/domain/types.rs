// ==========================================
// 营地勤务排班系统 - 领域类型定义
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型
// 红线: 工作日→模式 映射只在本文件定义一次
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 出勤模式 (Pattern)
// ==========================================
// 每名员工归属 A 或 B 轮换模式之一, 决定其常规勤务日
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Pattern {
    #[default]
    A, // A 模式 (周一/周三)
    B, // B 模式 (周二/周四)
}

impl Pattern {
    /// 返回相反的模式
    pub fn flip(self) -> Self {
        match self {
            Pattern::A => Pattern::B,
            Pattern::B => Pattern::A,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::A => write!(f, "A"),
            Pattern::B => write!(f, "B"),
        }
    }
}

/// 工作日 → 出勤模式 的统一映射
///
/// 禁止在调用点重新推导该规则
///
/// # 参数
/// - day: 工作日
///
/// # 返回
/// 该日对应的出勤模式
pub fn pattern_for_day(day: Weekday) -> Pattern {
    match day {
        Weekday::Mon | Weekday::Wed => Pattern::A,
        _ => Pattern::B,
    }
}

/// 工作日排序键 (周一 = 1)
pub fn day_sort_key(day: Weekday) -> u32 {
    day.number_from_monday()
}

// ==========================================
// 人员角色 (Role)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与上游名册一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Senior, // 正式辅导员
    Junior, // 见习辅导员
}

impl Role {
    pub fn opposite(self) -> Self {
        match self {
            Role::Senior => Role::Junior,
            Role::Junior => Role::Senior,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Senior => write!(f, "SENIOR"),
            Role::Junior => write!(f, "JUNIOR"),
        }
    }
}

// ==========================================
// 勤务类别 (Duty Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyCategory {
    Recurring, // 每日循环勤务 (排班周期内每天开展)
    OneOff,    // 单次勤务 (周期内只开展一次)
}

impl fmt::Display for DutyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyCategory::Recurring => write!(f, "RECURRING"),
            DutyCategory::OneOff => write!(f, "ONE_OFF"),
        }
    }
}

// ==========================================
// 特殊勤务角色 (Duty Role)
// ==========================================
// 红线: 校验器通过符号角色定位特殊勤务, 不得使用魔法数字ID
// (历史系统中数字ID多处不一致, 已定性为数据缺陷)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyRole {
    AllStaff, // 全员勤务 (指定日全体参加)
    RoleMix,  // 角色配比勤务 (每日 1-2 名正式 + 1-2 名见习)
    Rotating, // 轮转特殊勤务 (每个开展日最低 2 人)
}

impl fmt::Display for DutyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyRole::AllStaff => write!(f, "ALL_STAFF"),
            DutyRole::RoleMix => write!(f, "ROLE_MIX"),
            DutyRole::Rotating => write!(f, "ROTATING"),
        }
    }
}

// ==========================================
// 分配类型 (Assignment Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentKind {
    PinnedLocked, // 人工钉死 (自由覆盖项, 任何引擎不得改动)
    Pinned,       // 引擎钉住 (全员日/配对勤务/特殊勤务派生)
    Normal,       // 常规填充 (最低/目标阶段)
    Overflow,     // 溢出填充 (按优先级补位)
    Substitute,   // 替补 (所有阶段结束后未获分配)
}

impl AssignmentKind {
    /// 是否为钉住类分配 (均衡引擎与填充引擎不得触碰)
    pub fn is_pinned(self) -> bool {
        matches!(self, AssignmentKind::PinnedLocked | AssignmentKind::Pinned)
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentKind::PinnedLocked => write!(f, "PINNED_LOCKED"),
            AssignmentKind::Pinned => write!(f, "PINNED"),
            AssignmentKind::Normal => write!(f, "NORMAL"),
            AssignmentKind::Overflow => write!(f, "OVERFLOW"),
            AssignmentKind::Substitute => write!(f, "SUBSTITUTE"),
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
