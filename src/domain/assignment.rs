// ==========================================
// 营地勤务排班系统 - 分配记录
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型 / 6. 外部接口
// 不变量: 最终结果中每个 (day, staff_id) 至多一条分配
// ==========================================

use crate::domain::types::{AssignmentKind, Pattern, Role};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// 替补记录的勤务代号
pub const SUBSTITUTE_CODE: &str = "SUB";

// ==========================================
// Assignment - 分配 (管线内部记录)
// ==========================================

/// 分配记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub day: Weekday,
    pub staff_id: i64,
    /// 替补 (Substitute) 无勤务
    pub duty_id: Option<i64>,
    pub kind: AssignmentKind,
}

impl Assignment {
    pub fn new(day: Weekday, staff_id: i64, duty_id: i64, kind: AssignmentKind) -> Self {
        Self {
            day,
            staff_id,
            duty_id: Some(duty_id),
            kind,
        }
    }

    /// 替补记录 (无勤务)
    pub fn substitute(day: Weekday, staff_id: i64) -> Self {
        Self {
            day,
            staff_id,
            duty_id: None,
            kind: AssignmentKind::Substitute,
        }
    }
}

// ==========================================
// AssignmentRow - 结果行 (富化输出)
// ==========================================

/// 富化后的结果行, 按 (日序, 小组, 姓名) 排序输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub day: String,
    pub staff_id: i64,
    pub staff_name: String,
    pub role: Role,
    pub pattern: Pattern,
    pub group_id: Option<i64>,
    pub duty_id: Option<i64>,
    pub duty_code: String,
    pub duty_name: String,
    pub kind: AssignmentKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_has_no_duty() {
        let a = Assignment::substitute(Weekday::Mon, 5);
        assert!(a.duty_id.is_none());
        assert_eq!(a.kind, AssignmentKind::Substitute);
    }
}
