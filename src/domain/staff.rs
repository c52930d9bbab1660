// ==========================================
// 营地勤务排班系统 - 人员实体
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型
// ==========================================

use crate::domain::types::{Pattern, Role};
use serde::{Deserialize, Serialize};

// ==========================================
// StaffMember - 员工
// ==========================================

/// 员工
///
/// 名册字段来自上游人员表; pattern / pattern_exception
/// 为排班期间的可变状态, 仅允许模式分配器、覆盖处理器
/// 与均衡引擎改写
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    // ===== 名册字段 (只读) =====
    pub staff_id: i64,
    pub staff_name: String,
    pub role: Role,
    /// 所属小组; 覆盖配置临时补入的人员无小组 (None),
    /// 不参与任何按组操作
    pub group_id: Option<i64>,

    // ===== 属性字段 (上游名册列, 供扩展勤务使用) =====
    #[serde(default)]
    pub tenure_years: i32,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub extroversion: i32,
    /// 特定勤务资格标记
    #[serde(default)]
    pub special_eligible: bool,

    // ===== 排班状态 (可变) =====
    /// 出勤模式; 模式分配器运行前为临时值
    #[serde(default)]
    pub pattern: Pattern,
    /// 特殊勤务调动覆盖了按组派生的模式时置位,
    /// 均衡引擎不得再翻转
    #[serde(default)]
    pub pattern_exception: bool,
}

impl StaffMember {
    /// 创建最小员工记录 (覆盖配置补入人员 / 测试用)
    ///
    /// # 参数
    /// - staff_id: 员工ID
    /// - staff_name: 姓名
    /// - role: 角色
    /// - group_id: 所属小组 (可空)
    pub fn new(staff_id: i64, staff_name: impl Into<String>, role: Role, group_id: Option<i64>) -> Self {
        Self {
            staff_id,
            staff_name: staff_name.into(),
            role,
            group_id,
            tenure_years: 0,
            gender: None,
            strength: 0,
            extroversion: 0,
            special_eligible: false,
            pattern: Pattern::A,
            pattern_exception: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let s = StaffMember::new(101, "测试员工", Role::Junior, None);
        assert_eq!(s.pattern, Pattern::A);
        assert!(!s.pattern_exception);
        assert!(s.group_id.is_none());
    }

    #[test]
    fn test_deserialize_roster_row() {
        // 名册行只需提供只读字段, 状态字段取默认值
        let json = r#"{
            "staff_id": 7,
            "staff_name": "张三",
            "role": "SENIOR",
            "group_id": 3,
            "tenure_years": 2
        }"#;
        let s: StaffMember = serde_json::from_str(json).unwrap();
        assert_eq!(s.staff_id, 7);
        assert_eq!(s.role, Role::Senior);
        assert_eq!(s.group_id, Some(3));
        assert_eq!(s.tenure_years, 2);
        assert_eq!(s.pattern, Pattern::A);
    }
}
