// ==========================================
// 营地勤务排班系统 - 周覆盖配置
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型 / 4.2 覆盖处理
// ==========================================
// 职责: 强类型覆盖配置, 非法结构在加载期报错
// 红线: 禁止开放式键值映射, 所有覆盖类别必须具名建模
// ==========================================

use crate::domain::types::Role;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// StaffAddition - 补入人员
// ==========================================

/// 覆盖配置补入的人员 (名册外)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAddition {
    pub staff_id: i64,
    pub staff_name: String,
    /// 缺省按正式辅导员补入
    #[serde(default)]
    pub role: Option<Role>,
    /// 缺省无小组 (不参与按组操作)
    #[serde(default)]
    pub group_id: Option<i64>,
}

// ==========================================
// SpecialDutyOverride - 特殊勤务覆盖
// ==========================================

/// 轮转特殊勤务的开展日与指定人员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialDutyOverride {
    pub days: Vec<Weekday>,
    pub staff: Vec<i64>,
}

// ==========================================
// FreeformPin - 自由钉住项
// ==========================================

/// 自由钉住项
///
/// days 为空 (None) 时按每名人员自身模式钉到所有匹配日
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeformPin {
    pub duty_id: i64,
    pub staff_ids: Vec<i64>,
    #[serde(default)]
    pub days: Option<Vec<Weekday>>,
}

// ==========================================
// OverrideSpec - 周覆盖配置
// ==========================================

/// 周覆盖配置
///
/// 各字段均可缺省; 处理顺序见覆盖处理器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideSpec {
    /// 移除人员ID列表
    #[serde(default)]
    pub staff_to_remove: Vec<i64>,

    /// 补入人员列表
    #[serde(default)]
    pub staff_to_add: Vec<StaffAddition>,

    /// 全员勤务日
    #[serde(default)]
    pub all_staff_days: Vec<Weekday>,

    /// 配对勤务: duty_id → 指定人员列表 (前两名构成配对)
    #[serde(default)]
    pub paired_duties: std::collections::BTreeMap<i64, Vec<i64>>,

    /// 轮转特殊勤务覆盖
    #[serde(default)]
    pub special_duty: Option<SpecialDutyOverride>,

    /// 自由钉住项
    #[serde(default)]
    pub freeform_pins: Vec<FreeformPin>,
}

impl OverrideSpec {
    /// 覆盖配置引用的全部勤务ID (供加载期校验)
    pub fn referenced_duty_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.paired_duties.keys().copied().collect();
        ids.extend(self.freeform_pins.iter().map(|p| p.duty_id));
        ids
    }

    /// 被任何覆盖类别点名的人员集合 (跨周模式规划用)
    ///
    /// 全员勤务日不点名具体人员, 不计入
    pub fn named_staff(&self) -> BTreeSet<i64> {
        let mut set = BTreeSet::new();
        for staff in self.paired_duties.values() {
            set.extend(staff.iter().copied());
        }
        if let Some(sd) = &self.special_duty {
            set.extend(sd.staff.iter().copied());
        }
        for pin in &self.freeform_pins {
            set.extend(pin.staff_ids.iter().copied());
        }
        set
    }
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let spec = OverrideSpec::default();
        assert!(spec.staff_to_remove.is_empty());
        assert!(spec.paired_duties.is_empty());
        assert!(spec.special_duty.is_none());
        assert!(spec.named_staff().is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        // 只给出部分字段, 其余取缺省
        let json = r#"{
            "all_staff_days": ["Fri"],
            "paired_duties": { "1090": [11, 12] },
            "freeform_pins": [
                { "duty_id": 1050, "staff_ids": [21], "days": ["Mon", "Wed"] }
            ]
        }"#;
        let spec: OverrideSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.all_staff_days, vec![Weekday::Fri]);
        assert_eq!(spec.paired_duties.get(&1090).unwrap(), &vec![11, 12]);
        assert_eq!(spec.freeform_pins[0].days.as_ref().unwrap().len(), 2);
        assert!(spec.staff_to_add.is_empty());
    }

    #[test]
    fn test_named_staff_union() {
        let json = r#"{
            "paired_duties": { "1090": [11, 12] },
            "special_duty": { "days": ["Tue", "Thu"], "staff": [12, 31] },
            "freeform_pins": [ { "duty_id": 1050, "staff_ids": [41] } ]
        }"#;
        let spec: OverrideSpec = serde_json::from_str(json).unwrap();
        let named: Vec<i64> = spec.named_staff().into_iter().collect();
        assert_eq!(named, vec![11, 12, 31, 41]);
    }

    #[test]
    fn test_referenced_duty_ids() {
        let json = r#"{
            "paired_duties": { "1090": [11, 12] },
            "freeform_pins": [ { "duty_id": 1050, "staff_ids": [41] } ]
        }"#;
        let spec: OverrideSpec = serde_json::from_str(json).unwrap();
        let mut ids = spec.referenced_duty_ids();
        ids.sort();
        assert_eq!(ids, vec![1050, 1090]);
    }
}
