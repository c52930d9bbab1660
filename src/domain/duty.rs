// ==========================================
// 营地勤务排班系统 - 勤务目录
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型
// 红线: 目录顺序即填充顺序, 加载后不得重排
// ==========================================

use crate::domain::types::{DutyCategory, DutyRole};
use serde::{Deserialize, Serialize};

// ==========================================
// Duty - 勤务
// ==========================================

/// 勤务定义 (目录行)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    // ===== 标识 =====
    pub duty_id: i64,
    pub duty_code: String,
    pub duty_name: String,
    pub category: DutyCategory,

    // ===== 人数约束 =====
    /// 最低人数 (阶段1目标)
    pub min_required: u32,
    /// 常规人数 (阶段2目标)
    pub normal_target: u32,
    /// 人数上限 (阶段3溢出上限)
    pub max_allowed: u32,

    // ===== 填充控制 =====
    /// 溢出优先级 (越小越优先)
    #[serde(default)]
    pub priority: i32,
    /// 岗位说明
    #[serde(default)]
    pub instructions: String,
    /// 特殊勤务角色 (符号化, 每个角色全目录至多一个)
    #[serde(default)]
    pub special_role: Option<DutyRole>,
    /// 免于自动填充 (仅接受钉住分配)
    #[serde(default)]
    pub fill_exempt: bool,
}

impl Duty {
    pub fn is_role_mix(&self) -> bool {
        self.special_role == Some(DutyRole::RoleMix)
    }

    pub fn is_all_staff(&self) -> bool {
        self.special_role == Some(DutyRole::AllStaff)
    }

    pub fn is_rotating(&self) -> bool {
        self.special_role == Some(DutyRole::Rotating)
    }
}

// ==========================================
// DutyCatalog - 勤务目录
// ==========================================

/// 勤务目录
///
/// 保持加载顺序 (填充引擎按目录顺序遍历)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DutyCatalog {
    pub duties: Vec<Duty>,
}

impl DutyCatalog {
    pub fn new(duties: Vec<Duty>) -> Self {
        Self { duties }
    }

    /// 按ID查找勤务
    pub fn get(&self, duty_id: i64) -> Option<&Duty> {
        self.duties.iter().find(|d| d.duty_id == duty_id)
    }

    /// 查找承担指定特殊角色的勤务
    pub fn by_role(&self, role: DutyRole) -> Option<&Duty> {
        self.duties.iter().find(|d| d.special_role == Some(role))
    }

    /// 全员勤务
    pub fn all_staff_duty(&self) -> Option<&Duty> {
        self.by_role(DutyRole::AllStaff)
    }

    /// 角色配比勤务
    pub fn role_mix_duty(&self) -> Option<&Duty> {
        self.by_role(DutyRole::RoleMix)
    }

    /// 轮转特殊勤务
    pub fn rotating_duty(&self) -> Option<&Duty> {
        self.by_role(DutyRole::Rotating)
    }

    pub fn len(&self) -> usize {
        self.duties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duties.is_empty()
    }
}
