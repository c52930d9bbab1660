// ==========================================
// 营地勤务排班系统 - 排期计划与目录加载
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 6. 外部接口 / 7. 错误处理
// ==========================================
// 职责: JSON 目录与排期计划的加载及加载期校验
// 红线: 结构性错误一律在加载期失败, 不得带病进入管线
// ==========================================

use crate::config::OverrideSpec;
use crate::domain::duty::DutyCatalog;
use crate::domain::staff::StaffMember;
use crate::domain::types::DutyRole;
use crate::error::{RosterError, RosterResult};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

// ==========================================
// Catalog - 人员名册 + 勤务目录
// ==========================================

/// 外部目录数据 (人员名册 + 勤务目录)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub staff: Vec<StaffMember>,
    pub duties: DutyCatalog,
}

impl Catalog {
    /// 加载期结构校验
    ///
    /// # 校验项
    /// - 名册与目录非空
    /// - 勤务ID唯一
    /// - 每个特殊勤务角色至多一个承担者
    pub fn validate(&self) -> RosterResult<()> {
        if self.staff.is_empty() {
            return Err(RosterError::EmptyStaffTable);
        }
        if self.duties.is_empty() {
            return Err(RosterError::EmptyDutyCatalog);
        }

        let mut seen_ids = HashSet::new();
        let mut seen_roles = HashSet::new();
        for duty in &self.duties.duties {
            if !seen_ids.insert(duty.duty_id) {
                return Err(RosterError::DuplicateDutyId {
                    duty_id: duty.duty_id,
                });
            }
            if let Some(role) = duty.special_role {
                if !seen_roles.insert(role) {
                    return Err(RosterError::DuplicateDutyRole {
                        role: role.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ==========================================
// WeekPlan / SessionPlan - 排期计划
// ==========================================

/// 单周计划
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week_number: u32,
    #[serde(default)]
    pub overrides: OverrideSpec,
}

/// 排期计划 (一期 = 多周, 共享一份全局模式映射)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    /// 随机种子; 缺省时按熵源初始化 (结果不可复现)
    #[serde(default)]
    pub seed: Option<u64>,
    /// 循环勤务开展日 (有序)
    #[serde(default = "default_days")]
    pub days: Vec<Weekday>,
    pub weeks: Vec<WeekPlan>,
}

fn default_days() -> Vec<Weekday> {
    vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]
}

impl SessionPlan {
    /// 加载期校验 (需结合目录)
    ///
    /// # 校验项
    /// - 周列表与开展日非空
    /// - 覆盖引用的勤务ID必须在目录中
    /// - 使用全员日/特殊勤务覆盖时, 目录必须定义对应特殊角色
    pub fn validate(&self, catalog: &Catalog) -> RosterResult<()> {
        if self.weeks.is_empty() {
            return Err(RosterError::ConfigInvalid("周列表为空".to_string()));
        }
        if self.days.is_empty() {
            return Err(RosterError::ConfigInvalid("开展日列表为空".to_string()));
        }

        for week in &self.weeks {
            for duty_id in week.overrides.referenced_duty_ids() {
                if catalog.duties.get(duty_id).is_none() {
                    return Err(RosterError::UnknownDuty { duty_id });
                }
            }
            if !week.overrides.all_staff_days.is_empty()
                && catalog.duties.all_staff_duty().is_none()
            {
                return Err(RosterError::MissingDutyRole {
                    role: DutyRole::AllStaff.to_string(),
                });
            }
            if week.overrides.special_duty.is_some() && catalog.duties.rotating_duty().is_none() {
                return Err(RosterError::MissingDutyRole {
                    role: DutyRole::Rotating.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ==========================================
// 加载函数
// ==========================================

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RosterResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| RosterError::ConfigRead {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| RosterError::ConfigParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// 加载并校验目录文件
pub fn load_catalog(path: &Path) -> RosterResult<Catalog> {
    let catalog: Catalog = read_json(path)?;
    catalog.validate()?;
    info!(
        path = %path.display(),
        staff_count = catalog.staff.len(),
        duty_count = catalog.duties.len(),
        "目录加载完成"
    );
    Ok(catalog)
}

/// 加载并校验排期计划文件
pub fn load_session_plan(path: &Path, catalog: &Catalog) -> RosterResult<SessionPlan> {
    let plan: SessionPlan = read_json(path)?;
    plan.validate(catalog)?;
    info!(
        path = %path.display(),
        week_count = plan.weeks.len(),
        seed = ?plan.seed,
        "排期计划加载完成"
    );
    Ok(plan)
}

// ==========================================
// 单元测试
// ==========================================
