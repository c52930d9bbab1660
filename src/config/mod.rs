// ==========================================
// 营地勤务排班系统 - 配置层
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 6. 外部接口
// ==========================================
// 职责: 覆盖配置与排期计划的强类型建模及加载
// 红线: 非法结构在加载期报错, 不得进入管线
// ==========================================

pub mod override_spec;
pub mod session_plan;

// 重导出核心配置类型
pub use override_spec::{FreeformPin, OverrideSpec, SpecialDutyOverride, StaffAddition};
pub use session_plan::{load_catalog, load_session_plan, Catalog, SessionPlan, WeekPlan};
