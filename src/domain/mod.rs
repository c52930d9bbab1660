// ==========================================
// 营地勤务排班系统 - 领域模型层
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 3. 数据模型
// ==========================================
// 职责: 定义领域实体、类型与排班工作状态
// 红线: 不含配置加载逻辑, 不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod duty;
pub mod roster;
pub mod staff;
pub mod types;

// 重导出核心类型
pub use assignment::{Assignment, AssignmentRow, SUBSTITUTE_CODE};
pub use duty::{Duty, DutyCatalog};
pub use roster::RosterState;
pub use staff::StaffMember;
pub use types::{
    day_sort_key, pattern_for_day, AssignmentKind, DutyCategory, DutyRole, Pattern, Role,
};
