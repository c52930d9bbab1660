// ==========================================
// 营地勤务排班系统 - 核心库
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 系统宪法
// 技术栈: Rust + JSON 配置 + CSV 输出
// 系统定位: 启发式排班引擎 (残余违规留给人工复查)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 名册/勤务目录/会话计划
pub mod config;

// 错误类型
pub mod error;

// 结果导出
pub mod export;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AssignmentKind, DutyCategory, DutyRole, Pattern, Role};

// 领域实体
pub use domain::{Assignment, AssignmentRow, Duty, DutyCatalog, RosterState, StaffMember};

// 配置
pub use config::{Catalog, OverrideSpec, SessionPlan, WeekPlan};

// 引擎
pub use engine::{
    BalanceEngine, DutyFiller, DutyProtectionPolicy, OverrideProcessor, PatternAssigner,
    RosterOrchestrator, SessionPlanner, SessionRoster, WeekRoster,
};

// 错误
pub use error::{RosterError, RosterResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "营地勤务排班系统";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
