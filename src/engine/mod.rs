// ==========================================
// 营地勤务排班系统 - 引擎层
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4. 组件设计
// ==========================================
// 职责: 实现排班业务规则引擎
// 红线: 保护规则统一经 DutyProtectionPolicy 判定, 引擎不得各自硬编码
// ==========================================

pub mod balance;
pub mod duty_filler;
pub mod orchestrator;
pub mod override_processor;
pub mod pattern_assigner;
pub mod protection;
pub mod session;
pub mod validators;

// 重导出核心引擎
pub use balance::{BalanceEngine, BalanceSummary};
pub use duty_filler::{DutyFiller, FillSummary};
pub use orchestrator::{RosterOrchestrator, WeekRoster};
pub use override_processor::{OverrideProcessor, OverrideSummary};
pub use pattern_assigner::PatternAssigner;
pub use protection::DutyProtectionPolicy;
pub use session::{SessionPlanner, SessionRoster};
pub use validators::{CoverageValidator, HeadcountValidator, RoleMixValidator};
