// ==========================================
// 营地勤务排班系统 - 不变量校验器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.5 校验器
// ==========================================
// 职责: 填充后的有界自动修复; 全部修复须记日志且幂等
// 红线: 保护规则一律取自 DutyProtectionPolicy
// ==========================================

pub mod coverage;
pub mod headcount;
pub mod role_mix;

pub use coverage::CoverageValidator;
pub use headcount::HeadcountValidator;
pub use role_mix::RoleMixValidator;
