// ==========================================
// 营地勤务排班系统 - 统一错误类型
// ==========================================
// 依据: Rust 错误处理最佳实践
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 排班系统错误类型
#[derive(Error, Debug)]
pub enum RosterError {
    // ===== 配置错误 (加载期, 致命) =====
    #[error("配置文件读取失败: {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置校验失败: {0}")]
    ConfigInvalid(String),

    // ===== 目录数据错误 (加载期, 致命) =====
    #[error("人员名册为空")]
    EmptyStaffTable,

    #[error("勤务目录为空")]
    EmptyDutyCatalog,

    #[error("勤务目录重复ID: duty_id={duty_id}")]
    DuplicateDutyId { duty_id: i64 },

    #[error("特殊勤务角色重复: role={role}")]
    DuplicateDutyRole { role: String },

    #[error("覆盖配置引用了不存在的勤务: duty_id={duty_id}")]
    UnknownDuty { duty_id: i64 },

    #[error("覆盖配置需要 {role} 勤务, 但目录中未定义")]
    MissingDutyRole { role: String },

    // ===== 业务规则错误 =====
    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ===== 通用错误 =====
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV导出失败: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type RosterResult<T> = Result<T, RosterError>;
