// ==========================================
// 营地勤务排班系统 - 结果导出
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 6. 外部接口
// 职责: 把会话排班结果按行投影写出 CSV
// ==========================================

use crate::domain::types::{AssignmentKind, Pattern, Role};
use crate::engine::SessionRoster;
use crate::error::RosterResult;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

/// CSV 输出行 (结果行外加周序号)
#[derive(Serialize)]
struct CsvRow<'a> {
    week: u32,
    day: &'a str,
    staff_id: i64,
    staff_name: &'a str,
    role: Role,
    pattern: Pattern,
    group_id: Option<i64>,
    duty_id: Option<i64>,
    duty_code: &'a str,
    duty_name: &'a str,
    kind: AssignmentKind,
}

/// 把会话排班结果写出 CSV (行序 = 周序 → 日序 → 小组 → 姓名)
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_session_csv(path: &Path, session: &SessionRoster) -> RosterResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut rows = 0usize;
    for week in &session.weeks {
        for row in &week.rows {
            writer.serialize(CsvRow {
                week: week.week_number,
                day: &row.day,
                staff_id: row.staff_id,
                staff_name: &row.staff_name,
                role: row.role,
                pattern: row.pattern,
                group_id: row.group_id,
                duty_id: row.duty_id,
                duty_code: &row.duty_code,
                duty_name: &row.duty_name,
                kind: row.kind,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!(rows, weeks = session.weeks.len(), "CSV 导出完成");
    Ok(())
}

// ==========================================
// 单元测试
// ==========================================
