// ==========================================
// 营地勤务排班系统 - 命令行主入口
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 6. 外部接口
// 用法: duty-roster-aps <名册.json> <会话计划.json> [输出.csv]
// ==========================================

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use duty_roster_aps::config::{load_catalog, load_session_plan};
use duty_roster_aps::engine::SessionPlanner;
use duty_roster_aps::export::write_session_csv;
use duty_roster_aps::logging;

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("营地勤务排班系统 - 启发式排班引擎");
    tracing::info!("系统版本: {}", duty_roster_aps::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let (catalog_path, plan_path) = match (args.next(), args.next()) {
        (Some(c), Some(p)) => (PathBuf::from(c), PathBuf::from(p)),
        _ => bail!("用法: duty-roster-aps <名册.json> <会话计划.json> [输出.csv]"),
    };
    let out_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("roster.csv"));

    tracing::info!("名册文件: {}", catalog_path.display());
    tracing::info!("会话计划: {}", plan_path.display());

    let catalog = load_catalog(&catalog_path).context("名册加载失败")?;
    let plan = load_session_plan(&plan_path, &catalog).context("会话计划加载失败")?;

    let session = SessionPlanner::new()
        .run_session(&catalog, &plan)
        .context("排班执行失败")?;

    let residual: u32 = session.weeks.iter().map(|w| w.duplicate_violations).sum();
    if residual > 0 {
        tracing::warn!(residual, "存在残余违规, 请人工复查输出");
    }

    write_session_csv(&out_path, &session).context("结果导出失败")?;
    tracing::info!("输出文件: {}", out_path.display());

    Ok(())
}
