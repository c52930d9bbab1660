// ==========================================
// 多周会话规划集成测试
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md
// 职责: 验证跨周模式一致性、可复现性与端到端导出
// ==========================================

use chrono::Weekday;
use duty_roster_aps::config::{Catalog, OverrideSpec, SessionPlan, WeekPlan};
use duty_roster_aps::domain::types::{DutyCategory, DutyRole, Pattern, Role};
use duty_roster_aps::domain::{Duty, DutyCatalog, StaffMember};
use duty_roster_aps::engine::SessionPlanner;
use duty_roster_aps::export::write_session_csv;
use std::collections::BTreeMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn create_test_duty(duty_id: i64, role: Option<DutyRole>) -> Duty {
    Duty {
        duty_id,
        duty_code: format!("D{:03}", duty_id),
        duty_name: format!("勤务{}", duty_id),
        category: DutyCategory::Recurring,
        min_required: 1,
        normal_target: 2,
        max_allowed: 4,
        priority: duty_id as i32,
        instructions: String::new(),
        special_role: role,
        fill_exempt: matches!(role, Some(DutyRole::AllStaff) | Some(DutyRole::Rotating)),
    }
}

fn create_test_catalog() -> Catalog {
    let mut staff = Vec::new();
    let mut id = 1;
    for gid in 1..=4 {
        for _ in 0..2 {
            staff.push(StaffMember::new(
                id,
                format!("正式{:02}", id),
                Role::Senior,
                Some(gid),
            ));
            id += 1;
        }
        for _ in 0..2 {
            staff.push(StaffMember::new(
                id,
                format!("见习{:02}", id),
                Role::Junior,
                Some(gid),
            ));
            id += 1;
        }
    }
    let duties = DutyCatalog::new(vec![
        create_test_duty(100, None),
        create_test_duty(200, Some(DutyRole::AllStaff)),
        create_test_duty(300, Some(DutyRole::Rotating)),
        create_test_duty(400, Some(DutyRole::RoleMix)),
        create_test_duty(500, None),
    ]);
    Catalog { staff, duties }
}

fn create_plan(weeks: usize, seed: u64) -> SessionPlan {
    SessionPlan {
        seed: Some(seed),
        days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
        weeks: (1..=weeks as u32)
            .map(|week_number| WeekPlan {
                week_number,
                overrides: OverrideSpec::default(),
            })
            .collect(),
    }
}

// ==========================================
// 跨周一致性
// ==========================================

#[test]
fn test_patterns_never_drift_across_weeks() {
    let catalog = create_test_catalog();
    let plan = create_plan(4, 42);
    let session = SessionPlanner::new().run_session(&catalog, &plan).unwrap();

    assert_eq!(session.weeks.len(), 4);
    let mut observed: BTreeMap<i64, Pattern> = BTreeMap::new();
    for week in &session.weeks {
        for row in &week.rows {
            if let Some(p) = observed.insert(row.staff_id, row.pattern) {
                assert_eq!(
                    p, row.pattern,
                    "员工{}第{}周模式漂移",
                    row.staff_id, week.week_number
                );
            }
        }
    }
}

#[test]
fn test_multi_week_skips_balance_single_week_runs_it() {
    let catalog = create_test_catalog();
    let planner = SessionPlanner::new();

    let multi = planner
        .run_session(&catalog, &create_plan(2, 9))
        .unwrap();
    assert!(multi.pattern_map.is_some());
    assert!(multi.weeks.iter().all(|w| w.balance_summary.is_none()));

    let single = planner
        .run_session(&catalog, &create_plan(1, 9))
        .unwrap();
    assert!(single.pattern_map.is_none());
    assert!(single.weeks[0].balance_summary.is_some());
}

#[test]
fn test_week_overrides_only_affect_their_week() {
    let catalog = create_test_catalog();
    let mut plan = create_plan(2, 15);
    plan.weeks[1].overrides.staff_to_remove.push(3);
    let session = SessionPlanner::new().run_session(&catalog, &plan).unwrap();

    assert!(session.weeks[0].rows.iter().any(|r| r.staff_id == 3));
    assert!(session.weeks[1].rows.iter().all(|r| r.staff_id != 3));
}

#[test]
fn test_named_staff_split_across_patterns_in_map() {
    let catalog = create_test_catalog();
    let mut plan = create_plan(2, 7);
    plan.weeks[0]
        .overrides
        .paired_duties
        .insert(100, vec![1, 5, 9, 13]);
    let map = SessionPlanner::new().plan_patterns(&catalog, &plan);

    let a_count = [1i64, 5, 9, 13]
        .iter()
        .filter(|id| map[id] == Pattern::A)
        .count();
    assert_eq!(a_count, 2, "指名人员应在两种模式间交替落位");
}

// ==========================================
// 可复现性与导出
// ==========================================

#[test]
fn test_seeded_session_reproducible_end_to_end() {
    let catalog = create_test_catalog();
    let plan = create_plan(3, 2024);
    let planner = SessionPlanner::new();

    let first = planner.run_session(&catalog, &plan).unwrap();
    let second = planner.run_session(&catalog, &plan).unwrap();

    assert_eq!(first.weeks.len(), second.weeks.len());
    for (w1, w2) in first.weeks.iter().zip(second.weeks.iter()) {
        let k1: Vec<(String, i64, Option<i64>)> = w1
            .rows
            .iter()
            .map(|r| (r.day.clone(), r.staff_id, r.duty_id))
            .collect();
        let k2: Vec<(String, i64, Option<i64>)> = w2
            .rows
            .iter()
            .map(|r| (r.day.clone(), r.staff_id, r.duty_id))
            .collect();
        assert_eq!(k1, k2, "同种子会话第{}周结果不一致", w1.week_number);
    }
}

#[test]
fn test_session_csv_round_trip() {
    let catalog = create_test_catalog();
    let plan = create_plan(2, 88);
    let session = SessionPlanner::new().run_session(&catalog, &plan).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.csv");
    write_session_csv(&path, &session).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let total_rows: usize = session.weeks.iter().map(|w| w.rows.len()).sum();
    // 表头 + 数据行
    assert_eq!(content.lines().count(), total_rows + 1);
    assert!(content.lines().skip(1).all(|l| l.starts_with("1,") || l.starts_with("2,")));
}
