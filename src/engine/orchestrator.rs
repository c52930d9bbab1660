// ==========================================
// 营地勤务排班系统 - 单周编排器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4. 组件设计 (管线主流程)
// 用途: 协调模式分配、覆盖处理、均衡、填充与校验的执行顺序
// ==========================================

use crate::config::{Catalog, WeekPlan};
use crate::domain::types::{day_sort_key, AssignmentKind, Pattern};
use crate::domain::{AssignmentRow, RosterState, SUBSTITUTE_CODE};
use crate::engine::override_processor::OverrideSummary;
use crate::engine::{
    BalanceEngine, BalanceSummary, CoverageValidator, DutyFiller, DutyProtectionPolicy,
    FillSummary, HeadcountValidator, OverrideProcessor, PatternAssigner, RoleMixValidator,
};
use crate::error::{RosterError, RosterResult};
use chrono::Weekday;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument};

// ==========================================
// WeekRoster - 单周排班结果
// ==========================================

#[derive(Debug, Clone)]
pub struct WeekRoster {
    pub week_number: u32,

    // 富化结果行, 按 (日序, 小组, 姓名) 排序
    pub rows: Vec<AssignmentRow>,

    // 各阶段结果
    pub override_summary: OverrideSummary,
    pub balance_summary: Option<BalanceSummary>,
    pub fill_summary: FillSummary,
    pub validator_repairs: u32,

    /// 终检发现的 (day, staff) 重复条数 (残余违规, 供人工复查)
    pub duplicate_violations: u32,
}

// ==========================================
// RosterOrchestrator - 单周编排器
// ==========================================

pub struct RosterOrchestrator {
    assigner: PatternAssigner,
    overrides: OverrideProcessor,
    balance: BalanceEngine,
    filler: DutyFiller,
    role_mix: RoleMixValidator,
    headcount: HeadcountValidator,
    coverage: CoverageValidator,
}

impl RosterOrchestrator {
    pub fn new() -> Self {
        Self {
            assigner: PatternAssigner::new(),
            overrides: OverrideProcessor::new(),
            balance: BalanceEngine::new(),
            filler: DutyFiller::new(),
            role_mix: RoleMixValidator::new(),
            headcount: HeadcountValidator::new(),
            coverage: CoverageValidator::new(),
        }
    }

    /// 执行完整单周排班流程
    ///
    /// # 参数
    /// - catalog: 人员名册 + 勤务目录
    /// - days: 开展日 (有序)
    /// - week: 单周计划 (周序号 + 覆盖声明)
    /// - preset_patterns: 跨周预计算模式 (提供时跳过随机分配与均衡)
    /// - rng: 注入的随机源
    #[instrument(skip_all, fields(week_number = week.week_number))]
    pub fn generate_week(
        &self,
        catalog: &Catalog,
        days: &[Weekday],
        week: &WeekPlan,
        preset_patterns: Option<&BTreeMap<i64, Pattern>>,
        rng: &mut StdRng,
    ) -> RosterResult<WeekRoster> {
        if catalog.staff.is_empty() {
            return Err(RosterError::EmptyStaffTable);
        }
        if catalog.duties.is_empty() {
            return Err(RosterError::EmptyDutyCatalog);
        }

        info!(
            staff_count = catalog.staff.len(),
            duty_count = catalog.duties.len(),
            days = days.len(),
            preset = preset_patterns.is_some(),
            "开始执行单周排班流程"
        );

        let mut state = RosterState::new(catalog.staff.clone());

        // ==========================================
        // 步骤1: 模式分配 (或应用跨周预计算模式)
        // ==========================================
        debug!("步骤1: 模式分配");
        match preset_patterns {
            Some(preset) => self.assigner.apply_preset(&mut state, preset),
            None => self.assigner.assign(&mut state, rng),
        }
        self.assigner.ensure_group_coverage(&mut state);

        // ==========================================
        // 步骤2: 覆盖处理
        // ==========================================
        debug!("步骤2: 覆盖处理");
        let override_summary =
            self.overrides
                .apply(&mut state, &week.overrides, &catalog.duties, days);
        // 覆盖可能移动人员模式, 组内覆盖需要再修一次
        self.assigner.ensure_group_coverage(&mut state);

        // ==========================================
        // 步骤3: 模式均衡 (跨周预计算模式下跳过)
        // ==========================================
        let balance_summary = if preset_patterns.is_none() {
            debug!("步骤3: 模式均衡");
            Some(self.balance.balance(&mut state))
        } else {
            debug!("步骤3: 使用跨周模式, 均衡跳过");
            None
        };

        // ==========================================
        // 步骤4: 保护策略构建 + 贪心填充
        // ==========================================
        debug!("步骤4: 贪心填充");
        let policy = DutyProtectionPolicy::build(&catalog.duties, &week.overrides, &state);
        let fill_summary = self
            .filler
            .fill(&mut state, &catalog.duties, days, &policy, rng);

        // ==========================================
        // 步骤5: 不变量校验
        // ==========================================
        debug!("步骤5: 不变量校验");
        let mut validator_repairs = 0;
        validator_repairs += self
            .role_mix
            .validate(&mut state, &catalog.duties, &policy, days);
        validator_repairs += self
            .headcount
            .validate(&mut state, &catalog.duties, &policy, days);
        validator_repairs += self
            .coverage
            .validate(&mut state, &catalog.duties, &policy, days);

        // ==========================================
        // 步骤6: (day, staff) 唯一性终检
        // ==========================================
        debug!("步骤6: 唯一性终检");
        let duplicate_violations = self.audit_duplicates(&state);

        // ==========================================
        // 步骤7: 富化与排序
        // ==========================================
        let rows = self.enrich(&state, catalog);

        info!(
            rows = rows.len(),
            validator_repairs,
            duplicate_violations,
            substitutes = fill_summary.total_substitutes(),
            "单周排班流程完成"
        );

        Ok(WeekRoster {
            week_number: week.week_number,
            rows,
            override_summary,
            balance_summary,
            fill_summary,
            validator_repairs,
            duplicate_violations,
        })
    }

    /// 终检: 统计残余的 (day, staff) 重复并记错误日志
    fn audit_duplicates(&self, state: &RosterState) -> u32 {
        let mut counts: HashMap<(u32, i64), u32> = HashMap::new();
        for a in &state.assignments {
            *counts.entry((day_sort_key(a.day), a.staff_id)).or_insert(0) += 1;
        }
        let mut violations = 0;
        for ((day_key, staff_id), count) in counts {
            if count > 1 {
                error!(day_key, staff_id, count, "终检发现重复分配, 需人工复查");
                violations += count - 1;
            }
        }
        violations
    }

    /// 富化结果行并按 (日序, 小组, 姓名) 排序
    fn enrich(&self, state: &RosterState, catalog: &Catalog) -> Vec<AssignmentRow> {
        let mut keyed: Vec<(u32, AssignmentRow)> = state
            .assignments
            .iter()
            .filter_map(|a| {
                let staff = state.find_staff(a.staff_id)?;
                let (duty_code, duty_name) =
                    match a.duty_id.and_then(|id| catalog.duties.get(id)) {
                        Some(d) => (d.duty_code.clone(), d.duty_name.clone()),
                        None if a.kind == AssignmentKind::Substitute => {
                            (SUBSTITUTE_CODE.to_string(), "替补".to_string())
                        }
                        None => (String::new(), String::new()),
                    };
                let row = AssignmentRow {
                    day: a.day.to_string(),
                    staff_id: staff.staff_id,
                    staff_name: staff.staff_name.clone(),
                    role: staff.role,
                    pattern: staff.pattern,
                    group_id: staff.group_id,
                    duty_id: a.duty_id,
                    duty_code,
                    duty_name,
                    kind: a.kind,
                };
                Some((day_sort_key(a.day), row))
            })
            .collect();

        keyed.sort_by(|(dx, x), (dy, y)| {
            dx.cmp(dy)
                .then_with(|| {
                    x.group_id
                        .unwrap_or(i64::MAX)
                        .cmp(&y.group_id.unwrap_or(i64::MAX))
                })
                .then_with(|| x.staff_name.cmp(&y.staff_name))
        });
        keyed.into_iter().map(|(_, row)| row).collect()
    }
}

impl Default for RosterOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
