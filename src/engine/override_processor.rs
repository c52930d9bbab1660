// ==========================================
// 营地勤务排班系统 - 覆盖处理器
// ==========================================
// 依据: Roster_Engine_Design_v1.0.md - 4.2 覆盖处理
// ==========================================
// 职责: 按固定顺序应用周覆盖配置, 产出钉住分配
// 红线: 处理顺序不可调换, 每一步都可能改写下一步消费的状态;
//       引用缺失人员一律告警跳过, 不得中断管线
// ==========================================

use crate::config::OverrideSpec;
use crate::domain::types::{day_sort_key, pattern_for_day, AssignmentKind, Role};
use crate::domain::{Assignment, DutyCatalog, RosterState, StaffMember};
use chrono::Weekday;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// 特殊勤务每个开展日的最低人数
pub const MIN_SPECIAL_HEADCOUNT: usize = 2;

// ==========================================
// OverrideSummary - 覆盖处理结果
// ==========================================

#[derive(Debug, Clone, Default)]
pub struct OverrideSummary {
    /// 移除人数
    pub removed: u32,
    /// 补入人数
    pub added: u32,
    /// 产出的钉住分配条数 (去重前)
    pub pinned_assignments: u32,
    /// 去重丢弃条数
    pub deduplicated: u32,
    /// 引用缺失等告警次数
    pub warnings: u32,
}

// ==========================================
// OverrideProcessor - 覆盖处理器
// ==========================================

pub struct OverrideProcessor;

impl OverrideProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 应用周覆盖配置
    ///
    /// 处理顺序:
    /// 1. 移除/补入人员
    /// 2. 全员勤务日 (全体钉住)
    /// 3. 配对勤务 (必要时整组翻转制造 A/B 拆分)
    /// 4. 特殊勤务 (最低人数借调/均衡)
    /// 5. 自由钉住项
    /// 6. (day, staff) 去重, 保留首条; 角色配比勤务受保护
    ///
    /// # 参数
    /// - state: 排班工作状态
    /// - overrides: 周覆盖配置
    /// - catalog: 勤务目录
    /// - days: 本周开展日 (有序)
    #[instrument(skip_all, fields(days = days.len()))]
    pub fn apply(
        &self,
        state: &mut RosterState,
        overrides: &OverrideSpec,
        catalog: &DutyCatalog,
        days: &[Weekday],
    ) -> OverrideSummary {
        let mut summary = OverrideSummary::default();

        // ==========================================
        // 步骤1: 移除/补入人员
        // ==========================================
        self.apply_staff_changes(state, overrides, &mut summary);

        let all_staff_days: HashSet<Weekday> = overrides
            .all_staff_days
            .iter()
            .copied()
            .filter(|d| {
                if days.contains(d) {
                    true
                } else {
                    warn!(day = %d, "全员勤务日不在开展日集合内, 跳过");
                    false
                }
            })
            .collect();

        // ==========================================
        // 步骤2: 全员勤务日
        // ==========================================
        self.apply_all_staff_days(state, catalog, &all_staff_days, &mut summary);

        // ==========================================
        // 步骤3: 配对勤务
        // ==========================================
        self.apply_paired_duties(state, overrides, days, &all_staff_days, &mut summary);

        // ==========================================
        // 步骤4: 特殊勤务
        // ==========================================
        self.apply_special_duty(state, overrides, catalog, &mut summary);

        // ==========================================
        // 步骤5: 自由钉住项
        // ==========================================
        self.apply_freeform_pins(state, overrides, catalog, days, &all_staff_days, &mut summary);

        // ==========================================
        // 步骤6: 去重
        // ==========================================
        self.deduplicate(state, catalog, &mut summary);

        info!(
            removed = summary.removed,
            added = summary.added,
            pinned_assignments = summary.pinned_assignments,
            deduplicated = summary.deduplicated,
            warnings = summary.warnings,
            "覆盖处理完成"
        );
        summary
    }

    // ===== 步骤1: 移除/补入 =====

    fn apply_staff_changes(
        &self,
        state: &mut RosterState,
        overrides: &OverrideSpec,
        summary: &mut OverrideSummary,
    ) {
        for &staff_id in &overrides.staff_to_remove {
            if state.remove_staff(staff_id) {
                info!(staff_id, "覆盖配置: 移除人员");
                summary.removed += 1;
            } else {
                warn!(staff_id, "移除目标不在名册中, 跳过");
                summary.warnings += 1;
            }
        }

        for entry in &overrides.staff_to_add {
            if state.find_staff(entry.staff_id).is_some() {
                warn!(staff_id = entry.staff_id, "补入人员已在名册中, 跳过");
                summary.warnings += 1;
                continue;
            }
            // 缺省: 正式辅导员, A 模式, 无小组
            let member = StaffMember::new(
                entry.staff_id,
                entry.staff_name.clone(),
                entry.role.unwrap_or(Role::Senior),
                entry.group_id,
            );
            info!(staff_id = entry.staff_id, "覆盖配置: 补入人员");
            state.staff.push(member);
            summary.added += 1;
        }
    }

    // ===== 步骤2: 全员勤务日 =====

    /// 全员日分配与个人模式无关, 只锁分配不锁模式
    fn apply_all_staff_days(
        &self,
        state: &mut RosterState,
        catalog: &DutyCatalog,
        all_staff_days: &HashSet<Weekday>,
        summary: &mut OverrideSummary,
    ) {
        if all_staff_days.is_empty() {
            return;
        }
        let duty = match catalog.all_staff_duty() {
            Some(d) => d.clone(),
            None => {
                warn!("目录未定义全员勤务, 全员日覆盖跳过");
                summary.warnings += 1;
                return;
            }
        };

        let staff_ids: Vec<i64> = state.staff.iter().map(|s| s.staff_id).collect();
        for &day in all_staff_days {
            for &staff_id in &staff_ids {
                state.push_assignment(Assignment::new(
                    day,
                    staff_id,
                    duty.duty_id,
                    AssignmentKind::Pinned,
                ));
                summary.pinned_assignments += 1;
            }
            info!(day = %day, staff_count = staff_ids.len(), duty_id = duty.duty_id, "全员勤务日钉住完成");
        }
    }

    // ===== 步骤3: 配对勤务 =====

    fn apply_paired_duties(
        &self,
        state: &mut RosterState,
        overrides: &OverrideSpec,
        days: &[Weekday],
        all_staff_days: &HashSet<Weekday>,
        summary: &mut OverrideSummary,
    ) {
        for (&duty_id, staff_ids) in &overrides.paired_duties {
            let resolved: Vec<i64> = staff_ids
                .iter()
                .copied()
                .filter(|id| {
                    if state.find_staff(*id).is_some() {
                        true
                    } else {
                        warn!(duty_id, staff_id = id, "配对勤务引用缺失人员, 跳过该人");
                        summary.warnings += 1;
                        false
                    }
                })
                .collect();

            if resolved.is_empty() {
                continue;
            }

            // 前两名构成配对: 模式相同时整组翻转第二人, 强制 A/B 拆分
            if resolved.len() >= 2 {
                let p0 = state.find_staff(resolved[0]).map(|s| s.pattern);
                let p1 = state.find_staff(resolved[1]).map(|s| s.pattern);
                if p0 == p1 {
                    let second = resolved[1];
                    match state.find_staff(second).and_then(|s| s.group_id) {
                        Some(gid) => {
                            let flipped = state.flip_group(gid);
                            info!(
                                duty_id,
                                staff_id = second,
                                group_id = gid,
                                flipped,
                                "配对勤务模式冲突: 整组翻转第二人所在小组"
                            );
                        }
                        None => {
                            if let Some(s) = state.find_staff_mut(second) {
                                s.pattern = s.pattern.flip();
                            }
                            info!(duty_id, staff_id = second, "配对勤务模式冲突: 翻转无小组人员");
                        }
                    }
                }
            }

            // 按 (可能刚翻转过的) 模式逐日钉住, 跳过全员日
            for &staff_id in &resolved {
                let pattern = match state.find_staff(staff_id) {
                    Some(s) => s.pattern,
                    None => continue,
                };
                for &day in days {
                    if all_staff_days.contains(&day) || pattern_for_day(day) != pattern {
                        continue;
                    }
                    state.push_assignment(Assignment::new(
                        day,
                        staff_id,
                        duty_id,
                        AssignmentKind::Pinned,
                    ));
                    summary.pinned_assignments += 1;
                }
                state.mark_pinned(staff_id);
            }
            debug!(duty_id, staff_count = resolved.len(), "配对勤务钉住完成");
        }
    }

    // ===== 步骤4: 特殊勤务 =====

    fn apply_special_duty(
        &self,
        state: &mut RosterState,
        overrides: &OverrideSpec,
        catalog: &DutyCatalog,
        summary: &mut OverrideSummary,
    ) {
        let sd = match &overrides.special_duty {
            Some(sd) => sd,
            None => return,
        };
        let duty = match catalog.rotating_duty() {
            Some(d) => d.clone(),
            None => {
                warn!("目录未定义轮转特殊勤务, 覆盖跳过");
                summary.warnings += 1;
                return;
            }
        };

        let resolved: Vec<i64> = sd
            .staff
            .iter()
            .copied()
            .filter(|id| {
                if state.find_staff(*id).is_some() {
                    true
                } else {
                    warn!(duty_id = duty.duty_id, staff_id = id, "特殊勤务引用缺失人员, 跳过该人");
                    summary.warnings += 1;
                    false
                }
            })
            .collect();
        if resolved.is_empty() {
            warn!(duty_id = duty.duty_id, "特殊勤务无有效人员");
            summary.warnings += 1;
            return;
        }

        if sd.days.len() == 2 {
            self.assign_special_two_days(state, duty.duty_id, sd.days[0], sd.days[1], &resolved, summary);
        } else {
            // 非两日场景: 按模式匹配直接钉住, 人数不足仅告警
            for &day in &sd.days {
                let day_pattern = pattern_for_day(day);
                let mut count = 0;
                for &staff_id in &resolved {
                    if state.find_staff(staff_id).map(|s| s.pattern) == Some(day_pattern) {
                        state.push_assignment(Assignment::new(
                            day,
                            staff_id,
                            duty.duty_id,
                            AssignmentKind::Pinned,
                        ));
                        state.mark_pinned(staff_id);
                        summary.pinned_assignments += 1;
                        count += 1;
                    }
                }
                if count < MIN_SPECIAL_HEADCOUNT {
                    warn!(day = %day, count, "特殊勤务开展日人数低于最低要求");
                    summary.warnings += 1;
                }
            }
        }
    }

    /// 两开展日的特殊勤务: 最低人数保障与人数均衡
    ///
    /// - 一侧短缺且另一侧有富余: 调动富余人员 (整组翻转模式,
    ///   记 pattern_exception), 不足部分再由另一侧借调 (两天都上)
    /// - 双侧都达标但差距 > 1: 调动 ⌊diff/2⌋ 人, 捐出侧不得跌破最低
    /// - 仍短缺: 全体人员两天都上, 告警
    fn assign_special_two_days(
        &self,
        state: &mut RosterState,
        duty_id: i64,
        day1: Weekday,
        day2: Weekday,
        resolved: &[i64],
        summary: &mut OverrideSummary,
    ) {
        let p1 = pattern_for_day(day1);
        let p2 = pattern_for_day(day2);

        let mut bucket1: Vec<i64> = resolved
            .iter()
            .copied()
            .filter(|id| state.find_staff(*id).map(|s| s.pattern) == Some(p1))
            .collect();
        let mut bucket2: Vec<i64> = resolved
            .iter()
            .copied()
            .filter(|id| state.find_staff(*id).map(|s| s.pattern) == Some(p2))
            .collect();

        // 短缺侧优先: 从富余侧调动 (改变模式归属)
        let (short, large, short_day, large_day) = if bucket1.len() <= bucket2.len() {
            (&mut bucket1, &mut bucket2, day1, day2)
        } else {
            (&mut bucket2, &mut bucket1, day2, day1)
        };

        if short.len() < MIN_SPECIAL_HEADCOUNT {
            let deficit = MIN_SPECIAL_HEADCOUNT - short.len();
            let spare = large.len().saturating_sub(MIN_SPECIAL_HEADCOUNT);
            let movers = deficit.min(spare);
            for _ in 0..movers {
                if let Some(staff_id) = large.pop() {
                    self.move_special_staff(state, staff_id, duty_id, short_day);
                    short.push(staff_id);
                }
            }
            // 富余不足时借调: 借调人员两天都上, 模式不动
            let mut still_short = MIN_SPECIAL_HEADCOUNT.saturating_sub(short.len());
            if still_short > 0 {
                let borrowable: Vec<i64> = large
                    .iter()
                    .copied()
                    .filter(|id| !short.contains(id))
                    .collect();
                for staff_id in borrowable {
                    if still_short == 0 {
                        break;
                    }
                    info!(staff_id, day = %short_day, duty_id, "特殊勤务借调: 两个开展日均参加");
                    short.push(staff_id);
                    still_short -= 1;
                }
            }
            if short.len() < MIN_SPECIAL_HEADCOUNT {
                // 最后兜底: 全体人员两天都上
                warn!(
                    day = %short_day,
                    count = short.len(),
                    "特殊勤务人数无法达标, 全体人员两日均参加"
                );
                summary.warnings += 1;
                *short = resolved.to_vec();
                *large = resolved.to_vec();
            }
        } else {
            // 双侧达标, 差距过大时均衡
            let diff = large.len().saturating_sub(short.len());
            if diff > 1 {
                let movers = (diff / 2).min(large.len() - MIN_SPECIAL_HEADCOUNT);
                for _ in 0..movers {
                    if let Some(staff_id) = large.pop() {
                        self.move_special_staff(state, staff_id, duty_id, short_day);
                        short.push(staff_id);
                    }
                }
                info!(
                    from_day = %large_day,
                    to_day = %short_day,
                    moved = movers,
                    "特殊勤务人数均衡完成"
                );
            }
        }

        // 钉住最终名单
        for (&day, bucket) in [(&day1, &bucket1), (&day2, &bucket2)] {
            for &staff_id in bucket.iter() {
                state.push_assignment(Assignment::new(day, staff_id, duty_id, AssignmentKind::Pinned));
                state.mark_pinned(staff_id);
                summary.pinned_assignments += 1;
            }
        }
    }

    /// 调动特殊勤务人员到另一开展日: 翻转模式并记例外标记
    ///
    /// 所在小组无受保护成员时整组翻转 (维持组内覆盖),
    /// 否则仅翻转本人
    fn move_special_staff(&self, state: &mut RosterState, staff_id: i64, duty_id: i64, to_day: Weekday) {
        let group_id = state.find_staff(staff_id).and_then(|s| s.group_id);
        match group_id {
            Some(gid) if !state.group_has_protected_member(gid) => {
                let flipped = state.flip_group(gid);
                info!(staff_id, duty_id, to_day = %to_day, group_id = gid, flipped, "特殊勤务调动: 整组翻转");
            }
            _ => {
                if let Some(s) = state.find_staff_mut(staff_id) {
                    s.pattern = s.pattern.flip();
                }
                info!(staff_id, duty_id, to_day = %to_day, "特殊勤务调动: 仅翻转本人");
            }
        }
        if let Some(s) = state.find_staff_mut(staff_id) {
            s.pattern_exception = true;
        }
    }

    // ===== 步骤5: 自由钉住项 =====

    fn apply_freeform_pins(
        &self,
        state: &mut RosterState,
        overrides: &OverrideSpec,
        catalog: &DutyCatalog,
        days: &[Weekday],
        all_staff_days: &HashSet<Weekday>,
        summary: &mut OverrideSummary,
    ) {
        for pin in &overrides.freeform_pins {
            if catalog.get(pin.duty_id).is_none() {
                warn!(duty_id = pin.duty_id, "自由钉住项引用缺失勤务, 跳过");
                summary.warnings += 1;
                continue;
            }
            for &staff_id in &pin.staff_ids {
                let pattern = match state.find_staff(staff_id) {
                    Some(s) => s.pattern,
                    None => {
                        warn!(duty_id = pin.duty_id, staff_id, "自由钉住项引用缺失人员, 跳过该人");
                        summary.warnings += 1;
                        continue;
                    }
                };
                match &pin.days {
                    // 指定日钉住: 只锁分配, 不锁模式
                    Some(pin_days) => {
                        for &day in pin_days {
                            if !days.contains(&day) {
                                warn!(duty_id = pin.duty_id, staff_id, day = %day, "钉住日不在开展日集合内, 跳过");
                                summary.warnings += 1;
                                continue;
                            }
                            state.push_assignment(Assignment::new(
                                day,
                                staff_id,
                                pin.duty_id,
                                AssignmentKind::PinnedLocked,
                            ));
                            summary.pinned_assignments += 1;
                        }
                    }
                    // 全匹配日钉住: 按本人模式展开, 并锁定模式
                    None => {
                        for &day in days {
                            if all_staff_days.contains(&day) || pattern_for_day(day) != pattern {
                                continue;
                            }
                            state.push_assignment(Assignment::new(
                                day,
                                staff_id,
                                pin.duty_id,
                                AssignmentKind::PinnedLocked,
                            ));
                            summary.pinned_assignments += 1;
                        }
                        state.mark_pinned(staff_id);
                    }
                }
            }
        }
    }

    // ===== 步骤6: 去重 =====

    /// (day, staff) 去重, 保留首条
    ///
    /// 例外: 后到的角色配比勤务记录受保护, 反向替换已保留记录
    fn deduplicate(&self, state: &mut RosterState, catalog: &DutyCatalog, summary: &mut OverrideSummary) {
        let role_mix_id = catalog.role_mix_duty().map(|d| d.duty_id);
        let assignments = std::mem::take(&mut state.assignments);
        let mut seen: HashMap<(u32, i64), usize> = HashMap::new();
        let mut result: Vec<Assignment> = Vec::with_capacity(assignments.len());

        for a in assignments {
            let key = (day_sort_key(a.day), a.staff_id);
            match seen.get(&key) {
                None => {
                    seen.insert(key, result.len());
                    result.push(a);
                }
                Some(&idx) => {
                    let incoming_protected = role_mix_id.is_some() && a.duty_id == role_mix_id;
                    let kept_protected =
                        role_mix_id.is_some() && result[idx].duty_id == role_mix_id;
                    if incoming_protected && !kept_protected {
                        warn!(
                            day = %a.day,
                            staff_id = a.staff_id,
                            dropped_duty = ?result[idx].duty_id,
                            "重复分配: 角色配比勤务受保护, 替换已保留记录"
                        );
                        result[idx] = a;
                    } else {
                        warn!(
                            day = %a.day,
                            staff_id = a.staff_id,
                            dropped_duty = ?a.duty_id,
                            "重复分配: 保留首条, 丢弃后续"
                        );
                    }
                    summary.deduplicated += 1;
                }
            }
        }
        state.assignments = result;
    }
}

impl Default for OverrideProcessor {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
