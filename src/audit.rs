//! Audit d'un planning produit : règles dures, couverture, équité.
//!
//! Indépendant de la génération ; utilisable sur n'importe quel planning. Les
//! écarts sont retournés comme données, c'est à l'appelant de décider s'ils
//! bloquent la suite.

use crate::model::{
    EmployeeId, MonthlySchedule, PeriodCounters, ScheduleRow, Team, TeamRoster, DAY_LABELS,
    SATURDAY, SUNDAY, WEEKDAYS, WORK_DAYS_PER_WEEK,
};
use crate::scheduler::EngineOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Quota,
    ConsecutiveRest,
    WeekendOverlap,
    Coverage,
    Fairness,
    /// Informatif uniquement.
    RestBalance,
}

impl ViolationKind {
    pub fn is_blocking(self) -> bool {
        !matches!(self, ViolationKind::RestBalance)
    }

    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::Quota => "quota",
            ViolationKind::ConsecutiveRest => "consecutive_rest",
            ViolationKind::WeekendOverlap => "weekend_overlap",
            ViolationKind::Coverage => "coverage",
            ViolationKind::Fairness => "fairness",
            ViolationKind::RestBalance => "rest_balance",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub week: Option<u32>,
    pub team: Option<String>,
    pub employee: Option<EmployeeId>,
    pub detail: String,
}

impl Violation {
    fn row(kind: ViolationKind, row: &ScheduleRow, detail: String) -> Self {
        Self {
            kind,
            week: Some(row.week),
            team: Some(row.team.clone()),
            employee: Some(row.employee.clone()),
            detail,
        }
    }

    fn team(kind: ViolationKind, week: Option<u32>, team: &Team, detail: String) -> Self {
        Self {
            kind,
            week,
            team: Some(team.name.clone()),
            employee: None,
            detail,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Aucun écart bloquant (les avertissements d'équilibre sont tolérés).
    pub fn is_clean(&self) -> bool {
        self.violations.iter().all(|v| !v.kind.is_blocking())
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn blocking(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind.is_blocking())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.kind.is_blocking())
    }
}

/// Audite `schedule` ; si `counters` est fourni, l'équité porte sur les cumuls.
pub fn audit_schedule(
    schedule: &MonthlySchedule,
    teams: &TeamRoster,
    opts: &EngineOptions,
    counters: Option<&PeriodCounters>,
) -> AuditReport {
    let mut out = Vec::new();
    check_rows(schedule, &mut out);
    check_coverage(schedule, teams, opts, &mut out);
    check_fairness(schedule, teams, opts, counters, &mut out);
    check_rest_balance(schedule, teams, opts, &mut out);
    AuditReport { violations: out }
}

fn check_rows(schedule: &MonthlySchedule, out: &mut Vec<Violation>) {
    for row in &schedule.rows {
        let work = row.work_days();
        if work != WORK_DAYS_PER_WEEK {
            out.push(Violation::row(
                ViolationKind::Quota,
                row,
                format!("{work} work days instead of {WORK_DAYS_PER_WEEK}"),
            ));
        }
        if let Some(i) = row.pattern.first_adjacent_weekday_rest() {
            out.push(Violation::row(
                ViolationKind::ConsecutiveRest,
                row,
                format!("rest on {} and {}", DAY_LABELS[i], DAY_LABELS[i + 1]),
            ));
        }
        if row.pattern.works_saturday() && row.pattern.works_sunday() {
            out.push(Violation::row(
                ViolationKind::WeekendOverlap,
                row,
                "works both saturday and sunday".to_string(),
            ));
        }
    }
}

fn check_coverage(
    schedule: &MonthlySchedule,
    teams: &TeamRoster,
    opts: &EngineOptions,
    out: &mut Vec<Violation>,
) {
    for week in schedule.weeks() {
        let excluded = teams.sunday_excluded_index(week);
        for (idx, team) in teams.teams.iter().enumerate() {
            let rows: Vec<&ScheduleRow> = schedule
                .rows_for_week(week)
                .filter(|r| r.team == team.name)
                .collect();
            let saturdays = rows.iter().filter(|r| r.pattern.get(SATURDAY).is_work()).count();
            let sundays = rows.iter().filter(|r| r.pattern.get(SUNDAY).is_work()).count();
            let sunday_target = if excluded == Some(idx) {
                0
            } else {
                opts.sunday_headcount
            };
            if saturdays != opts.saturday_headcount {
                out.push(Violation::team(
                    ViolationKind::Coverage,
                    Some(week),
                    team,
                    format!("{saturdays} saturday workers (target {})", opts.saturday_headcount),
                ));
            }
            if sundays != sunday_target {
                out.push(Violation::team(
                    ViolationKind::Coverage,
                    Some(week),
                    team,
                    format!("{sundays} sunday workers (target {sunday_target})"),
                ));
            }
        }
    }
}

fn check_fairness(
    schedule: &MonthlySchedule,
    teams: &TeamRoster,
    opts: &EngineOptions,
    counters: Option<&PeriodCounters>,
    out: &mut Vec<Violation>,
) {
    let observed = schedule.weekend_totals();
    for team in &teams.teams {
        let per_member: Vec<(u32, u32)> = team
            .members
            .iter()
            .map(|m| {
                let c = match counters {
                    Some(c) => c.get(m),
                    None => observed.get(m).copied().unwrap_or_default(),
                };
                (c.sundays, c.saturdays)
            })
            .collect();

        let sundays = spread(per_member.iter().map(|p| p.0));
        if sundays > opts.sunday_tolerance {
            out.push(Violation::team(
                ViolationKind::Fairness,
                None,
                team,
                format!("sunday spread {sundays} exceeds {}", opts.sunday_tolerance),
            ));
        }
        let saturdays = spread(per_member.iter().map(|p| p.1));
        if saturdays > opts.saturday_tolerance {
            out.push(Violation::team(
                ViolationKind::Fairness,
                None,
                team,
                format!("saturday spread {saturdays} exceeds {}", opts.saturday_tolerance),
            ));
        }
    }
}

fn check_rest_balance(
    schedule: &MonthlySchedule,
    teams: &TeamRoster,
    opts: &EngineOptions,
    out: &mut Vec<Violation>,
) {
    let weeks = schedule.weeks().len();
    for team in &teams.teams {
        let expected =
            (team.len() * opts.rest_days_per_week as usize * weeks) as f64 / WEEKDAYS as f64;
        for (day, label) in DAY_LABELS.iter().enumerate().take(WEEKDAYS) {
            let observed = schedule
                .rows_for_team(&team.name)
                .filter(|r| r.pattern.get(day).is_rest())
                .count() as f64;
            if (observed - expected).abs() > expected * opts.rest_balance_tolerance {
                out.push(Violation::team(
                    ViolationKind::RestBalance,
                    None,
                    team,
                    format!("{observed} rests on {label}, expected ~{expected:.1}"),
                ));
            }
        }
    }
}

fn spread<I: Iterator<Item = u32>>(values: I) -> u32 {
    let (min, max) = values.fold((u32::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
    max.saturating_sub(min)
}
