use crate::model::{EmployeeId, MonthlySchedule, TeamRoster, WEEKDAYS};
use crate::scheduler::EngineOptions;
use serde::Serialize;
use std::collections::BTreeMap;

/// Couverture d'une semaine, toutes équipes confondues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    pub week: u32,
    pub employees: usize,
    pub work_days: usize,
    pub saturday_workers: usize,
    pub sunday_workers: usize,
    pub saturday_target: usize,
    pub sunday_target: usize,
}

impl WeekSummary {
    pub fn is_covered(&self) -> bool {
        self.saturday_workers == self.saturday_target && self.sunday_workers == self.sunday_target
    }
}

/// Samedis / dimanches fournis par une équipe pour une semaine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamWeekSummary {
    pub team: String,
    pub week: u32,
    pub employees: usize,
    pub saturday_workers: usize,
    pub sunday_workers: usize,
}

/// Répartition des repos d'une équipe sur un jour de semaine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestDayStat {
    pub team: String,
    pub weekday: usize,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

impl RestDayStat {
    pub fn spread(&self) -> u32 {
        self.max - self.min
    }

    pub fn is_balanced(&self) -> bool {
        self.spread() <= 2
    }
}

pub fn weekly_summary(
    schedule: &MonthlySchedule,
    teams: &TeamRoster,
    opts: &EngineOptions,
) -> Vec<WeekSummary> {
    let team_count = teams.teams.len();
    schedule
        .weeks()
        .into_iter()
        .map(|week| {
            let rows: Vec<_> = schedule.rows_for_week(week).collect();
            WeekSummary {
                week,
                employees: rows.len(),
                work_days: rows.iter().map(|r| r.work_days()).sum(),
                saturday_workers: rows.iter().filter(|r| r.pattern.works_saturday()).count(),
                sunday_workers: rows.iter().filter(|r| r.pattern.works_sunday()).count(),
                saturday_target: opts.saturday_headcount.saturating_mul(team_count),
                sunday_target: opts.sunday_headcount.saturating_mul(team_count.saturating_sub(1)),
            }
        })
        .collect()
}

pub fn team_summary(schedule: &MonthlySchedule, teams: &TeamRoster) -> Vec<TeamWeekSummary> {
    let mut out = Vec::new();
    for team in &teams.teams {
        for week in schedule.weeks() {
            let rows: Vec<_> = schedule
                .rows_for_week(week)
                .filter(|r| r.team == team.name)
                .collect();
            out.push(TeamWeekSummary {
                team: team.name.clone(),
                week,
                employees: rows.len(),
                saturday_workers: rows.iter().filter(|r| r.pattern.works_saturday()).count(),
                sunday_workers: rows.iter().filter(|r| r.pattern.works_sunday()).count(),
            });
        }
    }
    out
}

/// Statistiques de repos en semaine par équipe, calculées sur le planning.
pub fn rest_day_stats(schedule: &MonthlySchedule, teams: &TeamRoster) -> Vec<RestDayStat> {
    let mut out = Vec::new();
    for team in &teams.teams {
        if team.is_empty() {
            continue;
        }
        let per_member: Vec<[u32; WEEKDAYS]> = team
            .members
            .iter()
            .map(|m| {
                let mut counts = [0u32; WEEKDAYS];
                for row in schedule.rows_for_employee(m) {
                    for (d, slot) in counts.iter_mut().enumerate() {
                        if row.pattern.get(d).is_rest() {
                            *slot += 1;
                        }
                    }
                }
                counts
            })
            .collect();

        for weekday in 0..WEEKDAYS {
            let values: Vec<u32> = per_member.iter().map(|c| c[weekday]).collect();
            let total: u32 = values.iter().sum();
            out.push(RestDayStat {
                team: team.name.clone(),
                weekday,
                mean: f64::from(total) / values.len() as f64,
                min: values.iter().copied().min().unwrap_or(0),
                max: values.iter().copied().max().unwrap_or(0),
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeYearStats {
    pub employee: EmployeeId,
    pub team: String,
    pub work_days: usize,
    pub saturdays: u32,
    pub sundays: u32,
}

impl EmployeeYearStats {
    pub fn weekend_total(&self) -> u32 {
        self.saturdays + self.sundays
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthStats {
    pub month: u32,
    pub employees: usize,
    pub work_days: usize,
    pub saturdays: usize,
    pub sundays: usize,
}

/// Consolidation annuelle de plusieurs plannings mensuels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnualReport {
    pub year: i32,
    pub employees: Vec<EmployeeYearStats>,
    pub months: Vec<MonthStats>,
    pub total_work_days: usize,
    pub avg_work_days_per_employee_month: f64,
    pub without_sunday: usize,
    pub with_one_sunday: usize,
    pub with_two_plus_sundays: usize,
    pub sunday_spread: u32,
    pub saturday_spread: u32,
}

/// Les plannings d'une autre année sont ignorés.
pub fn annual_report(year: i32, schedules: &[MonthlySchedule]) -> AnnualReport {
    let mut per_employee: BTreeMap<EmployeeId, EmployeeYearStats> = BTreeMap::new();
    let mut months: BTreeMap<u32, MonthStats> = BTreeMap::new();

    for schedule in schedules.iter().filter(|s| s.period.year == year) {
        let month = months.entry(schedule.period.month).or_insert_with(|| MonthStats {
            month: schedule.period.month,
            ..Default::default()
        });
        let mut seen: Vec<&EmployeeId> = Vec::new();
        for row in &schedule.rows {
            let stats = per_employee
                .entry(row.employee.clone())
                .or_insert_with(|| EmployeeYearStats {
                    employee: row.employee.clone(),
                    team: row.team.clone(),
                    work_days: 0,
                    saturdays: 0,
                    sundays: 0,
                });
            stats.work_days += row.work_days();
            month.work_days += row.work_days();
            if row.pattern.works_saturday() {
                stats.saturdays += 1;
                month.saturdays += 1;
            }
            if row.pattern.works_sunday() {
                stats.sundays += 1;
                month.sundays += 1;
            }
            if !seen.contains(&&row.employee) {
                seen.push(&row.employee);
            }
        }
        month.employees = month.employees.max(seen.len());
    }

    let employees: Vec<EmployeeYearStats> = per_employee.into_values().collect();
    let months: Vec<MonthStats> = months.into_values().collect();
    let total_work_days: usize = employees.iter().map(|e| e.work_days).sum();
    let denom = employees.len() * months.len();
    let spread = |f: fn(&EmployeeYearStats) -> u32| -> u32 {
        let max = employees.iter().map(f).max().unwrap_or(0);
        let min = employees.iter().map(f).min().unwrap_or(0);
        max - min
    };

    AnnualReport {
        year,
        total_work_days,
        avg_work_days_per_employee_month: if denom == 0 {
            0.0
        } else {
            total_work_days as f64 / denom as f64
        },
        without_sunday: employees.iter().filter(|e| e.sundays == 0).count(),
        with_one_sunday: employees.iter().filter(|e| e.sundays == 1).count(),
        with_two_plus_sundays: employees.iter().filter(|e| e.sundays >= 2).count(),
        sunday_spread: spread(|e| e.sundays),
        saturday_spread: spread(|e| e.saturdays),
        employees,
        months,
    }
}
