use super::{util, EngineOptions, SchedError, Scheduler};
use crate::model::{
    EmployeeCounters, EmployeeId, MonthlySchedule, Period, PeriodCounters, TeamRoster,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Résultat d'une période : planning, totaux de la période, compteurs cumulés à persister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOutcome {
    pub schedule: MonthlySchedule,
    pub period_totals: PeriodCounters,
    pub counters: PeriodCounters,
}

/// Exécution complète : configuration, réconciliation, génération.
pub fn run_period(
    teams: TeamRoster,
    period: Period,
    previous: Option<&PeriodCounters>,
    options: EngineOptions,
) -> Result<PeriodOutcome, SchedError> {
    util::validate_period(&period)?;
    let mut scheduler = Scheduler::from_counters(teams, previous, options)?;
    scheduler.generate_period(period)
}

pub(super) fn reconcile(scheduler: &mut Scheduler, counters: &PeriodCounters) {
    for state in scheduler.states.iter_mut() {
        state.sunday.reconcile(counters);
        state.saturday.reconcile(counters);
    }
    scheduler.baseline = counters.clone();
    tracing::info!(
        employees = counters.len(),
        teams = scheduler.teams.teams.len(),
        "rotation rebuilt from previous counters"
    );
}

pub(super) fn generate_period(
    scheduler: &mut Scheduler,
    period: Period,
) -> Result<PeriodOutcome, SchedError> {
    util::validate_period(&period)?;

    let mut schedule = MonthlySchedule::new(period);
    let mut totals: BTreeMap<EmployeeId, EmployeeCounters> = scheduler
        .teams
        .employees()
        .map(|(_, e)| (e.clone(), EmployeeCounters::default()))
        .collect();

    for week in 1..=period.weeks {
        let rows = scheduler.generate_week(week)?;
        for row in &rows {
            let entry = totals.entry(row.employee.clone()).or_default();
            if row.pattern.works_saturday() {
                entry.saturdays += 1;
                entry.weekend_total += 1;
            }
            if row.pattern.works_sunday() {
                entry.sundays += 1;
                entry.weekend_total += 1;
            }
        }
        schedule.rows.extend(rows);
    }

    let counters = carry_forward(scheduler, &totals);
    scheduler.baseline = counters.clone();
    tracing::info!(period = %period.key(), weeks = period.weeks, rows = schedule.rows.len(), "period generated");

    Ok(PeriodOutcome {
        schedule,
        period_totals: PeriodCounters { entries: totals },
        counters,
    })
}

/// Cumul précédent + période courante ; tours repris des files de l'équipe.
/// Les employés absents du roster conservent leurs compteurs tels quels.
fn carry_forward(
    scheduler: &Scheduler,
    totals: &BTreeMap<EmployeeId, EmployeeCounters>,
) -> PeriodCounters {
    let mut out = scheduler.baseline.clone();
    for (idx, team) in scheduler.teams.teams.iter().enumerate() {
        let state = &scheduler.states[idx];
        for member in &team.members {
            let prev = scheduler.baseline.get(member);
            let cur = totals.get(member).copied().unwrap_or_default();
            out.insert(
                member.clone(),
                EmployeeCounters {
                    saturdays: prev.saturdays + cur.saturdays,
                    sundays: prev.sundays + cur.sundays,
                    weekend_total: prev.weekend_total + cur.weekend_total,
                    sunday_round: state.sunday.round(),
                    saturday_round: state.saturday.round(),
                },
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DutyKind, Team};

    fn roster() -> TeamRoster {
        TeamRoster::new(vec![
            Team::new("A", ["a1", "a2", "a3", "a4"]),
            Team::new("B", ["b1", "b2", "b3"]),
        ])
    }

    #[test]
    fn counters_accumulate_over_previous() {
        let mut prev = PeriodCounters::new();
        prev.insert(
            EmployeeId::new("a1"),
            EmployeeCounters {
                saturdays: 4,
                sundays: 2,
                weekend_total: 6,
                ..Default::default()
            },
        );
        prev.insert(
            EmployeeId::new("gone"),
            EmployeeCounters {
                saturdays: 1,
                ..Default::default()
            },
        );
        let out = run_period(
            roster(),
            Period::monthly(2025, 3),
            Some(&prev),
            EngineOptions::default().with_seed(3),
        )
        .unwrap();

        let a1 = out.counters.get(&EmployeeId::new("a1"));
        let a1_month = out.period_totals.get(&EmployeeId::new("a1"));
        assert_eq!(a1.saturdays, 4 + a1_month.saturdays);
        assert_eq!(a1.sundays, 2 + a1_month.sundays);
        assert_eq!(a1.weekend_total, a1.saturdays + a1.sundays);
        // absent du roster : reporté sans changement
        assert_eq!(out.counters.get(&EmployeeId::new("gone")).saturdays, 1);
        assert_eq!(out.schedule.rows.len(), 7 * 4);
    }

    #[test]
    fn rounds_are_carried_from_rotation_state() {
        let mut s = Scheduler::new(roster(), EngineOptions::default().with_seed(5)).unwrap();
        let out = s.generate_period(Period::monthly(2025, 1)).unwrap();
        for member in ["b1", "b2", "b3"] {
            let c = out.counters.get(&EmployeeId::new(member));
            assert_eq!(c.saturday_round, s.rotation("B", DutyKind::Saturday).unwrap().round());
            assert_eq!(c.sunday_round, s.rotation("B", DutyKind::Sunday).unwrap().round());
        }
        assert_eq!(s.baseline(), &out.counters);
    }

    #[test]
    fn invalid_week_count_fails_before_scheduling() {
        let err = run_period(roster(), Period::new(2025, 1, 0), None, EngineOptions::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
