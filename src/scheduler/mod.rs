mod monthly;
mod pattern;
mod rest;
mod rotation;
mod types;
mod util;
mod weekly;

pub use monthly::{run_period, PeriodOutcome};
pub use pattern::{build_week_pattern, repair_adjacent_rest, WeekendFlags};
pub use rest::RestDayState;
pub use rotation::RotationQueue;
pub use types::{EngineOptions, RepairMode, SchedError};

use crate::audit::{self, AuditReport};
use crate::model::{
    DutyKind, EmployeeId, MonthlySchedule, Period, PeriodCounters, ScheduleRow, Team, TeamRoster,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// État de rotation d'une équipe pour une exécution.
#[derive(Debug, Clone)]
pub(crate) struct TeamState {
    pub(crate) sunday: RotationQueue,
    pub(crate) saturday: RotationQueue,
    pub(crate) rest: HashMap<EmployeeId, RestDayState>,
}

impl TeamState {
    fn new(team: &Team, history_len: usize) -> Result<Self, SchedError> {
        Ok(Self {
            sunday: RotationQueue::new(DutyKind::Sunday, team)?,
            saturday: RotationQueue::new(DutyKind::Saturday, team)?,
            rest: team
                .members
                .iter()
                .map(|m| (m.clone(), RestDayState::new(history_len)))
                .collect(),
        })
    }

    pub(crate) fn queue(&self, kind: DutyKind) -> &RotationQueue {
        match kind {
            DutyKind::Sunday => &self.sunday,
            DutyKind::Saturday => &self.saturday,
        }
    }
}

/// Scheduler : contexte d'une exécution, propriétaire de tout l'état mutable
/// (files de rotation, repos, générateur aléatoire).
///
/// Rien ne survit entre deux exécutions hormis les `PeriodCounters` retournés.
#[derive(Debug)]
pub struct Scheduler {
    teams: TeamRoster,
    options: EngineOptions,
    states: Vec<TeamState>,
    baseline: PeriodCounters,
    rng: StdRng,
}

impl Scheduler {
    /// Valide la configuration et initialise un état vierge (compteurs à zéro).
    pub fn new(teams: TeamRoster, options: EngineOptions) -> Result<Self, SchedError> {
        util::validate_roster(&teams)?;
        options.validate()?;
        util::validate_headcounts(&teams, &options)?;
        let states = teams
            .teams
            .iter()
            .map(|t| TeamState::new(t, options.rest_history_len))
            .collect::<Result<Vec<_>, _>>()?;
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let baseline = PeriodCounters::zeroed(&teams);
        Ok(Self {
            teams,
            options,
            states,
            baseline,
            rng,
        })
    }

    /// Comme `new`, puis réconcilie avec les compteurs de la période précédente.
    pub fn from_counters(
        teams: TeamRoster,
        previous: Option<&PeriodCounters>,
        options: EngineOptions,
    ) -> Result<Self, SchedError> {
        let mut scheduler = Self::new(teams, options)?;
        if let Some(counters) = previous {
            scheduler.reconcile(counters);
        }
        Ok(scheduler)
    }

    pub fn teams(&self) -> &TeamRoster {
        &self.teams
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compteurs cumulés servant de base à la prochaine période.
    pub fn baseline(&self) -> &PeriodCounters {
        &self.baseline
    }

    pub fn rotation(&self, team: &str, kind: DutyKind) -> Option<&RotationQueue> {
        let idx = self.teams.position(team)?;
        Some(self.states[idx].queue(kind))
    }

    pub fn rest_state(&self, employee: &EmployeeId) -> Option<&RestDayState> {
        self.states.iter().find_map(|s| s.rest.get(employee))
    }

    /// Pré-remplit la file de jours de repos souhaités d'un employé.
    pub fn seed_rest_preferences<I>(&mut self, employee: &EmployeeId, days: I) -> Result<(), SchedError>
    where
        I: IntoIterator<Item = usize>,
    {
        let state = self
            .states
            .iter_mut()
            .find_map(|s| s.rest.get_mut(employee))
            .ok_or_else(|| SchedError::UnknownEmployee(employee.as_str().to_string()))?;
        state.extend_preferred(days);
        Ok(())
    }

    pub fn reconcile(&mut self, counters: &PeriodCounters) {
        monthly::reconcile(self, counters)
    }

    pub fn generate_week(&mut self, week: u32) -> Result<Vec<ScheduleRow>, SchedError> {
        weekly::generate_week(self, week)
    }

    pub fn generate_period(&mut self, period: Period) -> Result<PeriodOutcome, SchedError> {
        monthly::generate_period(self, period)
    }

    /// Audite un planning avec les options de ce scheduler.
    pub fn audit(&self, schedule: &MonthlySchedule, counters: Option<&PeriodCounters>) -> AuditReport {
        audit::audit_schedule(schedule, &self.teams, &self.options, counters)
    }
}
