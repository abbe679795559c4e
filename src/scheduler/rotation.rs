use super::types::SchedError;
use crate::model::{DutyKind, EmployeeId, PeriodCounters, Team};
use std::collections::{HashMap, VecDeque};

/// File de rotation d'une équipe pour un type d'astreinte.
///
/// Personne ne reprend l'astreinte avant que tous les membres l'aient eue :
/// le tirage se fait toujours parmi les membres au compteur minimal, départagés
/// par l'ordre de la file. L'élu repart en queue de file.
#[derive(Debug, Clone)]
pub struct RotationQueue {
    team: String,
    kind: DutyKind,
    members: Vec<EmployeeId>,
    queue: VecDeque<EmployeeId>,
    counts: HashMap<EmployeeId, u32>,
    round: u32,
    last_assigned: Option<EmployeeId>,
}

impl RotationQueue {
    pub fn new(kind: DutyKind, team: &Team) -> Result<Self, SchedError> {
        if team.is_empty() {
            return Err(SchedError::EmptyTeam(team.name.clone()));
        }
        Ok(Self {
            team: team.name.clone(),
            kind,
            members: team.members.clone(),
            queue: team.members.iter().cloned().collect(),
            counts: team.members.iter().map(|m| (m.clone(), 0)).collect(),
            round: 0,
            last_assigned: None,
        })
    }

    /// Reconstruit l'ordre et les compteurs depuis les compteurs cumulés :
    /// tri stable croissant, tour = minimum de l'équipe.
    pub fn reconcile(&mut self, counters: &PeriodCounters) {
        let kind = self.kind;
        let mut ordered = self.members.clone();
        ordered.sort_by_key(|m| counters.get(m).duty(kind));
        self.queue = ordered.into_iter().collect();
        for m in &self.members {
            self.counts.insert(m.clone(), counters.get(m).duty(kind));
        }
        self.round = self.min_count();
        self.last_assigned = None;
    }

    /// Prochain membre, sans restriction.
    pub fn next(&mut self) -> Option<EmployeeId> {
        self.next_eligible(|_| true)
    }

    /// Prochain membre parmi ceux acceptés par `eligible`.
    ///
    /// `None` uniquement si aucun membre n'est éligible.
    pub fn next_eligible<F>(&mut self, eligible: F) -> Option<EmployeeId>
    where
        F: Fn(&EmployeeId) -> bool,
    {
        let min = self
            .members
            .iter()
            .filter(|m| eligible(*m))
            .map(|m| self.count(m))
            .min()?;
        let is_candidate = |m: &EmployeeId| eligible(m) && self.count(m) == min;

        let chosen = self
            .queue
            .iter()
            .find(|m| is_candidate(*m))
            .or_else(|| self.members.iter().find(|m| is_candidate(*m)))
            .cloned()?;

        let prior_min = self.min_count();
        self.queue.retain(|m| m != &chosen);
        self.queue.push_back(chosen.clone());
        *self.counts.entry(chosen.clone()).or_insert(0) += 1;
        self.last_assigned = Some(chosen.clone());

        if self.min_count() > prior_min {
            self.round += 1;
            tracing::info!(team = %self.team, duty = %self.kind, round = self.round, "rotation round completed");
        }
        tracing::debug!(team = %self.team, duty = %self.kind, employee = %chosen, "rotation draw");
        Some(chosen)
    }

    pub fn kind(&self) -> DutyKind {
        self.kind
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn count(&self, employee: &EmployeeId) -> u32 {
        self.counts.get(employee).copied().unwrap_or(0)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn last_assigned(&self) -> Option<&EmployeeId> {
        self.last_assigned.as_ref()
    }

    pub fn queue(&self) -> impl Iterator<Item = &EmployeeId> {
        self.queue.iter()
    }

    pub fn members(&self) -> &[EmployeeId] {
        &self.members
    }

    /// Écart max - min des compteurs de l'équipe.
    pub fn spread(&self) -> u32 {
        let max = self.counts.values().copied().max().unwrap_or(0);
        max - self.min_count()
    }

    fn min_count(&self) -> u32 {
        self.counts.values().copied().min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeCounters;
    use std::collections::HashSet;

    fn team(n: usize) -> Team {
        Team::new("T", (0..n).map(|i| format!("E{i}")))
    }

    #[test]
    fn empty_team_is_rejected() {
        let err = RotationQueue::new(DutyKind::Sunday, &Team::new("X", Vec::<String>::new()))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn everybody_goes_once_before_any_repeat() {
        let mut q = RotationQueue::new(DutyKind::Sunday, &team(5)).unwrap();
        let first_cycle: Vec<_> = (0..5).map(|_| q.next().unwrap()).collect();
        let distinct: HashSet<_> = first_cycle.iter().collect();
        assert_eq!(distinct.len(), 5);
        assert_eq!(first_cycle[0].as_str(), "E0");
        assert_eq!(first_cycle[4].as_str(), "E4");
    }

    #[test]
    fn round_counter_after_full_cycle() {
        let mut q = RotationQueue::new(DutyKind::Saturday, &team(4)).unwrap();
        for _ in 0..3 {
            q.next();
        }
        assert_eq!(q.round(), 0);
        q.next();
        assert_eq!(q.round(), 1);
        assert!(q.members().iter().all(|m| q.count(m) == 1));
        assert_eq!(q.last_assigned().map(|e| e.as_str()), Some("E3"));
    }

    #[test]
    fn draws_after_first_round_come_from_minimum() {
        let mut q = RotationQueue::new(DutyKind::Sunday, &team(3)).unwrap();
        for _ in 0..10 {
            let min = q.members().iter().map(|m| q.count(m)).min().unwrap();
            let picked = q.next().unwrap();
            assert_eq!(q.count(&picked), min + 1);
            assert!(q.spread() <= 1);
        }
    }

    #[test]
    fn reconcile_orders_by_counters_and_sets_round() {
        let t = team(3);
        let mut counters = PeriodCounters::new();
        for (name, sundays) in [("E0", 3), ("E1", 1), ("E2", 1)] {
            counters.insert(
                EmployeeId::new(name),
                EmployeeCounters {
                    sundays,
                    ..Default::default()
                },
            );
        }
        let mut q = RotationQueue::new(DutyKind::Sunday, &t).unwrap();
        q.reconcile(&counters);
        let order: Vec<_> = q.queue().map(|e| e.as_str().to_string()).collect();
        assert_eq!(order, vec!["E1", "E2", "E0"]);
        assert_eq!(q.round(), 1);
        assert_eq!(q.next().unwrap().as_str(), "E1");
        assert_eq!(q.next().unwrap().as_str(), "E2");
        assert_eq!(q.round(), 2);
        // E0 à 3, les autres à 2 : E1 revient avant E0
        assert_eq!(q.next().unwrap().as_str(), "E1");
    }

    #[test]
    fn round_follows_team_minimum_after_uneven_reconcile() {
        let mut counters = PeriodCounters::new();
        for (name, saturdays) in [("E0", 1), ("E1", 2), ("E2", 3)] {
            counters.insert(
                EmployeeId::new(name),
                EmployeeCounters {
                    saturdays,
                    ..Default::default()
                },
            );
        }
        let mut q = RotationQueue::new(DutyKind::Saturday, &team(3)).unwrap();
        q.reconcile(&counters);
        assert_eq!(q.round(), 1);
        // 1,2,3 -> 2,2,3 : le minimum monte, le tour aussi, même sans égalité
        assert_eq!(q.next().unwrap().as_str(), "E0");
        assert_eq!(q.round(), 2);
        assert_eq!(q.spread(), 1);
    }

    #[test]
    fn eligibility_filter_skips_excluded_member() {
        let mut q = RotationQueue::new(DutyKind::Saturday, &team(3)).unwrap();
        let excluded = EmployeeId::new("E0");
        let picked = q.next_eligible(|e| e != &excluded).unwrap();
        assert_eq!(picked.as_str(), "E1");
        assert_eq!(q.count(&excluded), 0);
        assert!(q.next_eligible(|_| false).is_none());
    }
}
