use crate::model::WEEKDAYS;
use std::collections::VecDeque;

/// État de rotation des repos en semaine pour un employé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestDayState {
    counts: [u32; WEEKDAYS],
    history: VecDeque<usize>,
    history_len: usize,
    preferred: VecDeque<usize>,
}

impl RestDayState {
    pub fn new(history_len: usize) -> Self {
        Self {
            counts: [0; WEEKDAYS],
            history: VecDeque::with_capacity(history_len + 1),
            history_len,
            preferred: VecDeque::new(),
        }
    }

    /// Pré-remplit la file des jours de repos souhaités (indices 0..5).
    pub fn with_preferred<I: IntoIterator<Item = usize>>(mut self, days: I) -> Self {
        self.extend_preferred(days);
        self
    }

    pub fn extend_preferred<I: IntoIterator<Item = usize>>(&mut self, days: I) {
        self.preferred
            .extend(days.into_iter().filter(|&d| d < WEEKDAYS));
    }

    pub fn counts(&self) -> &[u32; WEEKDAYS] {
        &self.counts
    }

    pub fn count(&self, weekday: usize) -> u32 {
        self.counts.get(weekday).copied().unwrap_or(0)
    }

    pub fn history(&self) -> impl Iterator<Item = usize> + '_ {
        self.history.iter().copied()
    }

    pub fn preferred(&self) -> impl Iterator<Item = usize> + '_ {
        self.preferred.iter().copied()
    }

    /// Choisit le jour de repos parmi `available` (indices lundi..vendredi).
    ///
    /// Démarrage à froid : premier jour disponible, file préférée ignorée.
    /// Sinon le jour le moins utilisé, sauf si la tête de la file préférée
    /// est disponible.
    pub fn pick(&mut self, available: &[usize]) -> Option<usize> {
        let mut sorted: Vec<usize> = available.iter().copied().filter(|&d| d < WEEKDAYS).collect();
        sorted.sort_unstable();
        sorted.dedup();

        if self.history.is_empty() {
            let first = *sorted.first()?;
            self.record(first);
            return Some(first);
        }

        let mut choice = sorted
            .iter()
            .copied()
            .min_by_key(|&d| (self.counts[d], d))?;

        if let Some(&head) = self.preferred.front() {
            if sorted.contains(&head) {
                choice = head;
                self.preferred.pop_front();
            }
        }

        self.record(choice);
        Some(choice)
    }

    /// Reporte un échange repos/travail fait après coup (`from` -> `to`).
    pub fn transfer(&mut self, from: usize, to: usize) {
        if from < WEEKDAYS {
            self.counts[from] = self.counts[from].saturating_sub(1);
            if let Some(pos) = self.history.iter().position(|&d| d == from) {
                self.history.remove(pos);
            }
        }
        if to < WEEKDAYS {
            self.record(to);
        }
    }

    fn record(&mut self, weekday: usize) {
        self.counts[weekday] += 1;
        self.history.push_back(weekday);
        while self.history.len() > self.history_len {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_takes_first_available() {
        let mut s = RestDayState::new(10);
        assert_eq!(s.pick(&[3, 1, 4]), Some(1));
        assert_eq!(s.count(1), 1);
        assert_eq!(s.history().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn balances_toward_least_used_weekday() {
        let mut s = RestDayState::new(10);
        let all = [0, 1, 2, 3, 4];
        let picks: Vec<_> = (0..5).map(|_| s.pick(&all).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 4]);
        assert_eq!(s.counts(), &[1, 1, 1, 1, 1]);
        assert_eq!(s.pick(&[2, 4]), Some(2));
    }

    #[test]
    fn preferred_head_overrides_count() {
        let mut s = RestDayState::new(10).with_preferred([3]);
        // 3 indisponible : la file n'est pas consommée
        assert_eq!(s.pick(&[0, 1]), Some(0));
        assert_eq!(s.preferred().collect::<Vec<_>>(), vec![3]);
        // 1 a moins de repos, mais la préférence prime
        assert_eq!(s.pick(&[0, 1, 2, 3, 4]), Some(3));
        assert_eq!(s.preferred().count(), 0);
        assert_eq!(s.pick(&[1, 2]), Some(1));
    }

    #[test]
    fn cold_start_ignores_preferred_queue() {
        let mut s = RestDayState::new(10).with_preferred([2]);
        assert_eq!(s.pick(&[0, 1, 2, 3, 4]), Some(0));
        assert_eq!(s.preferred().collect::<Vec<_>>(), vec![2]);
        assert_eq!(s.pick(&[0, 1, 2, 3, 4]), Some(2));
        assert_eq!(s.preferred().count(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let mut s = RestDayState::new(3);
        for _ in 0..6 {
            s.pick(&[0, 1, 2, 3, 4]);
        }
        assert_eq!(s.history().count(), 3);
        assert_eq!(s.counts().iter().sum::<u32>(), 6);
    }

    #[test]
    fn transfer_moves_count_and_history() {
        let mut s = RestDayState::new(10);
        s.pick(&[0, 1]);
        s.transfer(0, 3);
        assert_eq!(s.count(0), 0);
        assert_eq!(s.count(3), 1);
        assert_eq!(s.history().collect::<Vec<_>>(), vec![3]);
        s.transfer(2, 4);
        assert_eq!(s.count(2), 0);
    }

    #[test]
    fn nothing_available_yields_none() {
        let mut s = RestDayState::new(10);
        assert_eq!(s.pick(&[]), None);
        assert_eq!(s.pick(&[5, 6]), None);
    }
}
