use super::rest::RestDayState;
use super::types::RepairMode;
use crate::model::{Day, WeekPattern, SATURDAY, SUNDAY, WEEKDAYS, WORK_DAYS_PER_WEEK};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Affectation de week-end décidée par les files de rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekendFlags {
    pub saturday: bool,
    pub sunday: bool,
}

impl WeekendFlags {
    pub fn new(saturday: bool, sunday: bool) -> Self {
        // dimanche prioritaire
        Self {
            saturday: saturday && !sunday,
            sunday,
        }
    }

    fn intended(&self, idx: usize) -> bool {
        match idx {
            SATURDAY => self.saturday,
            SUNDAY => self.sunday,
            _ => false,
        }
    }
}

/// Construit la semaine 5x2 d'un employé.
///
/// Garantit 5 jours travaillés et jamais samedi + dimanche ensemble. Les repos
/// adjacents en semaine sont corrigés selon `mode`.
pub fn build_week_pattern<R: Rng + ?Sized>(
    flags: WeekendFlags,
    rest: &mut RestDayState,
    mode: RepairMode,
    rng: &mut R,
) -> WeekPattern {
    let flags = WeekendFlags::new(flags.saturday, flags.sunday);

    let mut pattern = WeekPattern::all(Day::Work);
    if !flags.saturday {
        pattern.set(SATURDAY, Day::Rest);
    }
    if !flags.sunday {
        pattern.set(SUNDAY, Day::Rest);
    }

    let work = pattern.work_count();
    if work > WORK_DAYS_PER_WEEK {
        let mut candidates: Vec<usize> = (0..WEEKDAYS).filter(|&d| pattern.get(d).is_work()).collect();
        for _ in 0..work - WORK_DAYS_PER_WEEK {
            let Some(day) = rest.pick(&candidates) else {
                break;
            };
            pattern.set(day, Day::Rest);
            candidates.retain(|&d| d != day);
        }
    } else if work < WORK_DAYS_PER_WEEK {
        fill_work_days(&mut pattern, flags, WORK_DAYS_PER_WEEK - work, rng);
    }

    repair_adjacent_rest(&mut pattern, rest, mode);
    enforce_quota(&mut pattern, flags, rest, rng);

    if pattern.works_saturday() && pattern.works_sunday() {
        pattern.set(SATURDAY, Day::Rest);
        if let Some(d) = (0..WEEKDAYS).find(|&d| pattern.get(d).is_rest()) {
            pattern.set(d, Day::Work);
        }
    }

    pattern
}

/// Convertit `deficit` jours de repos en travail, semaine d'abord, tirage uniforme.
fn fill_work_days<R: Rng + ?Sized>(
    pattern: &mut WeekPattern,
    flags: WeekendFlags,
    deficit: usize,
    rng: &mut R,
) {
    let weekday_rest: Vec<usize> = (0..WEEKDAYS).filter(|&d| pattern.get(d).is_rest()).collect();
    // un repos de week-end fixé par l'affectation n'est jamais repris
    let weekend_rest: Vec<usize> = [SATURDAY, SUNDAY]
        .into_iter()
        .filter(|&d| pattern.get(d).is_rest() && flags.intended(d))
        .collect();

    let chosen: Vec<usize> = if weekday_rest.len() >= deficit {
        weekday_rest.choose_multiple(rng, deficit).copied().collect()
    } else {
        let remaining = deficit - weekday_rest.len();
        let mut all = weekday_rest.clone();
        if weekend_rest.len() >= remaining {
            all.extend(weekend_rest.choose_multiple(rng, remaining).copied());
        }
        all
    };

    for d in chosen {
        pattern.set(d, Day::Work);
    }
}

/// Corrige les repos adjacents du lundi au vendredi.
///
/// `SinglePass` ne traite que la première paire trouvée, même si l'échange
/// en crée une autre. Retourne le nombre d'échanges effectués.
pub fn repair_adjacent_rest(
    pattern: &mut WeekPattern,
    rest: &mut RestDayState,
    mode: RepairMode,
) -> usize {
    let max_passes = match mode {
        RepairMode::SinglePass => 1,
        RepairMode::UntilClean => WEEKDAYS,
    };

    let mut swaps = 0;
    for _ in 0..max_passes {
        let Some(i) = pattern.first_adjacent_weekday_rest() else {
            break;
        };
        let Some(j) = (0..WEEKDAYS).find(|&j| j.abs_diff(i) > 1 && pattern.get(j).is_work()) else {
            break;
        };
        pattern.set(i, Day::Work);
        pattern.set(j, Day::Rest);
        rest.transfer(i, j);
        swaps += 1;
    }
    swaps
}

fn enforce_quota<R: Rng + ?Sized>(
    pattern: &mut WeekPattern,
    flags: WeekendFlags,
    rest: &RestDayState,
    rng: &mut R,
) {
    while pattern.work_count() > WORK_DAYS_PER_WEEK {
        let extra_weekend = [SATURDAY, SUNDAY]
            .into_iter()
            .find(|&d| pattern.get(d).is_work() && !flags.intended(d));
        if let Some(d) = extra_weekend {
            pattern.set(d, Day::Rest);
            continue;
        }

        // le jour déjà le plus reposé coûte le moins à libérer
        let mut best: Option<usize> = None;
        for d in (0..WEEKDAYS).filter(|&d| pattern.get(d).is_work()) {
            if best.map_or(true, |b| rest.count(d) > rest.count(b)) {
                best = Some(d);
            }
        }
        let target = match best {
            Some(d) => d,
            None => {
                let work: Vec<usize> = (0..7).filter(|&d| pattern.get(d).is_work()).collect();
                match work.choose(rng) {
                    Some(&d) => d,
                    None => break,
                }
            }
        };
        pattern.set(target, Day::Rest);
    }

    while pattern.work_count() < WORK_DAYS_PER_WEEK {
        let target = (0..WEEKDAYS)
            .filter(|&d| pattern.get(d).is_rest())
            .min_by_key(|&d| rest.count(d));
        let target = match target {
            Some(d) => d,
            None => {
                let resting: Vec<usize> = (0..7).filter(|&d| pattern.get(d).is_rest()).collect();
                match resting.choose(rng) {
                    Some(&d) => d,
                    None => break,
                }
            }
        };
        pattern.set(target, Day::Work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn check(p: &WeekPattern) {
        assert_eq!(p.work_count(), 5, "{p}");
        assert!(!(p.works_saturday() && p.works_sunday()), "{p}");
        assert!(p.first_adjacent_weekday_rest().is_none(), "{p}");
    }

    #[test]
    fn no_weekend_duty_rests_on_weekend() {
        let mut rest = RestDayState::new(10);
        let p = build_week_pattern(WeekendFlags::default(), &mut rest, RepairMode::SinglePass, &mut rng());
        assert_eq!(p.to_string(), "WWWWWRR");
        assert_eq!(rest.history().count(), 0);
    }

    #[test]
    fn saturday_worker_gets_one_weekday_rest() {
        let mut rest = RestDayState::new(10);
        let p = build_week_pattern(WeekendFlags::new(true, false), &mut rest, RepairMode::SinglePass, &mut rng());
        check(&p);
        assert!(p.works_saturday());
        assert_eq!(p.to_string(), "RWWWWWR");
        let p2 = build_week_pattern(WeekendFlags::new(true, false), &mut rest, RepairMode::SinglePass, &mut rng());
        assert_eq!(p2.to_string(), "WRWWWWR");
    }

    #[test]
    fn sunday_wins_over_saturday() {
        let mut rest = RestDayState::new(10);
        let p = build_week_pattern(WeekendFlags { saturday: true, sunday: true }, &mut rest, RepairMode::SinglePass, &mut rng());
        check(&p);
        assert!(p.works_sunday());
        assert!(!p.works_saturday());
    }

    #[test]
    fn many_weeks_stay_valid_and_spread_rest() {
        let mut rest = RestDayState::new(10);
        let mut r = rng();
        for week in 0..20 {
            let flags = WeekendFlags::new(week % 2 == 0, week % 3 == 0);
            let p = build_week_pattern(flags, &mut rest, RepairMode::SinglePass, &mut r);
            check(&p);
        }
        let counts = rest.counts();
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= 1, "{counts:?}");
    }

    #[test]
    fn single_pass_repairs_only_first_pair() {
        // deux paires : lun-mar et jeu-ven
        let mut p = WeekPattern::parse("RRWRRWW").unwrap();
        let mut rest = RestDayState::new(10);
        let swaps = repair_adjacent_rest(&mut p, &mut rest, RepairMode::SinglePass);
        assert_eq!(swaps, 1);
        assert!(p.get(0).is_work());
        assert!(p.get(2).is_rest());
        // limite connue : des repos adjacents subsistent
        assert!(p.first_adjacent_weekday_rest().is_some());
        assert_eq!(rest.count(2), 1);
    }

    #[test]
    fn until_clean_removes_every_pair_when_possible() {
        let mut p = WeekPattern::parse("RRWWWWW").unwrap();
        let mut rest = RestDayState::new(10);
        let swaps = repair_adjacent_rest(&mut p, &mut rest, RepairMode::UntilClean);
        assert!(swaps >= 1);
        assert!(p.first_adjacent_weekday_rest().is_none(), "{p}");
        assert_eq!(p.work_count(), 5);
    }

    #[test]
    fn quota_loops_fix_overfull_and_underfull_weeks() {
        let rest = RestDayState::new(10);
        let flags = WeekendFlags::new(false, true);

        let mut over = WeekPattern::parse("WWWWWWW").unwrap();
        enforce_quota(&mut over, flags, &rest, &mut rng());
        assert_eq!(over.work_count(), 5);
        assert!(over.works_sunday());
        assert!(!over.works_saturday());

        let mut under = WeekPattern::parse("RRRWWRW").unwrap();
        enforce_quota(&mut under, flags, &rest, &mut rng());
        assert_eq!(under.work_count(), 5);
    }

    #[test]
    fn deficit_fill_prefers_weekdays() {
        let mut p = WeekPattern::parse("RRWWWRR").unwrap();
        fill_work_days(&mut p, WeekendFlags::default(), 2, &mut rng());
        assert_eq!(p.work_count(), 5);
        assert!(!p.works_saturday() && !p.works_sunday());
    }
}
