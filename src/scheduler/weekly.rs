use super::pattern::{build_week_pattern, WeekendFlags};
use super::{RestDayState, RotationQueue, SchedError, Scheduler};
use crate::model::{DutyKind, EmployeeId, ScheduleRow};

/// Construit une semaine (1-based) pour toutes les équipes, dans l'ordre du roster.
///
/// Une équipe par semaine, en rotation, ne fournit personne le dimanche.
pub(super) fn generate_week(
    scheduler: &mut Scheduler,
    week: u32,
) -> Result<Vec<ScheduleRow>, SchedError> {
    if week == 0 {
        return Err(SchedError::InvalidWeekCount(week));
    }

    let excluded = scheduler.teams.sunday_excluded_index(week);
    let sunday_headcount = scheduler.options.sunday_headcount;
    let saturday_headcount = scheduler.options.saturday_headcount;
    let history_len = scheduler.options.rest_history_len;
    let mode = scheduler.options.adjacent_rest_repair;

    let mut rows = Vec::new();
    for (idx, team) in scheduler.teams.teams.iter().enumerate() {
        let state = &mut scheduler.states[idx];

        let mut sunday = Vec::new();
        if excluded != Some(idx) {
            for _ in 0..sunday_headcount {
                let pick = draw(&mut state.sunday, &sunday, &[])?;
                sunday.push(pick);
            }
        }

        let mut saturday = Vec::new();
        for _ in 0..saturday_headcount {
            let pick = draw(&mut state.saturday, &sunday, &saturday)?;
            saturday.push(pick);
        }

        tracing::debug!(
            week,
            team = %team.name,
            sunday = ?sunday.iter().map(EmployeeId::as_str).collect::<Vec<_>>(),
            saturday = ?saturday.iter().map(EmployeeId::as_str).collect::<Vec<_>>(),
            "weekend duty assigned"
        );

        for member in &team.members {
            let flags = WeekendFlags::new(saturday.contains(member), sunday.contains(member));
            let rest = state
                .rest
                .entry(member.clone())
                .or_insert_with(|| RestDayState::new(history_len));
            let pattern = build_week_pattern(flags, rest, mode, &mut scheduler.rng);
            rows.push(ScheduleRow {
                week,
                team: team.name.clone(),
                employee: member.clone(),
                pattern,
            });
        }
    }

    tracing::info!(week, rows = rows.len(), "week generated");
    Ok(rows)
}

/// Tirage borné : exclut les membres déjà retenus cette semaine au lieu de
/// retirer jusqu'à obtenir quelqu'un d'autre.
fn draw(
    queue: &mut RotationQueue,
    taken: &[EmployeeId],
    also_taken: &[EmployeeId],
) -> Result<EmployeeId, SchedError> {
    let kind = queue.kind();
    let team = queue.team().to_string();
    queue
        .next_eligible(|e| !taken.contains(e) && !also_taken.contains(e))
        .ok_or_else(|| SchedError::Unsatisfiable {
            team,
            duty: kind,
            reason: match kind {
                DutyKind::Sunday => "not enough members for the sunday headcount".to_string(),
                DutyKind::Saturday => {
                    "not enough members distinct from the week's other weekend workers".to_string()
                }
            },
        })
}

#[cfg(test)]
mod tests {
    use super::super::EngineOptions;
    use super::*;
    use crate::model::{Team, TeamRoster};

    fn scheduler(sizes: &[usize]) -> Scheduler {
        let teams = sizes
            .iter()
            .enumerate()
            .map(|(t, &n)| Team::new(format!("T{t}"), (0..n).map(|i| format!("T{t}-E{i}"))))
            .collect();
        Scheduler::new(TeamRoster::new(teams), EngineOptions::default().with_seed(1)).unwrap()
    }

    #[test]
    fn excluded_team_rotates_by_week() {
        let mut s = scheduler(&[3, 3, 3]);
        for week in 1..=6 {
            let rows = s.generate_week(week).unwrap();
            let excluded = ((week - 1) % 3) as usize;
            for (idx, team) in ["T0", "T1", "T2"].iter().enumerate() {
                let sundays = rows
                    .iter()
                    .filter(|r| &r.team == team && r.pattern.works_sunday())
                    .count();
                let saturdays = rows
                    .iter()
                    .filter(|r| &r.team == team && r.pattern.works_saturday())
                    .count();
                assert_eq!(sundays, usize::from(idx != excluded), "week {week} {team}");
                assert_eq!(saturdays, 2, "week {week} {team}");
            }
        }
    }

    #[test]
    fn single_member_team_is_unsatisfiable_not_endless() {
        // semaine 2 : T1 exclue du dimanche, T0 doit fournir dimanche + samedi
        let mut s = scheduler(&[1, 3]);
        let err = s.generate_week(2).unwrap_err();
        assert!(err.is_unsatisfiable(), "{err}");
    }

    #[test]
    fn week_zero_is_rejected() {
        let mut s = scheduler(&[3]);
        assert!(s.generate_week(0).unwrap_err().is_configuration());
    }
}
