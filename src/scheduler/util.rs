use super::{EngineOptions, SchedError};
use crate::model::{EmployeeId, Period, TeamRoster};
use std::collections::HashMap;

/// Rejette un roster vide, une équipe vide ou un employé présent dans deux équipes.
pub(crate) fn validate_roster(teams: &TeamRoster) -> Result<(), SchedError> {
    if teams.teams.is_empty() {
        return Err(SchedError::NoTeams);
    }
    let mut seen: HashMap<&EmployeeId, &str> = HashMap::new();
    for team in &teams.teams {
        if team.is_empty() {
            return Err(SchedError::EmptyTeam(team.name.clone()));
        }
        for member in &team.members {
            if let Some(first) = seen.insert(member, team.name.as_str()) {
                return Err(SchedError::DuplicateEmployee {
                    employee: member.as_str().to_string(),
                    first: first.to_string(),
                    second: team.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Les effectifs du week-end doivent pouvoir être fournis par au moins une équipe.
pub(crate) fn validate_headcounts(teams: &TeamRoster, opts: &EngineOptions) -> Result<(), SchedError> {
    let largest = teams.teams.iter().map(|t| t.len()).max().unwrap_or(0);
    let needed = opts
        .saturday_headcount
        .checked_add(opts.sunday_headcount)
        .unwrap_or(usize::MAX);
    if needed > largest {
        return Err(SchedError::InvalidOptions(format!(
            "weekend headcount {} saturday + {} sunday exceeds the largest team ({largest})",
            opts.saturday_headcount, opts.sunday_headcount
        )));
    }
    Ok(())
}

pub(crate) fn validate_period(period: &Period) -> Result<(), SchedError> {
    if period.weeks == 0 {
        return Err(SchedError::InvalidWeekCount(period.weeks));
    }
    if !period.key().is_valid() {
        return Err(SchedError::InvalidPeriod {
            year: period.year,
            month: period.month,
        });
    }
    Ok(())
}
