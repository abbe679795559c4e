use crate::model::{
    EmployeeCounters, EmployeeId, MonthlySchedule, PeriodCounters, Team, TeamRoster, DAY_LABELS,
};
use crate::report::AnnualReport;
use crate::scheduler::EngineOptions;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import des équipes depuis CSV : header `team,employee`, une ligne par membre.
///
/// L'ordre des équipes suit leur première apparition dans le fichier.
pub fn import_teams_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<TeamRoster> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut teams: Vec<Team> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let team = rec.get(0).context("missing team")?.trim();
        let employee = rec.get(1).context("missing employee")?.trim();
        if team.is_empty() || employee.is_empty() {
            bail!("invalid team row (empty)");
        }
        let id = EmployeeId::new(employee);
        match teams.iter_mut().find(|t| t.name == team) {
            Some(t) => t.members.push(id),
            None => teams.push(Team {
                name: team.to_string(),
                members: vec![id],
            }),
        }
    }
    Ok(TeamRoster::new(teams))
}

/// Import des compteurs : header
/// `employee,saturdays,sundays,weekend_total,sunday_round,saturday_round`.
/// Les colonnes de tours sont optionnelles.
pub fn import_counters_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<PeriodCounters> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = PeriodCounters::new();
    for rec in rdr.records() {
        let rec = rec?;
        let employee = rec.get(0).context("missing employee")?.trim();
        if employee.is_empty() {
            bail!("invalid counters row (empty employee)");
        }
        let field = |idx: usize, name: &str| -> anyhow::Result<u32> {
            match rec.get(idx).map(str::trim) {
                None | Some("") => Ok(0),
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid {name} for employee {employee}")),
            }
        };
        let saturdays = field(1, "saturdays")?;
        let sundays = field(2, "sundays")?;
        let weekend_total = match rec.get(3).map(str::trim) {
            None | Some("") => saturdays + sundays,
            Some(_) => field(3, "weekend_total")?,
        };
        out.insert(
            EmployeeId::new(employee),
            EmployeeCounters {
                saturdays,
                sundays,
                weekend_total,
                sunday_round: field(4, "sunday_round")?,
                saturday_round: field(5, "saturday_round")?,
            },
        );
    }
    Ok(out)
}

/// Export CSV des compteurs, triés par employé.
pub fn export_counters_csv<P: AsRef<Path>>(path: P, counters: &PeriodCounters) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    write_counters(&mut w, counters)?;
    w.flush()?;
    Ok(())
}

/// Même format que [`export_counters_csv`], en mémoire.
pub fn counters_to_csv_string(counters: &PeriodCounters) -> anyhow::Result<String> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    write_counters(&mut w, counters)?;
    let bytes = w.into_inner().context("flushing counters csv")?;
    Ok(String::from_utf8(bytes)?)
}

fn write_counters<W: std::io::Write>(
    w: &mut csv::Writer<W>,
    counters: &PeriodCounters,
) -> anyhow::Result<()> {
    w.write_record([
        "employee",
        "saturdays",
        "sundays",
        "weekend_total",
        "sunday_round",
        "saturday_round",
    ])?;
    for (employee, c) in counters.iter() {
        let mut sat = itoa::Buffer::new();
        let mut sun = itoa::Buffer::new();
        let mut total = itoa::Buffer::new();
        let mut sun_round = itoa::Buffer::new();
        let mut sat_round = itoa::Buffer::new();
        w.write_record([
            employee.as_str(),
            sat.format(c.saturdays),
            sun.format(c.sundays),
            total.format(c.weekend_total),
            sun_round.format(c.sunday_round),
            sat_round.format(c.saturday_round),
        ])?;
    }
    Ok(())
}

/// Export CSV du planning : header
/// `period,week,team,employee,Mon..Sun,work_days,rest_days`.
pub fn export_schedule_csv<P: AsRef<Path>>(path: P, schedule: &MonthlySchedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut header = vec!["period", "week", "team", "employee"];
    header.extend(DAY_LABELS);
    header.extend(["work_days", "rest_days"]);
    w.write_record(&header)?;
    let period = schedule.period.key().to_string();
    for row in &schedule.rows {
        let mut week = itoa::Buffer::new();
        let mut work = itoa::Buffer::new();
        let mut rest = itoa::Buffer::new();
        let mut rec: Vec<String> = vec![
            period.clone(),
            week.format(row.week).to_string(),
            row.team.clone(),
            row.employee.to_string(),
        ];
        rec.extend(row.pattern.days().iter().map(|d| d.code().to_string()));
        rec.push(work.format(row.work_days()).to_string());
        rec.push(rest.format(row.rest_days()).to_string());
        w.write_record(&rec)?;
    }
    w.flush()?;
    Ok(())
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_schedule_json<P: AsRef<Path>>(path: P, schedule: &MonthlySchedule) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(schedule)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des statistiques annuelles par employé.
pub fn export_annual_csv<P: AsRef<Path>>(path: P, report: &AnnualReport) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "employee",
        "team",
        "work_days",
        "saturdays",
        "sundays",
        "weekend_total",
    ])?;
    for e in &report.employees {
        let mut work = itoa::Buffer::new();
        let mut sat = itoa::Buffer::new();
        let mut sun = itoa::Buffer::new();
        let mut total = itoa::Buffer::new();
        w.write_record([
            e.employee.as_str(),
            e.team.as_str(),
            work.format(e.work_days),
            sat.format(e.saturdays),
            sun.format(e.sundays),
            total.format(e.weekend_total()),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Options moteur depuis un fichier JSON ; les champs absents gardent leur défaut.
pub fn load_options<P: AsRef<Path>>(path: P) -> anyhow::Result<EngineOptions> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let opts: EngineOptions = serde_json::from_slice(&data)
        .with_context(|| format!("parsing options {}", path.display()))?;
    opts.validate()?;
    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn teams_keep_first_appearance_order() {
        let f = temp_file("team,employee\nB,b1\nA,a1\nB, b2 \n");
        let roster = import_teams_csv(f.path()).unwrap();
        assert_eq!(roster.teams.len(), 2);
        assert_eq!(roster.teams[0].name, "B");
        assert_eq!(roster.teams[0].members, vec![EmployeeId::new("b1"), EmployeeId::new("b2")]);
        assert_eq!(roster.teams[1].name, "A");
    }

    #[test]
    fn empty_team_cell_is_rejected() {
        let f = temp_file("team,employee\n,b1\n");
        assert!(import_teams_csv(f.path()).is_err());
    }

    #[test]
    fn counters_import_defaults_missing_columns() {
        let f = temp_file("employee,saturdays,sundays\nx,3,1\n");
        let counters = import_counters_csv(f.path()).unwrap();
        let x = counters.get(&EmployeeId::new("x"));
        assert_eq!(x.weekend_total, 4);
        assert_eq!(x.sunday_round, 0);

        let bad = temp_file("employee,saturdays\nx,many\n");
        let err = import_counters_csv(bad.path()).unwrap_err();
        assert!(format!("{err:#}").contains("saturdays"));
    }

    #[test]
    fn counters_survive_a_file_round_trip() {
        let mut counters = PeriodCounters::new();
        counters.insert(
            EmployeeId::new("x"),
            EmployeeCounters {
                saturdays: 2,
                sundays: 1,
                weekend_total: 3,
                sunday_round: 1,
                saturday_round: 1,
            },
        );
        let out = NamedTempFile::new().unwrap();
        export_counters_csv(out.path(), &counters).unwrap();
        assert_eq!(import_counters_csv(out.path()).unwrap(), counters);
    }

    #[test]
    fn options_file_may_be_partial() {
        let f = temp_file(r#"{ "saturday_headcount": 3, "seed": 9 }"#);
        let opts = load_options(f.path()).unwrap();
        assert_eq!(opts.saturday_headcount, 3);
        assert_eq!(opts.seed, Some(9));
        assert_eq!(opts.sunday_headcount, 1);

        let bad = temp_file(r#"{ "rest_history_len": 0 }"#);
        assert!(load_options(bad.path()).is_err());
    }
}
