#![forbid(unsafe_code)]
use tempfile::tempdir;
use weekend_rota::{
    io, run_period, EmployeeCounters, EmployeeId, EngineOptions, HistoryStore, JsonHistoryStore,
    Period, PeriodCounters, PeriodKey, PeriodRecord, Team, TeamRoster,
};

fn teams() -> TeamRoster {
    TeamRoster::new(vec![
        Team::new("north", ["ana", "ben", "cleo", "dan"]),
        Team::new("south", ["eva", "finn", "gus"]),
    ])
}

#[test]
fn two_months_chain_through_the_store() {
    let dir = tempdir().unwrap();
    let store = JsonHistoryStore::new(dir.path());
    let opts = EngineOptions::default().with_seed(19);

    let jan = run_period(teams(), Period::monthly(2025, 1), None, opts.clone()).unwrap();
    store.save(&PeriodRecord::from_outcome(jan.clone())).unwrap();

    let previous = store.previous_counters(PeriodKey::new(2025, 2)).unwrap();
    assert_eq!(previous.as_ref(), Some(&jan.counters));

    let feb = run_period(teams(), Period::monthly(2025, 2), previous.as_ref(), opts).unwrap();
    store.save(&PeriodRecord::from_outcome(feb.clone())).unwrap();

    for (emp, c) in feb.counters.iter() {
        let before = jan.counters.get(emp);
        let month = feb.period_totals.get(emp);
        assert_eq!(c.saturdays, before.saturdays + month.saturdays);
        assert_eq!(c.sundays, before.sundays + month.sundays);
    }

    let listed: Vec<_> = store.list().unwrap().into_iter().map(|i| i.period).collect();
    assert_eq!(listed, vec![PeriodKey::new(2025, 1), PeriodKey::new(2025, 2)]);

    let schedules: Vec<_> = listed
        .iter()
        .map(|k| store.load(*k).unwrap().unwrap().schedule)
        .collect();
    let annual = weekend_rota::annual_report(2025, &schedules);
    assert_eq!(annual.months.len(), 2);
    assert_eq!(annual.employees.len(), 7);
    assert_eq!(annual.total_work_days, 7 * 8 * 5);
}

#[test]
fn counters_csv_layout() {
    let mut counters = PeriodCounters::new();
    counters.insert(
        EmployeeId::new("ben"),
        EmployeeCounters {
            saturdays: 0,
            sundays: 1,
            weekend_total: 1,
            sunday_round: 1,
            saturday_round: 0,
        },
    );
    counters.insert(
        EmployeeId::new("ana"),
        EmployeeCounters {
            saturdays: 2,
            sundays: 0,
            weekend_total: 2,
            sunday_round: 1,
            saturday_round: 1,
        },
    );
    let csv = io::counters_to_csv_string(&counters).unwrap();
    insta::assert_snapshot!(csv, @r"
    employee,saturdays,sundays,weekend_total,sunday_round,saturday_round
    ana,2,0,2,1,1
    ben,0,1,1,1,0
    ");
}

#[test]
fn exported_counters_seed_the_next_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("counters.csv");
    let jan = run_period(
        teams(),
        Period::monthly(2025, 1),
        None,
        EngineOptions::default().with_seed(3),
    )
    .unwrap();
    io::export_counters_csv(&path, &jan.counters).unwrap();
    let loaded = io::import_counters_csv(&path).unwrap();
    assert_eq!(loaded, jan.counters);
}
