#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};
use weekend_rota::{
    audit_schedule, io,
    model::{PeriodKey, DAY_LABELS},
    report, run_period,
    storage::{HistoryStore, JsonHistoryStore, PeriodRecord},
    AuditReport, EngineOptions, Period, RepairMode,
};

/// CLI de planification des week-ends (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Répertoire de l'historique des périodes
    #[arg(long, global = true, default_value = "rota_history")]
    history: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning d'un mois
    Generate {
        /// CSV `team,employee`
        #[arg(long)]
        teams: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long, default_value_t = Period::DEFAULT_WEEKS)]
        weeks: u32,
        #[arg(long)]
        seed: Option<u64>,
        /// Options moteur (JSON)
        #[arg(long)]
        config: Option<String>,
        /// Compteurs précédents (CSV) au lieu de l'historique
        #[arg(long)]
        counters: Option<String>,
        /// Répète la correction des repos adjacents jusqu'à disparition
        #[arg(long)]
        strict_rest: bool,
        #[arg(long)]
        out_csv: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Auditer une période enregistrée
    Audit {
        #[arg(long)]
        teams: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        config: Option<String>,
        /// Export CSV des écarts (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Lister les périodes enregistrées
    List,

    /// Exporter les compteurs cumulés d'une période
    Counters {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        out: Option<String>,
    },

    /// Rapport annuel
    Annual {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn load_engine_options(config: Option<&str>) -> Result<EngineOptions> {
    match config {
        Some(path) => io::load_options(path),
        None => Ok(EngineOptions::default()),
    }
}

fn print_violations(audit: &AuditReport) {
    for v in &audit.violations {
        let week = v.week.map(|w| format!("w{w}")).unwrap_or_else(|| "-".to_string());
        let who = v
            .employee
            .as_ref()
            .map(|e| e.as_str())
            .or(v.team.as_deref())
            .unwrap_or("-");
        let level = if v.kind.is_blocking() { "ERROR" } else { "WARN" };
        eprintln!("{level} [{}] {week} {who}: {}", v.kind, v.detail);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let store = JsonHistoryStore::new(&cli.history);

    let code = match cli.cmd {
        Commands::Generate {
            teams,
            year,
            month,
            weeks,
            seed,
            config,
            counters,
            strict_rest,
            out_csv,
            out_json,
        } => {
            let roster = io::import_teams_csv(&teams)?;
            let mut opts = load_engine_options(config.as_deref())?;
            if seed.is_some() {
                opts.seed = seed;
            }
            if strict_rest {
                opts.adjacent_rest_repair = RepairMode::UntilClean;
            }
            let period = Period::new(year, month, weeks);
            let previous = match counters {
                Some(path) => Some(io::import_counters_csv(path)?),
                None => store.previous_counters(period.key())?,
            };
            if previous.is_none() {
                println!("No previous counters for {}: starting from zero", period.key().previous());
            }

            let outcome = run_period(roster.clone(), period, previous.as_ref(), opts.clone())?;
            let audit = audit_schedule(&outcome.schedule, &roster, &opts, Some(&outcome.counters));

            for w in report::weekly_summary(&outcome.schedule, &roster, &opts) {
                println!(
                    "week {} | {} employees | {} work days | sat {}/{} | sun {}/{}",
                    w.week,
                    w.employees,
                    w.work_days,
                    w.saturday_workers,
                    w.saturday_target,
                    w.sunday_workers,
                    w.sunday_target
                );
            }
            if let Some(path) = out_csv {
                io::export_schedule_csv(path, &outcome.schedule)?;
            }
            if let Some(path) = out_json {
                io::export_schedule_json(path, &outcome.schedule)?;
            }
            let record = PeriodRecord::from_outcome(outcome);
            let path = store.save(&record)?;
            println!("Saved {} (run {})", path.display(), record.run_id);

            if audit.is_clean() {
                println!("OK: schedule passes audit");
                0
            } else {
                tracing::warn!(period = %record.period, violations = audit.violations.len(), "audit reported violations");
                print_violations(&audit);
                eprintln!("Found {} blocking violation(s)", audit.blocking().count());
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Audit {
            teams,
            year,
            month,
            config,
            report: report_csv,
        } => {
            let roster = io::import_teams_csv(&teams)?;
            let opts = load_engine_options(config.as_deref())?;
            let key = PeriodKey::new(year, month);
            let record = store
                .load(key)?
                .with_context(|| format!("no record for period {key}"))?;
            let audit = audit_schedule(&record.schedule, &roster, &opts, Some(&record.counters));
            print_violations(&audit);
            if let Some(path) = report_csv {
                // CSV simple
                let mut w = csv::Writer::from_path(path)?;
                w.write_record(["kind", "week", "team", "employee", "detail"])?;
                for v in &audit.violations {
                    let week = v.week.map(|w| w.to_string()).unwrap_or_default();
                    w.write_record([
                        v.kind.code(),
                        week.as_str(),
                        v.team.as_deref().unwrap_or(""),
                        v.employee.as_ref().map(|e| e.as_str()).unwrap_or(""),
                        v.detail.as_str(),
                    ])?;
                }
                w.flush()?;
            }
            for stat in report::rest_day_stats(&record.schedule, &roster) {
                if !stat.is_balanced() {
                    println!(
                        "{} {}: rest spread {} (min {}, max {}, mean {:.1})",
                        stat.team,
                        DAY_LABELS[stat.weekday],
                        stat.spread(),
                        stat.min,
                        stat.max,
                        stat.mean
                    );
                }
            }
            if audit.is_clean() {
                println!("OK: no blocking violation");
                0
            } else {
                2
            }
        }
        Commands::List => {
            for info in store.list()? {
                let modified = info
                    .modified
                    .map(|m| m.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} | {} | {}", info.period, info.run_id, modified);
            }
            0
        }
        Commands::Counters { year, month, out } => {
            let key = PeriodKey::new(year, month);
            let record = store
                .load(key)?
                .with_context(|| format!("no record for period {key}"))?;
            match out {
                Some(path) => io::export_counters_csv(path, &record.counters)?,
                None => print!("{}", io::counters_to_csv_string(&record.counters)?),
            }
            0
        }
        Commands::Annual { year, out_csv } => {
            let mut schedules = Vec::new();
            for info in store.list()?.into_iter().filter(|i| i.period.year == year) {
                if let Some(record) = store.load(info.period)? {
                    schedules.push(record.schedule);
                }
            }
            if schedules.is_empty() {
                bail!("no recorded period for year {year}");
            }
            let annual = report::annual_report(year, &schedules);
            for m in &annual.months {
                println!(
                    "{year}-{:02} | {} employees | {} work days | sat {} | sun {}",
                    m.month, m.employees, m.work_days, m.saturdays, m.sundays
                );
            }
            println!(
                "{} months, {} employees, {} work days ({:.1} per employee-month)",
                annual.months.len(),
                annual.employees.len(),
                annual.total_work_days,
                annual.avg_work_days_per_employee_month
            );
            println!(
                "sundays: {} with none, {} with one, {} with two or more (spread {}); saturday spread {}",
                annual.without_sunday,
                annual.with_one_sunday,
                annual.with_two_plus_sundays,
                annual.sunday_spread,
                annual.saturday_spread
            );
            if let Some(path) = out_csv {
                io::export_annual_csv(path, &annual)?;
            }
            0
        }
    };

    std::process::exit(code);
}
