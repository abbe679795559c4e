#![forbid(unsafe_code)]
//! Weekend Rota — génération de plannings hebdomadaires 5x2 pour des équipes fixes.
//!
//! - Chaque employé travaille 5 jours sur 7, jamais samedi et dimanche à la fois.
//! - Rotation équitable des samedis et dimanches par équipe, une équipe exemptée du dimanche chaque semaine.
//! - Compteurs cumulés persistés d'une période à l'autre (JSON/CSV, sans BD).
//! - Audit indépendant du planning produit.

pub mod audit;
pub mod io;
pub mod model;
pub mod report;
pub mod scheduler;
pub mod storage;

pub use audit::{audit_schedule, AuditReport, Violation, ViolationKind};
pub use model::{
    Day, DutyKind, EmployeeCounters, EmployeeId, MonthlySchedule, Period, PeriodCounters,
    PeriodKey, ScheduleRow, Team, TeamRoster, WeekPattern,
};
pub use report::{annual_report, rest_day_stats, team_summary, weekly_summary, AnnualReport};
pub use scheduler::{run_period, EngineOptions, PeriodOutcome, RepairMode, SchedError, Scheduler};
pub use storage::{HistoryStore, JsonHistoryStore, PeriodInfo, PeriodRecord};
