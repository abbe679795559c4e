use crate::model::DutyKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stratégie de correction des repos adjacents en semaine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// Corrige uniquement la première paire trouvée (comportement historique).
    #[default]
    SinglePass,
    /// Recommence jusqu'à ce qu'aucune paire ne subsiste (borné).
    UntilClean,
}

/// Options du moteur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub saturday_headcount: usize,
    pub sunday_headcount: usize,
    pub sunday_tolerance: u32,
    pub saturday_tolerance: u32,
    pub rest_balance_tolerance: f64,
    pub rest_days_per_week: u32,
    pub rest_history_len: usize,
    pub seed: Option<u64>,
    pub adjacent_rest_repair: RepairMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            saturday_headcount: 2,
            sunday_headcount: 1,
            sunday_tolerance: 1,
            saturday_tolerance: 2,
            rest_balance_tolerance: 0.5,
            rest_days_per_week: 2,
            rest_history_len: 10,
            seed: None,
            adjacent_rest_repair: RepairMode::SinglePass,
        }
    }
}

impl EngineOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), SchedError> {
        if self.rest_history_len == 0 {
            return Err(SchedError::InvalidOptions(
                "rest_history_len must be > 0".to_string(),
            ));
        }
        if !self.rest_balance_tolerance.is_finite() || self.rest_balance_tolerance < 0.0 {
            return Err(SchedError::InvalidOptions(
                "rest_balance_tolerance must be a non-negative fraction".to_string(),
            ));
        }
        if self.rest_days_per_week > 7 {
            return Err(SchedError::InvalidOptions(
                "rest_days_per_week must be <= 7".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("no team defined")]
    NoTeams,
    #[error("team {0} has no member")]
    EmptyTeam(String),
    #[error("employee {employee} listed in teams {first} and {second}")]
    DuplicateEmployee {
        employee: String,
        first: String,
        second: String,
    },
    #[error("unknown employee: {0}")]
    UnknownEmployee(String),
    #[error("week count must be > 0 (got {0})")]
    InvalidWeekCount(u32),
    #[error("invalid period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("unsatisfiable {duty} constraint for team {team}: {reason}")]
    Unsatisfiable {
        team: String,
        duty: DutyKind,
        reason: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    /// Erreur de configuration, détectée avant toute planification.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SchedError::NoTeams
                | SchedError::EmptyTeam(_)
                | SchedError::DuplicateEmployee { .. }
                | SchedError::UnknownEmployee(_)
                | SchedError::InvalidWeekCount(_)
                | SchedError::InvalidPeriod { .. }
                | SchedError::InvalidOptions(_)
        )
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, SchedError::Unsatisfiable { .. })
    }
}
