use crate::model::{MonthlySchedule, PeriodCounters, PeriodKey};
use crate::scheduler::PeriodOutcome;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Enregistrement persistant d'une période générée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub period: PeriodKey,
    pub schedule: MonthlySchedule,
    pub period_totals: PeriodCounters,
    pub counters: PeriodCounters,
}

impl PeriodRecord {
    pub fn from_outcome(outcome: PeriodOutcome) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            period: outcome.schedule.period.key(),
            schedule: outcome.schedule,
            period_totals: outcome.period_totals,
            counters: outcome.counters,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodInfo {
    pub period: PeriodKey,
    pub run_id: Uuid,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

pub trait HistoryStore {
    /// Charge l'enregistrement d'une période, `None` s'il n'existe pas.
    fn load(&self, key: PeriodKey) -> anyhow::Result<Option<PeriodRecord>>;
    /// Sauvegarde de manière atomique (remplace un enregistrement existant).
    fn save(&self, record: &PeriodRecord) -> anyhow::Result<PathBuf>;
    /// Périodes disponibles, triées chronologiquement.
    fn list(&self) -> anyhow::Result<Vec<PeriodInfo>>;

    /// Compteurs cumulés du mois précédent `key`.
    fn previous_counters(&self, key: PeriodKey) -> anyhow::Result<Option<PeriodCounters>> {
        Ok(self.load(key.previous())?.map(|r| r.counters))
    }
}

/// Historique sur disque : un fichier `rota_YYYY_MM.json` par période.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    base_dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            base_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: PeriodKey) -> PathBuf {
        self.base_dir
            .join(format!("rota_{:04}_{:02}.json", key.year, key.month))
    }

    fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("creating history directory {}", self.base_dir.display()))
    }

    fn read(path: &Path) -> anyhow::Result<PeriodRecord> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self, key: PeriodKey) -> anyhow::Result<Option<PeriodRecord>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let record = Self::read(&path)?;
        if record.period != key {
            bail!(
                "{} holds period {}, expected {}",
                path.display(),
                record.period,
                key
            );
        }
        Ok(Some(record))
    }

    fn save(&self, record: &PeriodRecord) -> anyhow::Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_for(record.period);
        let json = serde_json::to_vec_pretty(record)?;
        let mut tmp = NamedTempFile::new_in(&self.base_dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).with_context(|| "atomic rename")?;
        tracing::debug!(period = %record.period, path = %path.display(), "period record saved");
        Ok(path)
    }

    fn list(&self) -> anyhow::Result<Vec<PeriodInfo>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut infos = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|n| n.starts_with("rota_") && n.ends_with(".json"));
            if !is_record {
                continue;
            }
            let record = match Self::read(&path) {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable record: {err:#}");
                    continue;
                }
            };
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            infos.push(PeriodInfo {
                period: record.period,
                run_id: record.run_id,
                path,
                modified,
            });
        }
        infos.sort_by_key(|i| i.period);
        Ok(infos)
    }
}
