use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Nombre de jours ouvrés (lundi..vendredi) dans une semaine.
pub const WEEKDAYS: usize = 5;
/// Index du samedi dans un `WeekPattern`.
pub const SATURDAY: usize = 5;
/// Index du dimanche dans un `WeekPattern`.
pub const SUNDAY: usize = 6;
/// Quota hebdomadaire de jours travaillés (régime 5x2).
pub const WORK_DAYS_PER_WEEK: usize = 5;

/// Abréviations des jours, lundi en premier.
pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Identifiant fort pour un employé (nom complet, unique).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().trim().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Équipe fixe : partage les rotations de week-end et de repos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub members: Vec<EmployeeId>,
}

impl Team {
    pub fn new<N: Into<String>, I, S>(name: N, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(EmployeeId::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, employee: &EmployeeId) -> bool {
        self.members.contains(employee)
    }
}

/// Définition complète des équipes, dans un ordre stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub teams: Vec<Team>,
}

impl TeamRoster {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    pub fn find_team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn team_of(&self, employee: &EmployeeId) -> Option<&Team> {
        self.teams.iter().find(|t| t.contains(employee))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.name == name)
    }

    pub fn employees(&self) -> impl Iterator<Item = (&Team, &EmployeeId)> {
        self.teams
            .iter()
            .flat_map(|t| t.members.iter().map(move |m| (t, m)))
    }

    /// Index de l'équipe sans travailleur du dimanche pour la semaine `week` (1-based).
    pub fn sunday_excluded_index(&self, week: u32) -> Option<usize> {
        if self.teams.is_empty() || week == 0 {
            return None;
        }
        Some((week as usize - 1) % self.teams.len())
    }
}

/// État d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Work,
    Rest,
}

impl Day {
    pub fn is_work(self) -> bool {
        self == Day::Work
    }

    pub fn is_rest(self) -> bool {
        self == Day::Rest
    }

    /// Code d'une lettre utilisé dans les exports (`W` / `R`).
    pub fn code(self) -> char {
        match self {
            Day::Work => 'W',
            Day::Rest => 'R',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' | 'P' => Some(Day::Work),
            'R' | 'F' => Some(Day::Rest),
            _ => None,
        }
    }
}

/// Semaine type d'un employé : 7 jours, lundi en premier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekPattern(pub [Day; 7]);

impl WeekPattern {
    pub fn all(day: Day) -> Self {
        Self([day; 7])
    }

    pub fn days(&self) -> &[Day; 7] {
        &self.0
    }

    pub fn get(&self, idx: usize) -> Day {
        self.0[idx]
    }

    pub fn set(&mut self, idx: usize, day: Day) {
        self.0[idx] = day;
    }

    pub fn work_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_work()).count()
    }

    pub fn rest_count(&self) -> usize {
        7 - self.work_count()
    }

    pub fn works_saturday(&self) -> bool {
        self.0[SATURDAY].is_work()
    }

    pub fn works_sunday(&self) -> bool {
        self.0[SUNDAY].is_work()
    }

    /// Première paire (i, i+1) de repos adjacents entre lundi et vendredi.
    pub fn first_adjacent_weekday_rest(&self) -> Option<usize> {
        (0..WEEKDAYS - 1).find(|&i| self.0[i].is_rest() && self.0[i + 1].is_rest())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let codes: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if codes.len() != 7 {
            return None;
        }
        let mut days = [Day::Work; 7];
        for (slot, c) in days.iter_mut().zip(codes) {
            *slot = Day::from_code(c)?;
        }
        Some(Self(days))
    }
}

impl fmt::Display for WeekPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{}", d.code())?;
        }
        Ok(())
    }
}

/// Type d'astreinte de week-end, chacun avec sa propre file de rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DutyKind {
    Sunday,
    Saturday,
}

impl fmt::Display for DutyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyKind::Sunday => f.write_str("sunday"),
            DutyKind::Saturday => f.write_str("saturday"),
        }
    }
}

/// Clé d'une période (année, mois).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).is_some()
    }

    /// Période précédente (janvier -> décembre de l'année précédente).
    pub fn previous(&self) -> Self {
        if self.month <= 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Période à planifier : un mois découpé en `weeks` semaines abstraites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub weeks: u32,
}

impl Period {
    pub const DEFAULT_WEEKS: u32 = 4;

    pub fn new(year: i32, month: u32, weeks: u32) -> Self {
        Self { year, month, weeks }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self::new(year, month, Self::DEFAULT_WEEKS)
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey::new(self.year, self.month)
    }
}

/// Compteurs cumulés d'un employé ; seul état qui survit entre deux périodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCounters {
    pub saturdays: u32,
    pub sundays: u32,
    pub weekend_total: u32,
    #[serde(default)]
    pub sunday_round: u32,
    #[serde(default)]
    pub saturday_round: u32,
}

impl EmployeeCounters {
    pub fn duty(&self, kind: DutyKind) -> u32 {
        match kind {
            DutyKind::Sunday => self.sundays,
            DutyKind::Saturday => self.saturdays,
        }
    }
}

/// Compteurs par employé, triés par nom pour une sérialisation stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodCounters {
    pub entries: BTreeMap<EmployeeId, EmployeeCounters>,
}

impl PeriodCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compteurs à zéro pour tous les employés du roster.
    pub fn zeroed(teams: &TeamRoster) -> Self {
        let entries = teams
            .employees()
            .map(|(_, e)| (e.clone(), EmployeeCounters::default()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, employee: &EmployeeId) -> EmployeeCounters {
        self.entries.get(employee).copied().unwrap_or_default()
    }

    pub fn insert(&mut self, employee: EmployeeId, counters: EmployeeCounters) {
        self.entries.insert(employee, counters);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EmployeeId, &EmployeeCounters)> {
        self.entries.iter()
    }
}

/// Ligne du planning : un employé, une semaine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub week: u32,
    pub team: String,
    pub employee: EmployeeId,
    pub pattern: WeekPattern,
}

impl ScheduleRow {
    pub fn work_days(&self) -> usize {
        self.pattern.work_count()
    }

    pub fn rest_days(&self) -> usize {
        self.pattern.rest_count()
    }
}

/// Planning d'une période, construit semaine après semaine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySchedule {
    pub period: Period,
    pub rows: Vec<ScheduleRow>,
}

impl MonthlySchedule {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            rows: Vec::new(),
        }
    }

    pub fn weeks(&self) -> Vec<u32> {
        let mut weeks: Vec<u32> = self.rows.iter().map(|r| r.week).collect();
        weeks.sort_unstable();
        weeks.dedup();
        weeks
    }

    pub fn rows_for_week(&self, week: u32) -> impl Iterator<Item = &ScheduleRow> {
        self.rows.iter().filter(move |r| r.week == week)
    }

    pub fn rows_for_team<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a ScheduleRow> {
        self.rows.iter().filter(move |r| r.team == team)
    }

    pub fn rows_for_employee<'a>(
        &'a self,
        employee: &'a EmployeeId,
    ) -> impl Iterator<Item = &'a ScheduleRow> {
        self.rows.iter().filter(move |r| &r.employee == employee)
    }

    /// Samedis / dimanches travaillés par employé sur la période.
    pub fn weekend_totals(&self) -> BTreeMap<EmployeeId, EmployeeCounters> {
        let mut out: BTreeMap<EmployeeId, EmployeeCounters> = BTreeMap::new();
        for row in &self.rows {
            let entry = out.entry(row.employee.clone()).or_default();
            if row.pattern.works_saturday() {
                entry.saturdays += 1;
                entry.weekend_total += 1;
            }
            if row.pattern.works_sunday() {
                entry.sundays += 1;
                entry.weekend_total += 1;
            }
        }
        out
    }
}
