//! Columnar raw match table.
//!
//! One row per historical match. Column names follow the raw export layout:
//! `match_id`, `team_champ1..5`, `team_rune1..5`, `enemy_champ1..5`,
//! `enemy_rune1..5` and `team_win`. Any column may be missing from a given
//! export and any cell may be empty; consumers decide what they require.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

pub type ChampionId = u32;
pub type RuneId = u32;

pub const MAX_ROSTER_SIZE: usize = 5;
pub const MATCH_ID_COLUMN: &str = "match_id";
pub const OUTCOME_COLUMN: &str = "team_win";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Team,
    Enemy,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Team, Side::Enemy];

    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Team => "team",
            Side::Enemy => "enemy",
        }
    }

    /// Column holding the champion of `slot` (0-based).
    pub fn champion_column(&self, slot: usize) -> String {
        format!("{}_champ{}", self.prefix(), slot + 1)
    }

    /// Column holding the rune of `slot` (0-based).
    pub fn rune_column(&self, slot: usize) -> String {
        format!("{}_rune{}", self.prefix(), slot + 1)
    }

    /// Whether a champion on this side won, given the ally outcome flag.
    pub fn champion_won(&self, team_win: bool) -> bool {
        match self {
            Side::Team => team_win,
            Side::Enemy => !team_win,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub champion: ChampionId,
    pub rune: Option<RuneId>,
}

impl Slot {
    pub fn new(champion: ChampionId) -> Self {
        Slot { champion, rune: None }
    }

    pub fn with_rune(champion: ChampionId, rune: RuneId) -> Self {
        Slot {
            champion,
            rune: Some(rune),
        }
    }
}

/// A single recorded game, seen from the ally ("team") side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: Option<u32>,
    pub team: Vec<Slot>,
    pub enemy: Vec<Slot>,
    pub team_win: bool,
}

impl MatchRecord {
    /// Rosters must hold 1 to 5 positive champion ids.
    pub fn new(team: &[ChampionId], enemy: &[ChampionId], team_win: bool) -> Result<Self, AppError> {
        Self::with_slots(
            team.iter().copied().map(Slot::new).collect(),
            enemy.iter().copied().map(Slot::new).collect(),
            team_win,
        )
    }

    pub fn with_slots(team: Vec<Slot>, enemy: Vec<Slot>, team_win: bool) -> Result<Self, AppError> {
        let record = MatchRecord {
            match_id: None,
            team,
            enemy,
            team_win,
        };
        record.validate()?;
        Ok(record)
    }

    /// Roster rules for records assembled through the public fields.
    pub fn validate(&self) -> Result<(), AppError> {
        for side in Side::BOTH {
            let slots = self.slots(side);
            let champions: Vec<ChampionId> = slots.iter().map(|s| s.champion).collect();
            validate_roster(side.prefix(), &champions)?;
            if slots.iter().any(|s| s.rune == Some(0)) {
                return Err(AppError::InvalidInput(format!(
                    "{} roster contains rune id 0; ids must be positive",
                    side.prefix()
                )));
            }
        }
        Ok(())
    }

    pub fn slots(&self, side: Side) -> &[Slot] {
        match side {
            Side::Team => &self.team,
            Side::Enemy => &self.enemy,
        }
    }
}

/// 1 to [`MAX_ROSTER_SIZE`] champions, none of them id 0.
pub fn validate_roster(side: &str, roster: &[ChampionId]) -> Result<(), AppError> {
    if roster.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{} roster needs at least one champion",
            side
        )));
    }
    if roster.len() > MAX_ROSTER_SIZE {
        return Err(AppError::InvalidInput(format!(
            "{} roster has {} champions, at most {} allowed",
            side,
            roster.len(),
            MAX_ROSTER_SIZE
        )));
    }
    if roster.contains(&0) {
        return Err(AppError::InvalidInput(format!(
            "{} roster contains champion id 0; ids must be positive",
            side
        )));
    }
    Ok(())
}

/// Champion column of one roster slot, paired with its rune column when the
/// export carries one.
#[derive(Debug, Clone, Copy)]
pub struct SlotColumns<'a> {
    pub slot: usize,
    pub champions: &'a [Option<u32>],
    pub runes: Option<&'a [Option<u32>]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    rows: usize,
    columns: BTreeMap<String, Vec<Option<u32>>>,
}

/// Column order used when writing a table back to disk.
fn canonical_columns() -> Vec<String> {
    let mut names = vec![MATCH_ID_COLUMN.to_string()];
    for side in Side::BOTH {
        for slot in 0..MAX_ROSTER_SIZE {
            names.push(side.champion_column(slot));
            names.push(side.rune_column(slot));
        }
    }
    names.push(OUTCOME_COLUMN.to_string());
    names
}

fn is_known_column(name: &str) -> bool {
    canonical_columns().iter().any(|c| c == name)
}

impl MatchTable {
    pub fn new() -> Self {
        MatchTable::default()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<u32>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[Option<u32>], AppError> {
        self.column(name)
            .ok_or_else(|| AppError::MissingData(format!("column '{}' is absent", name)))
    }

    /// Adds or replaces a column. The first column fixes the row count.
    /// Cells follow the same rules as CSV input: id 0 becomes an empty
    /// cell and outcomes must be 0 or 1.
    pub fn insert_column(
        &mut self,
        name: &str,
        mut values: Vec<Option<u32>>,
    ) -> Result<(), AppError> {
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(AppError::InvalidInput(format!(
                "column '{}' has {} rows, table has {}",
                name,
                values.len(),
                self.rows
            )));
        }
        for (row, cell) in values.iter_mut().enumerate() {
            *cell = normalize_cell(name, *cell).map_err(|msg| {
                AppError::InvalidInput(format!("row {}: column '{}': {}", row + 1, name, msg))
            })?;
        }
        self.rows = values.len();
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    /// Outcome column as booleans; empty cells stay `None`.
    pub fn outcomes(&self) -> Result<Vec<Option<bool>>, AppError> {
        Ok(self
            .require(OUTCOME_COLUMN)?
            .iter()
            .map(|cell| cell.map(|v| v != 0))
            .collect())
    }

    /// The champion columns present for `side`, each with its rune column if any.
    pub fn slot_columns(&self, side: Side) -> Vec<SlotColumns<'_>> {
        (0..MAX_ROSTER_SIZE)
            .filter_map(|slot| {
                let champions = self.column(&side.champion_column(slot))?;
                Some(SlotColumns {
                    slot,
                    champions,
                    runes: self.column(&side.rune_column(slot)),
                })
            })
            .collect()
    }

    /// Like [`slot_columns`](Self::slot_columns) but fails when the side has
    /// no champion column at all.
    pub fn require_slot_columns(&self, side: Side) -> Result<Vec<SlotColumns<'_>>, AppError> {
        let slots = self.slot_columns(side);
        if slots.is_empty() {
            return Err(AppError::MissingData(format!(
                "no {}_champN columns in match table",
                side.prefix()
            )));
        }
        Ok(slots)
    }

    /// Fails with `InvalidInput` on the first record that breaks the roster
    /// rules, so nothing is truncated on the way into columns.
    pub fn from_records(records: &[MatchRecord]) -> Result<Self, AppError> {
        for record in records {
            record.validate()?;
        }
        let rows = records.len();
        let mut columns: BTreeMap<String, Vec<Option<u32>>> = BTreeMap::new();

        let ids: Vec<Option<u32>> = records.iter().map(|r| r.match_id).collect();
        if ids.iter().any(|id| id.is_some()) {
            columns.insert(MATCH_ID_COLUMN.to_string(), ids);
        }

        for side in Side::BOTH {
            let has_runes = records
                .iter()
                .any(|r| r.slots(side).iter().any(|s| s.rune.is_some()));

            for slot in 0..MAX_ROSTER_SIZE {
                let cells: Vec<Option<&Slot>> =
                    records.iter().map(|r| r.slots(side).get(slot)).collect();
                columns.insert(
                    side.champion_column(slot),
                    cells.iter().map(|s| s.map(|s| s.champion)).collect(),
                );
                if has_runes {
                    columns.insert(
                        side.rune_column(slot),
                        cells.iter().map(|s| s.and_then(|s| s.rune)).collect(),
                    );
                }
            }
        }

        columns.insert(
            OUTCOME_COLUMN.to_string(),
            records.iter().map(|r| Some(u32::from(r.team_win))).collect(),
        );

        Ok(MatchTable { rows, columns })
    }

    /// Rebuilds typed rows. Rows without an outcome or with an empty roster
    /// on either side are dropped.
    pub fn records(&self) -> Result<Vec<MatchRecord>, AppError> {
        let outcomes = self.outcomes()?;
        let team_slots = self.require_slot_columns(Side::Team)?;
        let enemy_slots = self.require_slot_columns(Side::Enemy)?;
        let ids = self.column(MATCH_ID_COLUMN);

        let roster_at = |slots: &[SlotColumns<'_>], row: usize| -> Vec<Slot> {
            slots
                .iter()
                .filter_map(|col| {
                    let champion = col.champions[row]?;
                    let rune = col.runes.and_then(|r| r[row]);
                    Some(Slot { champion, rune })
                })
                .collect()
        };

        let mut records = Vec::with_capacity(self.rows);
        for (row, outcome) in outcomes.iter().enumerate() {
            let Some(team_win) = *outcome else { continue };
            let team = roster_at(&team_slots, row);
            let enemy = roster_at(&enemy_slots, row);
            if team.is_empty() || enemy.is_empty() {
                continue;
            }
            records.push(MatchRecord {
                match_id: ids.and_then(|c| c[row]),
                team,
                enemy,
                team_win,
            });
        }
        Ok(records)
    }

    pub fn read_csv(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::MissingData(format!(
                "raw match table {} not found",
                path.display()
            )));
        }
        let file = fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} matches ({} columns) from {}",
            table.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| AppError::CsvError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        // Unknown columns (extra metadata) are ignored.
        let wanted: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| is_known_column(name))
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        let mut values: Vec<Vec<Option<u32>>> = vec![Vec::new(); wanted.len()];
        let mut rows = 0;

        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|e| AppError::CsvError(e.to_string()))?;
            for (col, (idx, name)) in wanted.iter().enumerate() {
                let raw = record.get(*idx).unwrap_or("");
                let cell = parse_cell(name, raw).map_err(|msg| {
                    AppError::CsvError(format!("row {}: column '{}': {}", line + 1, name, msg))
                })?;
                values[col].push(cell);
            }
            rows += 1;
        }

        let columns = wanted
            .into_iter()
            .map(|(_, name)| name)
            .zip(values)
            .collect();

        Ok(MatchTable { rows, columns })
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        self.to_writer(file)?;
        tracing::info!("Wrote {} matches to {}", self.rows, path.display());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_writer(writer);
        let present: Vec<String> = canonical_columns()
            .into_iter()
            .filter(|name| self.columns.contains_key(name))
            .collect();

        writer
            .write_record(&present)
            .map_err(|e| AppError::CsvError(e.to_string()))?;

        for row in 0..self.rows {
            let cells: Vec<String> = present
                .iter()
                .map(|name| match self.columns[name][row] {
                    Some(v) => v.to_string(),
                    None => String::new(),
                })
                .collect();
            writer
                .write_record(&cells)
                .map_err(|e| AppError::CsvError(e.to_string()))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn parse_cell(column: &str, raw: &str) -> Result<Option<u32>, String> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    if column == OUTCOME_COLUMN {
        return match raw.to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Ok(Some(1)),
            "0" | "0.0" | "false" => Ok(Some(0)),
            _ => Err(format!("outcome must be 0 or 1, got '{}'", raw)),
        };
    }

    let value = match raw.parse::<u32>() {
        Ok(v) => v,
        // Exports that went through a float column write ids as "157.0".
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => f as u32,
            _ => return Err(format!("expected a non-negative integer, got '{}'", raw)),
        },
    };

    normalize_cell(column, Some(value))
}

/// Shared by CSV parsing and in-memory columns.
fn normalize_cell(column: &str, cell: Option<u32>) -> Result<Option<u32>, String> {
    match cell {
        Some(v) if column == OUTCOME_COLUMN && v > 1 => {
            Err(format!("outcome must be 0 or 1, got {}", v))
        }
        // Id 0 marks an empty slot, never a champion or rune.
        Some(0) if column != MATCH_ID_COLUMN && column != OUTCOME_COLUMN => Ok(None),
        other => Ok(other),
    }
}
