//! Read-only view over the processed statistic files.

use super::champion_stats::ChampionStatsRow;
use super::counters::{Counter, CounterList};
use super::engine::ProcessedFiles;
use super::runes::RuneStats;
use crate::data::table::ChampionId;
use crate::error::AppError;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_TOP_CHAMPIONS: usize = 30;

/// One processed file after [`StatsStore::open`] tried to read it.
#[derive(Debug, Clone)]
enum Loaded<T> {
    Ready(T),
    Missing,
    Unreadable(String),
}

impl<T> Loaded<T> {
    fn load<F>(path: &Path, read: F) -> Self
    where
        F: FnOnce(&Path) -> Result<T, AppError>,
    {
        if !path.exists() {
            tracing::warn!("{} not found", path.display());
            return Loaded::Missing;
        }
        match read(path) {
            Ok(value) => Loaded::Ready(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Loaded::Unreadable(e.to_string())
            }
        }
    }

    fn get(&self, what: &str) -> Result<&T, AppError> {
        match self {
            Loaded::Ready(value) => Ok(value),
            Loaded::Missing => Err(AppError::MissingData(format!(
                "no processed {}; run the `process` command first",
                what
            ))),
            Loaded::Unreadable(reason) => Err(AppError::MissingData(format!(
                "processed {} could not be read ({}); run the `process` command again",
                what, reason
            ))),
        }
    }
}

/// Each file is loaded independently; a missing or corrupt one only makes
/// its own lookups fail.
#[derive(Debug, Clone)]
pub struct StatsStore {
    champions: Loaded<Vec<ChampionStatsRow>>,
    counters: Loaded<BTreeMap<ChampionId, CounterList>>,
    runes: Loaded<BTreeMap<ChampionId, Vec<RuneStats>>>,
}

impl StatsStore {
    pub fn open(dir: &Path) -> Self {
        let files = ProcessedFiles::in_dir(dir);
        StatsStore {
            champions: Loaded::load(&files.champion_stats, read_champion_stats),
            counters: Loaded::load(&files.counters, read_json),
            runes: Loaded::load(&files.runes, read_json),
        }
    }

    /// Most-played champions first; ties broken by champion id.
    pub fn top_champions(&self, limit: usize) -> Result<Vec<ChampionStatsRow>, AppError> {
        let mut sorted = self.champions.get("champion statistics")?.clone();
        sorted.sort_by(|a, b| {
            b.games
                .cmp(&a.games)
                .then_with(|| a.champion_id.cmp(&b.champion_id))
        });
        sorted.truncate(limit);
        Ok(sorted)
    }

    pub fn counters_for(&self, champion: ChampionId) -> Result<Vec<Counter>, AppError> {
        Ok(self
            .counters
            .get("counters")?
            .get(&champion)
            .map(|c| c.counters.clone())
            .unwrap_or_default())
    }

    pub fn runes_for(&self, champion: ChampionId) -> Result<Vec<RuneStats>, AppError> {
        Ok(self
            .runes
            .get("rune statistics")?
            .get(&champion)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn read_champion_stats(path: &Path) -> Result<Vec<ChampionStatsRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::CsvError(format!("Failed to open {}: {}", path.display(), e)))?;

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|e| AppError::CsvError(format!("Failed to parse {}: {}", path.display(), e)))
        })
        .collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::JsonError(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::engine::{write_report, Aggregator};
    use crate::data::table::{MatchRecord, MatchTable, Slot};

    fn processed_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut records = Vec::new();
        for i in 0..12 {
            records.push(MatchRecord::with_slots(
                vec![Slot::with_rune(1, 8005), Slot::with_rune(2, 8010)],
                vec![Slot::with_rune(3, 8112)],
                i % 3 != 0,
            )
            .unwrap());
        }
        records.push(MatchRecord::new(&[4], &[5], true).unwrap());
        let report = Aggregator::default().run(&MatchTable::from_records(&records).unwrap());
        write_report(&report, dir.path()).unwrap();
        dir
    }

    #[test]
    fn test_top_champions_sorted_and_truncated() {
        let dir = processed_dir();
        let store = StatsStore::open(dir.path());

        let top = store.top_champions(DEFAULT_TOP_CHAMPIONS).unwrap();
        let ids: Vec<u32> = top.iter().map(|c| c.champion_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(top[0].games, 12);
        assert!((top[0].winrate - 8.0 / 12.0).abs() < 1e-9);

        assert_eq!(store.top_champions(2).unwrap().len(), 2);
    }

    #[test]
    fn test_lookups() {
        let dir = processed_dir();
        let store = StatsStore::open(dir.path());

        let counters = store.counters_for(1).unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].enemy_id, 3);

        assert!(store.counters_for(999).unwrap().is_empty());
        assert_eq!(store.runes_for(3).unwrap()[0].rune_id, 8112);
    }

    #[test]
    fn test_missing_files_fail_per_statistic() {
        let dir = processed_dir();
        fs::remove_file(dir.path().join(crate::analysis::RUNES_FILE)).unwrap();

        let store = StatsStore::open(dir.path());
        assert!(store.top_champions(5).is_ok());
        assert!(store.runes_for(1).unwrap_err().is_missing_data());

        let empty = tempfile::tempdir().unwrap();
        let store = StatsStore::open(empty.path());
        assert!(store.top_champions(5).unwrap_err().is_missing_data());
        assert!(store.counters_for(1).unwrap_err().is_missing_data());
    }

    #[test]
    fn test_corrupt_file_fails_only_its_own_lookups() {
        let dir = processed_dir();
        fs::write(dir.path().join(crate::analysis::COUNTERS_FILE), "{ not json").unwrap();
        fs::write(
            dir.path().join(crate::analysis::CHAMPION_STATS_FILE),
            "champion_id,games,wins,winrate\nabc,1,1,1.0\n",
        )
        .unwrap();

        let store = StatsStore::open(dir.path());
        assert!(store.counters_for(1).unwrap_err().is_missing_data());
        assert!(store.top_champions(5).unwrap_err().is_missing_data());
        assert_eq!(store.runes_for(3).unwrap()[0].rune_id, 8112);
    }
}
