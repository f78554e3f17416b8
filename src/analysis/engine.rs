//! Raw match table → the three reportable statistics.
//!
//! Each statistic is computed on its own. A failure in one (typically a
//! missing column) leaves that statistic empty and is recorded in the report;
//! the others are still produced.

use super::champion_stats::{ChampionStats, ChampionStatsTracker};
use super::counters::{CounterList, MatchupTracker, DEFAULT_MIN_GAMES, DEFAULT_TOP_COUNTERS};
use super::runes::{RuneStats, RuneStatsTracker};
use super::{CHAMPION_STATS_FILE, COUNTERS_FILE, RUNES_FILE};
use crate::config::Config;
use crate::data::table::{ChampionId, MatchTable};
use crate::error::AppError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatistic {
    pub statistic: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub matches: usize,
    pub champions: Vec<ChampionStats>,
    pub counters: BTreeMap<ChampionId, CounterList>,
    pub runes: BTreeMap<ChampionId, Vec<RuneStats>>,
    pub skipped: Vec<SkippedStatistic>,
}

#[derive(Debug, Clone)]
pub struct ProcessedFiles {
    pub champion_stats: PathBuf,
    pub counters: PathBuf,
    pub runes: PathBuf,
}

impl ProcessedFiles {
    pub fn in_dir(dir: &Path) -> Self {
        ProcessedFiles {
            champion_stats: dir.join(CHAMPION_STATS_FILE),
            counters: dir.join(COUNTERS_FILE),
            runes: dir.join(RUNES_FILE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    min_counter_games: u32,
    top_counters: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator {
            min_counter_games: DEFAULT_MIN_GAMES,
            top_counters: DEFAULT_TOP_COUNTERS,
        }
    }
}

impl Aggregator {
    pub fn new(min_counter_games: u32, top_counters: usize) -> Self {
        Aggregator {
            min_counter_games,
            top_counters,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_counter_games, config.top_counters)
    }

    pub fn run(&self, table: &MatchTable) -> AggregationReport {
        let mut skipped = Vec::new();

        let champions = isolate("champion stats", &mut skipped, || {
            let mut tracker = ChampionStatsTracker::new();
            tracker.add_table(table)?;
            Ok(tracker.get_stats())
        });

        let counters = isolate("counters", &mut skipped, || {
            let mut tracker = MatchupTracker::new();
            tracker.add_table(table)?;
            Ok(tracker.counters(self.min_counter_games, self.top_counters))
        });

        let runes = isolate("rune stats", &mut skipped, || {
            let mut tracker = RuneStatsTracker::new();
            tracker.add_table(table)?;
            Ok(tracker.rune_stats())
        });

        tracing::info!(
            "Aggregated {} matches: {} champions, {} with counters, {} with rune stats",
            table.len(),
            champions.len(),
            counters.values().filter(|c| !c.counters.is_empty()).count(),
            runes.len()
        );

        AggregationReport {
            matches: table.len(),
            champions,
            counters,
            runes,
            skipped,
        }
    }

    /// Reads the raw table named in `config`, aggregates it and writes all
    /// three statistic files under `config.processed_dir`.
    pub fn process(&self, config: &Config) -> Result<(AggregationReport, ProcessedFiles), AppError> {
        let table = MatchTable::read_csv(&config.raw_matches_path)?;
        let report = self.run(&table);
        let files = write_report(&report, &config.processed_dir)?;
        Ok((report, files))
    }
}

fn isolate<T, F>(statistic: &'static str, skipped: &mut Vec<SkippedStatistic>, compute: F) -> T
where
    T: Default,
    F: FnOnce() -> Result<T, AppError>,
{
    match compute() {
        Ok(value) => value,
        Err(e) => {
            if e.is_missing_data() {
                tracing::warn!("Skipping {}: {}", statistic, e);
            } else {
                tracing::error!("Failed to compute {}: {}", statistic, e);
            }
            skipped.push(SkippedStatistic {
                statistic,
                reason: e.to_string(),
            });
            T::default()
        }
    }
}

pub fn write_report(report: &AggregationReport, dir: &Path) -> Result<ProcessedFiles, AppError> {
    fs::create_dir_all(dir)?;
    let files = ProcessedFiles::in_dir(dir);

    write_champion_stats(&report.champions, &files.champion_stats)?;
    write_json(&report.counters, &files.counters)?;
    write_json(&report.runes, &files.runes)?;

    tracing::info!("Statistics written to {}", dir.display());
    Ok(files)
}

pub fn write_champion_stats(stats: &[ChampionStats], path: &Path) -> Result<(), AppError> {
    let file = fs::File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    // Header is written explicitly so an empty result is still a valid table.
    writer
        .write_record(["champion_id", "games", "wins", "winrate"])
        .map_err(|e| AppError::CsvError(e.to_string()))?;
    for s in stats {
        writer
            .serialize(s.to_row())
            .map_err(|e| AppError::CsvError(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::JsonError(format!("Failed to serialize {}: {}", path.display(), e)))?;
    fs::write(path, json)?;
    Ok(())
}
