use crate::data::table::{ChampionId, MatchRecord, MatchTable, Side};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionStats {
    pub champion_id: ChampionId,
    pub games: u64,
    pub wins: u64,
    pub ally_games: u64,
    pub enemy_games: u64,
}

impl ChampionStats {
    pub fn new(champion_id: ChampionId) -> Self {
        ChampionStats {
            champion_id,
            games: 0,
            wins: 0,
            ally_games: 0,
            enemy_games: 0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    fn record(&mut self, side: Side, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
        match side {
            Side::Team => self.ally_games += 1,
            Side::Enemy => self.enemy_games += 1,
        }
    }

    pub fn to_row(&self) -> ChampionStatsRow {
        ChampionStatsRow {
            champion_id: self.champion_id,
            games: self.games,
            wins: self.wins,
            winrate: self.win_rate(),
        }
    }
}

/// One line of `stats_per_champion.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionStatsRow {
    pub champion_id: ChampionId,
    pub games: u64,
    pub wins: u64,
    pub winrate: f64,
}

/// Per-champion games and wins over both sides of every match. A champion on
/// the enemy side wins exactly when the ally side loses.
#[derive(Debug, Clone, Default)]
pub struct ChampionStatsTracker {
    stats: BTreeMap<ChampionId, ChampionStats>,
}

impl ChampionStatsTracker {
    pub fn new() -> Self {
        ChampionStatsTracker {
            stats: BTreeMap::new(),
        }
    }

    pub fn add_appearance(&mut self, champion_id: ChampionId, side: Side, team_win: bool) {
        self.stats
            .entry(champion_id)
            .or_insert_with(|| ChampionStats::new(champion_id))
            .record(side, side.champion_won(team_win));
    }

    /// Rejects records that break the roster rules before counting anything.
    pub fn add_match(&mut self, record: &MatchRecord) -> Result<(), AppError> {
        record.validate()?;
        for side in Side::BOTH {
            for slot in record.slots(side) {
                self.add_appearance(slot.champion, side, record.team_win);
            }
        }
        Ok(())
    }

    /// Folds a whole table in, one slot column at a time. Needs the outcome
    /// column and at least one champion column.
    pub fn add_table(&mut self, table: &MatchTable) -> Result<(), AppError> {
        let outcomes = table.outcomes()?;
        let mut any_side = false;

        for side in Side::BOTH {
            let slots = table.slot_columns(side);
            any_side |= !slots.is_empty();
            for column in slots {
                for (cell, outcome) in column.champions.iter().zip(&outcomes) {
                    if let (Some(champion), Some(team_win)) = (cell, outcome) {
                        self.add_appearance(*champion, side, *team_win);
                    }
                }
            }
        }

        if !any_side {
            return Err(AppError::MissingData(
                "match table has no champion columns".to_string(),
            ));
        }
        Ok(())
    }

    /// All champions, ordered by id.
    pub fn get_stats(&self) -> Vec<ChampionStats> {
        self.stats.values().cloned().collect()
    }

    pub fn get_champion(&self, champion_id: ChampionId) -> Option<ChampionStats> {
        self.stats.get(&champion_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Slot;

    #[test]
    fn test_single_match_scenario() {
        let mut tracker = ChampionStatsTracker::new();
        let record = MatchRecord::new(&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10], true).unwrap();
        tracker.add_match(&record).unwrap();

        let stats = tracker.get_stats();
        assert_eq!(stats.len(), 10);
        for s in &stats {
            assert_eq!(s.games, 1);
            if s.champion_id <= 5 {
                assert_eq!(s.wins, 1);
                assert_eq!(s.win_rate(), 1.0);
            } else {
                assert_eq!(s.wins, 0);
                assert_eq!(s.win_rate(), 0.0);
            }
        }
    }

    #[test]
    fn test_table_and_records_agree() {
        let records = vec![
            MatchRecord::new(&[1, 2], &[3], true).unwrap(),
            MatchRecord::new(&[3, 1], &[2, 4], false).unwrap(),
            MatchRecord::new(&[4], &[1, 2, 3], true).unwrap(),
        ];
        let mut by_record = ChampionStatsTracker::new();
        for record in &records {
            by_record.add_match(record).unwrap();
        }

        let mut by_table = ChampionStatsTracker::new();
        by_table.add_table(&MatchTable::from_records(&records).unwrap()).unwrap();

        assert_eq!(by_record.get_stats(), by_table.get_stats());

        let one = by_table.get_champion(1).unwrap();
        assert_eq!(one.games, 3);
        assert_eq!(one.wins, 1);
        assert_eq!(one.ally_games, 2);
        assert_eq!(one.enemy_games, 1);
    }

    #[test]
    fn test_table_without_champion_columns() {
        let mut table = MatchTable::new();
        table.insert_column("team_win", vec![Some(1)]).unwrap();
        let err = ChampionStatsTracker::new().add_table(&table).unwrap_err();
        assert!(err.is_missing_data());
    }

    #[test]
    fn test_oversized_record_is_rejected_not_counted() {
        let mut record = MatchRecord::new(&[1, 2, 3, 4, 5], &[7], true).unwrap();
        record.team.push(Slot::new(6));

        let mut tracker = ChampionStatsTracker::new();
        assert!(matches!(
            tracker.add_match(&record),
            Err(AppError::InvalidInput(_))
        ));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_win_rate_with_no_games() {
        assert_eq!(ChampionStats::new(7).win_rate(), 0.0);
    }
}
