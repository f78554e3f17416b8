use crate::data::table::{ChampionId, MatchRecord, MatchTable, Side};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_MIN_GAMES: u32 = 10;
pub const DEFAULT_TOP_COUNTERS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchupStats {
    pub games: u64,
    pub wins: u64,
}

impl MatchupStats {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

/// An enemy champion the given champion does badly against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub enemy_id: ChampionId,
    pub games: u64,
    pub winrate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterList {
    pub counters: Vec<Counter>,
}

/// Worst winrate first; on ties the better-sampled matchup, then enemy id.
fn counter_order(a: &Counter, b: &Counter) -> Ordering {
    a.winrate
        .partial_cmp(&b.winrate)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.games.cmp(&a.games))
        .then_with(|| a.enemy_id.cmp(&b.enemy_id))
}

/// Head-to-head results seen from the ally side: every ally slot is paired
/// with every enemy slot of the same match.
#[derive(Debug, Clone, Default)]
pub struct MatchupTracker {
    pairs: BTreeMap<ChampionId, BTreeMap<ChampionId, MatchupStats>>,
}

impl MatchupTracker {
    pub fn new() -> Self {
        MatchupTracker::default()
    }

    pub fn add_matchup(&mut self, champion: ChampionId, enemy: ChampionId, won: bool) {
        let entry = self
            .pairs
            .entry(champion)
            .or_default()
            .entry(enemy)
            .or_default();
        entry.games += 1;
        if won {
            entry.wins += 1;
        }
    }

    pub fn add_match(&mut self, record: &MatchRecord) -> Result<(), AppError> {
        record.validate()?;
        for mine in &record.team {
            for theirs in &record.enemy {
                self.add_matchup(mine.champion, theirs.champion, record.team_win);
            }
        }
        Ok(())
    }

    pub fn add_table(&mut self, table: &MatchTable) -> Result<(), AppError> {
        let outcomes = table.outcomes()?;
        let team_slots = table.require_slot_columns(Side::Team)?;
        let enemy_slots = table.require_slot_columns(Side::Enemy)?;

        for mine in &team_slots {
            for theirs in &enemy_slots {
                let cells = mine.champions.iter().zip(theirs.champions).zip(&outcomes);
                for ((champion, enemy), outcome) in cells {
                    if let (Some(champion), Some(enemy), Some(won)) = (champion, enemy, outcome) {
                        self.add_matchup(*champion, *enemy, *won);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get_matchup(&self, champion: ChampionId, enemy: ChampionId) -> Option<MatchupStats> {
        self.pairs.get(&champion)?.get(&enemy).copied()
    }

    /// Games recorded for `champion` across all of its enemies.
    pub fn total_games(&self, champion: ChampionId) -> u64 {
        self.pairs
            .get(&champion)
            .map(|enemies| enemies.values().map(|m| m.games).sum())
            .unwrap_or(0)
    }

    /// Per champion, the `top_k` worst matchups with at least `min_games`
    /// games. Every champion seen on the ally side gets an entry, possibly
    /// empty.
    pub fn counters(&self, min_games: u32, top_k: usize) -> BTreeMap<ChampionId, CounterList> {
        self.pairs
            .iter()
            .map(|(&champion, enemies)| {
                let mut counters: Vec<Counter> = enemies
                    .iter()
                    .filter(|(_, m)| m.games >= u64::from(min_games))
                    .map(|(&enemy_id, m)| Counter {
                        enemy_id,
                        games: m.games,
                        winrate: m.win_rate(),
                    })
                    .collect();
                counters.sort_by(counter_order);
                counters.truncate(top_k);
                (champion, CounterList { counters })
            })
            .collect()
    }
}
