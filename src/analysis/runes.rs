use crate::data::table::{ChampionId, MatchRecord, MatchTable, RuneId, Side};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuneStats {
    pub rune_id: RuneId,
    pub games: u64,
    pub winrate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RuneCount {
    games: u64,
    wins: u64,
}

/// Games and wins per (champion, rune) for every slot that carries a rune.
#[derive(Debug, Clone, Default)]
pub struct RuneStatsTracker {
    counts: BTreeMap<ChampionId, BTreeMap<RuneId, RuneCount>>,
}

impl RuneStatsTracker {
    pub fn new() -> Self {
        RuneStatsTracker::default()
    }

    pub fn add_pick(&mut self, champion: ChampionId, rune: RuneId, won: bool) {
        let entry = self
            .counts
            .entry(champion)
            .or_default()
            .entry(rune)
            .or_default();
        entry.games += 1;
        if won {
            entry.wins += 1;
        }
    }

    pub fn add_match(&mut self, record: &MatchRecord) -> Result<(), AppError> {
        record.validate()?;
        for side in Side::BOTH {
            let won = side.champion_won(record.team_win);
            for slot in record.slots(side) {
                if let Some(rune) = slot.rune {
                    self.add_pick(slot.champion, rune, won);
                }
            }
        }
        Ok(())
    }

    /// Fails with `MissingData` when the table has no rune column paired with
    /// a champion column.
    pub fn add_table(&mut self, table: &MatchTable) -> Result<(), AppError> {
        let outcomes = table.outcomes()?;
        let mut rune_columns = 0;

        for side in Side::BOTH {
            for column in table.slot_columns(side) {
                let Some(runes) = column.runes else { continue };
                rune_columns += 1;
                let cells = column.champions.iter().zip(runes).zip(&outcomes);
                for ((champion, rune), outcome) in cells {
                    if let (Some(champion), Some(rune), Some(team_win)) = (champion, rune, outcome) {
                        self.add_pick(*champion, *rune, side.champion_won(*team_win));
                    }
                }
            }
        }

        if rune_columns == 0 {
            return Err(AppError::MissingData(
                "match table has no rune columns".to_string(),
            ));
        }
        Ok(())
    }

    /// Per champion, runes from most to least picked; ties by rune id.
    pub fn rune_stats(&self) -> BTreeMap<ChampionId, Vec<RuneStats>> {
        self.counts
            .iter()
            .map(|(&champion, runes)| {
                let mut list: Vec<RuneStats> = runes
                    .iter()
                    .map(|(&rune_id, count)| RuneStats {
                        rune_id,
                        games: count.games,
                        winrate: if count.games == 0 {
                            0.0
                        } else {
                            count.wins as f64 / count.games as f64
                        },
                    })
                    .collect();
                list.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.rune_id.cmp(&b.rune_id)));
                (champion, list)
            })
            .collect()
    }
}
