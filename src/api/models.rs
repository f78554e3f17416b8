use serde::Deserialize;
use std::collections::HashMap;

// Data Dragon champion.json
#[derive(Debug, Deserialize)]
pub struct DataDragonChampions {
    pub data: HashMap<String, ChampionInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChampionInfo {
    pub id: String,
    pub name: String,
    /// Numeric champion id, as a string.
    pub key: String,
}

// Data Dragon runesReforged.json: one entry per rune tree
#[derive(Debug, Deserialize, Clone)]
pub struct RuneTree {
    pub id: u32,
    pub key: String,
    #[serde(default)]
    pub slots: Vec<RuneSlot>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuneSlot {
    pub runes: Vec<RuneInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuneInfo {
    pub id: u32,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

impl DataDragonChampions {
    /// Numeric champion ids, ascending. Entries with a non-numeric key are skipped.
    pub fn champion_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .data
            .values()
            .filter_map(|c| c.key.parse::<u32>().ok())
            .filter(|&id| id > 0)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Keystones are the runes in the first slot of each tree.
pub fn keystone_ids(trees: &[RuneTree]) -> Vec<u32> {
    trees
        .iter()
        .filter_map(|tree| tree.slots.first())
        .flat_map(|slot| slot.runes.iter().map(|r| r.id))
        .collect()
}
