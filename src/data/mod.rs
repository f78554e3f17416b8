pub mod generator;
pub mod table;

pub use generator::{generate, ChampionPool, GeneratorOptions};
pub use table::{ChampionId, MatchRecord, MatchTable, RuneId, Side, Slot, MAX_ROSTER_SIZE};
