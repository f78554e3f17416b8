pub mod champion_stats;
pub mod counters;
pub mod engine;
pub mod runes;
pub mod store;

pub const CHAMPION_STATS_FILE: &str = "stats_per_champion.csv";
pub const COUNTERS_FILE: &str = "counters.json";
pub const RUNES_FILE: &str = "runes.json";

pub use champion_stats::{ChampionStats, ChampionStatsRow, ChampionStatsTracker};
pub use counters::{Counter, CounterList, MatchupTracker};
pub use engine::{AggregationReport, Aggregator, ProcessedFiles};
pub use runes::{RuneStats, RuneStatsTracker};
pub use store::StatsStore;
