use can_i_win::analysis::engine::Aggregator;
use can_i_win::analysis::store::StatsStore;
use can_i_win::config::Config;
use can_i_win::data::generator::{generate, ChampionPool, GeneratorOptions};
use can_i_win::data::table::{MatchRecord, MatchTable, Side};
use can_i_win::error::AppError;
use std::collections::HashMap;
use std::fs;

fn synthetic_table(matches: usize) -> MatchTable {
    let options = GeneratorOptions {
        matches,
        ..GeneratorOptions::default()
    };
    let records = generate(&options, &ChampionPool::builtin()).unwrap();
    MatchTable::from_records(&records).unwrap()
}

#[test]
fn test_single_match_end_to_end() {
    let record = MatchRecord::new(&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10], true).unwrap();
    let table = MatchTable::from_records(&[record]).unwrap();
    let report = Aggregator::default().run(&table);

    assert_eq!(report.champions.len(), 10);
    for stats in &report.champions {
        assert_eq!(stats.games, 1);
        if stats.champion_id <= 5 {
            assert_eq!(stats.wins, 1);
            assert_eq!(stats.win_rate(), 1.0);
        } else {
            assert_eq!(stats.wins, 0);
            assert_eq!(stats.win_rate(), 0.0);
        }
    }
    // One game per pair is far below the counter threshold.
    assert!(report.counters.values().all(|c| c.counters.is_empty()));
}

#[test]
fn test_aggregation_is_idempotent() {
    let table = synthetic_table(2_000);
    let aggregator = Aggregator::default();
    let first = aggregator.run(&table);
    let second = aggregator.run(&table);

    assert_eq!(first.champions, second.champions);
    assert_eq!(first.counters, second.counters);
    assert_eq!(first.runes, second.runes);
}

#[test]
fn test_row_order_does_not_change_results() {
    let options = GeneratorOptions {
        matches: 1_500,
        ..GeneratorOptions::default()
    };
    let mut records = generate(&options, &ChampionPool::builtin()).unwrap();
    let forward = Aggregator::default().run(&MatchTable::from_records(&records).unwrap());
    records.reverse();
    let backward = Aggregator::default().run(&MatchTable::from_records(&records).unwrap());

    assert_eq!(forward.champions, backward.champions);
    assert_eq!(forward.counters, backward.counters);
    assert_eq!(forward.runes, backward.runes);
}

#[test]
fn test_counters_respect_threshold() {
    // A small pool so plenty of pairs clear the threshold.
    let pool = ChampionPool::new(None, (1..=20).collect(), vec![8005, 8010]);
    let options = GeneratorOptions {
        matches: 3_000,
        ..GeneratorOptions::default()
    };
    let table = MatchTable::from_records(&generate(&options, &pool).unwrap()).unwrap();
    let report = Aggregator::new(10, 10).run(&table);

    let mut reported = 0;
    for list in report.counters.values() {
        assert!(list.counters.len() <= 10);
        for counter in &list.counters {
            assert!(counter.games >= 10);
            assert!((0.0..=1.0).contains(&counter.winrate));
        }
        for pair in list.counters.windows(2) {
            assert!(pair[0].winrate <= pair[1].winrate);
        }
        reported += list.counters.len();
    }
    assert!(reported > 0);
}

#[test]
fn test_enemy_games_match_raw_table() {
    let table = synthetic_table(1_000);
    let report = Aggregator::default().run(&table);

    let mut as_enemy: HashMap<u32, u64> = HashMap::new();
    for column in table.slot_columns(Side::Enemy) {
        for champion in column.champions.iter().flatten() {
            *as_enemy.entry(*champion).or_default() += 1;
        }
    }

    let summed: u64 = report.champions.iter().map(|s| s.enemy_games).sum();
    assert_eq!(summed, 5 * 1_000);
    for stats in &report.champions {
        assert_eq!(
            stats.enemy_games,
            as_enemy.get(&stats.champion_id).copied().unwrap_or(0)
        );
        assert_eq!(stats.games, stats.ally_games + stats.enemy_games);
        assert!((0.0..=1.0).contains(&stats.win_rate()));
    }
}

#[test]
fn test_counts_never_decrease_as_matches_are_added() {
    let options = GeneratorOptions {
        matches: 600,
        ..GeneratorOptions::default()
    };
    let records = generate(&options, &ChampionPool::builtin()).unwrap();
    let partial = Aggregator::default().run(&MatchTable::from_records(&records[..300]).unwrap());
    let full = Aggregator::default().run(&MatchTable::from_records(&records).unwrap());

    let full_games: HashMap<u32, (u64, u64)> = full
        .champions
        .iter()
        .map(|s| (s.champion_id, (s.games, s.wins)))
        .collect();
    for stats in &partial.champions {
        let (games, wins) = full_games[&stats.champion_id];
        assert!(games >= stats.games);
        assert!(wins >= stats.wins);
    }
}

#[test]
fn test_process_writes_files_readable_by_store() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw/matches_raw.csv");
    synthetic_table(2_000).write_csv(&raw).unwrap();

    let config = Config {
        raw_matches_path: raw,
        processed_dir: dir.path().join("processed"),
        ..Config::default()
    };
    let (report, files) = Aggregator::from_config(&config).process(&config).unwrap();
    assert!(report.skipped.is_empty());
    assert!(files.champion_stats.exists());

    let store = StatsStore::open(&config.processed_dir);
    let top = store.top_champions(30).unwrap();
    assert_eq!(top.len(), 30);
    for pair in top.windows(2) {
        assert!(pair[0].games >= pair[1].games);
    }

    let champion = top[0].champion_id;
    let expected = &report.counters[&champion].counters;
    assert_eq!(&store.counters_for(champion).unwrap(), expected);
    assert_eq!(&store.runes_for(champion).unwrap(), &report.runes[&champion]);
}

#[test]
fn test_process_without_rune_columns_still_writes_other_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("matches.csv");
    let options = GeneratorOptions {
        matches: 500,
        with_runes: false,
        ..GeneratorOptions::default()
    };
    let records = generate(&options, &ChampionPool::builtin()).unwrap();
    MatchTable::from_records(&records).unwrap().write_csv(&raw).unwrap();

    let config = Config {
        raw_matches_path: raw,
        processed_dir: dir.path().join("out"),
        ..Config::default()
    };
    let (report, files) = Aggregator::from_config(&config).process(&config).unwrap();

    assert!(!report.champions.is_empty());
    assert!(report.runes.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(fs::read_to_string(files.runes).unwrap().trim(), "{}");
}

#[test]
fn test_process_missing_raw_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        raw_matches_path: dir.path().join("nope.csv"),
        processed_dir: dir.path().join("out"),
        ..Config::default()
    };
    let err = Aggregator::default().process(&config).unwrap_err();
    assert!(err.is_missing_data());
}

#[test]
fn test_zero_ids_never_reach_the_statistics() {
    let mut table = MatchTable::new();
    table
        .insert_column("team_champ1", vec![Some(0), Some(1)])
        .unwrap();
    table
        .insert_column("team_champ2", vec![Some(1), Some(3)])
        .unwrap();
    table
        .insert_column("enemy_champ1", vec![Some(2), Some(0)])
        .unwrap();
    table
        .insert_column("enemy_champ2", vec![Some(3), Some(2)])
        .unwrap();
    table
        .insert_column("team_win", vec![Some(1), Some(0)])
        .unwrap();
    let in_memory = Aggregator::default().run(&table);

    let ids: Vec<u32> = in_memory.champions.iter().map(|s| s.champion_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let mut buf = Vec::new();
    table.to_writer(&mut buf).unwrap();
    let from_csv = Aggregator::default().run(&MatchTable::from_reader(buf.as_slice()).unwrap());
    assert_eq!(in_memory.champions, from_csv.champions);
    assert_eq!(in_memory.counters, from_csv.counters);
}

#[test]
fn test_records_breaking_roster_rules_are_rejected() {
    assert!(matches!(
        MatchRecord::new(&[0, 1], &[2], true),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        MatchRecord::new(&[1, 2, 3, 4, 5, 6], &[7], true),
        Err(AppError::InvalidInput(_))
    ));

    let mut record = MatchRecord::new(&[1, 2, 3, 4, 5], &[7], true).unwrap();
    record.team.push(record.team[0]);
    assert!(matches!(
        MatchTable::from_records(&[record]),
        Err(AppError::InvalidInput(_))
    ));
}
