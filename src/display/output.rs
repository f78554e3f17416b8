use crate::analysis::champion_stats::ChampionStatsRow;
use crate::analysis::counters::Counter;
use crate::analysis::engine::{AggregationReport, ProcessedFiles};
use crate::analysis::runes::RuneStats;
use crate::model::features::Selection;
use crate::model::service::Prediction;
use crate::model::training::TrainingReport;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ChampionRow {
    rank: String,
    champion: String,
    games: String,
    wins: String,
    win_rate: String,
}

#[derive(Tabled)]
struct CounterRow {
    rank: String,
    enemy: String,
    games: String,
    win_rate: String,
}

#[derive(Tabled)]
struct RuneRow {
    rank: String,
    rune: String,
    games: String,
    win_rate: String,
}

#[derive(Tabled)]
struct ClassRow {
    class: String,
    precision: String,
    recall: String,
    f1: String,
    support: String,
}

fn colored_rate(rate: f64) -> String {
    let text = format!("{:.1}%", rate * 100.0);
    if rate >= 0.55 {
        text.green().to_string()
    } else if rate <= 0.45 {
        text.red().to_string()
    } else {
        text
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn display_prediction(selection: &Selection, prediction: &Prediction) {
    let join = |ids: &[u32]| {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("\n{}", "🎮 Can I win with these monkeys?".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!("{} {}", "Your team: ".bold(), join(selection.team()));
    println!("{} {}", "Enemy team:".bold(), join(selection.enemy()));
    println!(
        "\n{} {}\n",
        "Win probability:".bold(),
        colored_rate(prediction.winrate).bold()
    );

    if prediction.is_placeholder() {
        println!(
            "{} {}",
            "⚠️".yellow(),
            "Placeholder model (random data): train one with `can-i-win train`".yellow()
        );
        println!();
    }
}

pub fn display_champion_stats(rows: &[ChampionStatsRow]) {
    println!("\n{}", format!("📊 Most Played Champions (Top {})", rows.len()).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if rows.is_empty() {
        println!("{}", "No champion statistics available".yellow());
        return;
    }

    let rows: Vec<ChampionRow> = rows
        .iter()
        .enumerate()
        .map(|(idx, s)| ChampionRow {
            rank: format!("#{}", idx + 1),
            champion: s.champion_id.to_string(),
            games: s.games.to_string(),
            wins: s.wins.to_string(),
            win_rate: colored_rate(s.winrate),
        })
        .collect();
    print_table(rows);
    println!();
}

pub fn display_counters(champion: u32, counters: &[Counter], min_games: u32) {
    println!("\n{}", format!("⚔️  Counters for champion {}", champion).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if counters.is_empty() {
        println!(
            "{}",
            format!("No matchups with at least {} games", min_games).yellow()
        );
        return;
    }

    let rows: Vec<CounterRow> = counters
        .iter()
        .enumerate()
        .map(|(idx, c)| CounterRow {
            rank: format!("#{}", idx + 1),
            enemy: c.enemy_id.to_string(),
            games: c.games.to_string(),
            win_rate: colored_rate(c.winrate),
        })
        .collect();
    print_table(rows);

    println!("\n{}", "Interpretation".bold().yellow());
    println!("• Win Rate: champion {}'s win rate when facing this enemy", champion);
    println!("• Worst matchups first\n");
}

pub fn display_runes(champion: u32, runes: &[RuneStats]) {
    println!("\n{}", format!("🔮 Runes for champion {}", champion).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    if runes.is_empty() {
        println!("{}", "No rune statistics for this champion".yellow());
        return;
    }

    let rows: Vec<RuneRow> = runes
        .iter()
        .enumerate()
        .map(|(idx, r)| RuneRow {
            rank: format!("#{}", idx + 1),
            rune: r.rune_id.to_string(),
            games: r.games.to_string(),
            win_rate: colored_rate(r.winrate),
        })
        .collect();
    print_table(rows);
    println!();
}

pub fn display_aggregation(report: &AggregationReport, files: &ProcessedFiles) {
    println!("\n{}", format!("📈 Processed {} matches", report.matches).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!("• {} champions", report.champions.len());
    println!(
        "• {} champions with reportable counters",
        report.counters.values().filter(|c| !c.counters.is_empty()).count()
    );
    println!("• {} champions with rune statistics", report.runes.len());

    for skipped in &report.skipped {
        println!(
            "{} {} skipped: {}",
            "⚠️".yellow(),
            skipped.statistic.yellow(),
            skipped.reason
        );
    }

    println!();
    display_success(&format!("Champion stats: {}", files.champion_stats.display()));
    display_success(&format!("Counters:       {}", files.counters.display()));
    display_success(&format!("Runes:          {}", files.runes.display()));
    println!();
}

pub fn display_training_report(report: &TrainingReport) {
    println!("\n{}", "🧠 Training Report".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!(
        "Total samples: {}, features: {} ({} encoding)",
        report.samples, report.features, report.encoding
    );
    if report.skipped_rows > 0 {
        println!("{}", format!("Skipped rows: {}", report.skipped_rows).yellow());
    }
    println!("Accuracy train: {:.3}", report.train_accuracy);
    println!("Accuracy test:  {:.3}", report.test_accuracy);

    println!("\n{}", "Classification report".bold().yellow());
    let rows: Vec<ClassRow> = report
        .confusion
        .class_metrics()
        .iter()
        .map(|m| ClassRow {
            class: m.label.to_string(),
            precision: format!("{:.2}", m.precision),
            recall: format!("{:.2}", m.recall),
            f1: format!("{:.2}", m.f1),
            support: m.support.to_string(),
        })
        .collect();
    print_table(rows);

    let c = &report.confusion;
    println!("\n{}", "Confusion matrix".bold().yellow());
    println!("              pred loss  pred win");
    println!("actual loss   {:>9}  {:>8}", c.tn, c.fp);
    println!("actual win    {:>9}  {:>8}\n", c.fn_, c.tp);
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
