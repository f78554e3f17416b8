use anyhow::Context;
use can_i_win::analysis::engine::Aggregator;
use can_i_win::analysis::store::{StatsStore, DEFAULT_TOP_CHAMPIONS};
use can_i_win::api::client::DataDragonClient;
use can_i_win::cache::{self, DataDragonCache};
use can_i_win::config::Config;
use can_i_win::data::generator::{self, ChampionPool, GeneratorOptions};
use can_i_win::data::table::MatchTable;
use can_i_win::display::output::{
    display_aggregation, display_champion_stats, display_counters, display_error, display_info,
    display_prediction, display_runes, display_success, display_training_report,
};
use can_i_win::model::classifier::TrainConfig;
use can_i_win::model::features::{Encoding, Selection, DEFAULT_POSITIONAL_BOUND};
use can_i_win::model::service::WinrateModelService;
use can_i_win::model::training::{self, TrainingOptions};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Can I Win")]
#[command(about = "Predict team composition win rates and browse champion statistics", long_about = None)]
struct Args {
    /// Log filter (overrides LOG_LEVEL), e.g. "debug" or "can_i_win=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic raw match table
    Generate {
        /// Number of matches to generate
        #[arg(short, long, default_value = "100000")]
        matches: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Leave rune columns out
        #[arg(long)]
        no_runes: bool,

        /// Use champion and keystone ids from Riot Data Dragon instead of the built-in pool
        #[arg(long)]
        ddragon: bool,

        /// Data Dragon patch (default: latest)
        #[arg(long, requires = "ddragon")]
        patch: Option<String>,

        /// Ignore the cached Data Dragon ids
        #[arg(long, requires = "ddragon")]
        refresh: bool,

        /// Output CSV (default: RAW_MATCHES_PATH)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute champion, counter and rune statistics from the raw table
    Process {
        /// Raw match CSV (default: RAW_MATCHES_PATH)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (default: PROCESSED_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Minimum games for a matchup to count as a counter
        #[arg(long)]
        min_games: Option<u32>,

        /// Counters kept per champion
        #[arg(long)]
        top: Option<usize>,
    },

    /// Train the winrate model on the raw table
    Train {
        /// Raw match CSV (default: RAW_MATCHES_PATH)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the model (default: MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Feature encoding
        #[arg(long, value_enum, default_value = "padded")]
        encoding: EncodingArg,

        /// Highest champion id + 1 for the positional encoding; the encoded
        /// table takes matches * bound * 8 bytes of memory
        #[arg(long, default_value_t = DEFAULT_POSITIONAL_BOUND)]
        bound: usize,

        /// Share of matches held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Gradient descent epochs
        #[arg(long, default_value = "1000")]
        epochs: usize,

        /// Gradient descent learning rate
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,
    },

    /// Predict the win probability of a composition
    Predict {
        /// Ally champion ids, comma separated (1-5)
        #[arg(short, long, value_delimiter = ',', required = true)]
        team: Vec<u32>,

        /// Enemy champion ids, comma separated (1-5)
        #[arg(short, long, value_delimiter = ',', required = true)]
        enemy: Vec<u32>,

        /// Model file (default: MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Fail instead of falling back to a placeholder model
        #[arg(long)]
        no_placeholder: bool,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Most played champions
    Champions {
        /// Number of champions to show
        #[arg(short, long, default_value_t = DEFAULT_TOP_CHAMPIONS)]
        top: usize,
    },

    /// Worst matchups of a champion
    Counters {
        /// Champion id
        champion: u32,
    },

    /// Most picked runes of a champion
    Runes {
        /// Champion id
        champion: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    Padded,
    Positional,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level);

    match args.command {
        Command::Generate {
            matches,
            seed,
            no_runes,
            ddragon,
            patch,
            refresh,
            output,
        } => {
            let pool = if ddragon {
                display_info("Fetching champion and keystone ids from Data Dragon...");
                let client = DataDragonClient::new();
                cache::pool_with_cache(
                    &DataDragonCache::get_cache_path(),
                    patch.as_deref(),
                    refresh,
                    || client.fetch_pool(patch.as_deref()),
                )?
            } else {
                ChampionPool::builtin()
            };
            display_info(&format!(
                "Pool: {} champions, {} keystones{}",
                pool.champions.len(),
                pool.keystones.len(),
                pool.version
                    .as_deref()
                    .map(|v| format!(" (patch {})", v))
                    .unwrap_or_default()
            ));

            let options = GeneratorOptions {
                matches,
                seed,
                with_runes: !no_runes,
            };
            let pb = spinner("Generating matches");
            let records = generator::generate(&options, &pool)?;
            pb.finish_and_clear();

            let output = output.unwrap_or_else(|| config.raw_matches_path.clone());
            MatchTable::from_records(&records)?
                .write_csv(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            display_success(&format!("{} matches written to {}", records.len(), output.display()));
        }

        Command::Process {
            input,
            output_dir,
            min_games,
            top,
        } => {
            if let Some(input) = input {
                config.raw_matches_path = input;
            }
            if let Some(dir) = output_dir {
                config.processed_dir = dir;
            }
            if let Some(min_games) = min_games {
                config.min_counter_games = min_games;
            }
            if let Some(top) = top {
                config.top_counters = top;
            }

            display_info(&format!("Reading {}", config.raw_matches_path.display()));
            let pb = spinner("Aggregating statistics");
            let result = Aggregator::from_config(&config).process(&config);
            pb.finish_and_clear();
            let (report, files) = result?;
            display_aggregation(&report, &files);
        }

        Command::Train {
            input,
            model,
            encoding,
            bound,
            test_size,
            epochs,
            learning_rate,
        } => {
            let input = input.unwrap_or_else(|| config.raw_matches_path.clone());
            let model_path = model.unwrap_or_else(|| config.model_path.clone());

            let encoding = match encoding {
                EncodingArg::Padded => Encoding::Padded,
                EncodingArg::Positional => Encoding::Positional { bound },
            };
            let options = TrainingOptions {
                encoding,
                test_size,
                train: TrainConfig {
                    learning_rate,
                    max_epochs: epochs,
                    ..TrainConfig::default()
                },
                ..TrainingOptions::default()
            };

            display_info(&format!("Reading {}", input.display()));
            let table = MatchTable::read_csv(&input)?;

            let pb = spinner("Training model");
            let result = training::train(&table, &options);
            pb.finish_and_clear();
            let (artifact, report) = result?;

            display_training_report(&report);
            artifact
                .save(&model_path)
                .with_context(|| format!("saving model to {}", model_path.display()))?;
            display_success(&format!("Model saved to {}", model_path.display()));
        }

        Command::Predict {
            team,
            enemy,
            model,
            no_placeholder,
            json,
        } => {
            if let Some(model) = model {
                config.model_path = model;
            }
            if no_placeholder {
                config.allow_placeholder_model = false;
            }

            let selection = Selection::new(team, enemy)?;
            let service = WinrateModelService::load(&config)?;
            let prediction = service.predict(&selection);

            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                display_prediction(&selection, &prediction);
            }
        }

        Command::Champions { top } => {
            let store = StatsStore::open(&config.processed_dir);
            display_champion_stats(&store.top_champions(top)?);
        }

        Command::Counters { champion } => {
            let store = StatsStore::open(&config.processed_dir);
            let counters = store.counters_for(champion)?;
            display_counters(champion, &counters, config.min_counter_games);
        }

        Command::Runes { champion } => {
            let store = StatsStore::open(&config.processed_dir);
            display_runes(champion, &store.runes_for(champion)?);
        }
    }

    Ok(())
}
