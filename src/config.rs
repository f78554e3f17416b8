use crate::error::AppError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/winrate_model.json";
pub const DEFAULT_RAW_MATCHES_PATH: &str = "data/raw/matches_raw.csv";
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";

/// Settings shared by every command. Built once at startup and handed to
/// each component; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub raw_matches_path: PathBuf,
    pub processed_dir: PathBuf,
    pub allow_placeholder_model: bool,
    pub log_level: String,
    pub min_counter_games: u32,
    pub top_counters: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            raw_matches_path: PathBuf::from(DEFAULT_RAW_MATCHES_PATH),
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            allow_placeholder_model: true,
            log_level: "info".to_string(),
            min_counter_games: 10,
            top_counters: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let raw_matches_path = lookup("RAW_MATCHES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.raw_matches_path);
        let processed_dir = lookup("PROCESSED_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.processed_dir);
        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        let allow_placeholder_model = match lookup("ALLOW_PLACEHOLDER_MODEL") {
            Some(value) => parse_bool("ALLOW_PLACEHOLDER_MODEL", &value)?,
            None => defaults.allow_placeholder_model,
        };

        let min_counter_games = match lookup("MIN_COUNTER_GAMES") {
            Some(value) => value.trim().parse::<u32>().map_err(|_| {
                AppError::ConfigError(format!("MIN_COUNTER_GAMES must be an integer, got '{}'", value))
            })?,
            None => defaults.min_counter_games,
        };

        let top_counters = match lookup("TOP_COUNTERS") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                AppError::ConfigError(format!("TOP_COUNTERS must be an integer, got '{}'", value))
            })?,
            None => defaults.top_counters,
        };

        Ok(Config {
            model_path,
            raw_matches_path,
            processed_dir,
            allow_placeholder_model,
            log_level,
            min_counter_games,
            top_counters,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(config.allow_placeholder_model);
        assert_eq!(config.min_counter_games, 10);
        assert_eq!(config.top_counters, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MODEL_PATH", "/tmp/model.json"),
            ("ALLOW_PLACEHOLDER_MODEL", "false"),
            ("MIN_COUNTER_GAMES", "25"),
        ])
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("/tmp/model.json"));
        assert!(!config.allow_placeholder_model);
        assert_eq!(config.min_counter_games, 25);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = config_from(&[("ALLOW_PLACEHOLDER_MODEL", "maybe")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = config_from(&[("TOP_COUNTERS", "ten")]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
