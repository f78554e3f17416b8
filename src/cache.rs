use crate::data::generator::ChampionPool;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_AGE_MINS: u64 = 24 * 60;

/// Champion and keystone ids downloaded from Data Dragon, kept on disk so
/// repeated generator runs do not hit the CDN.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataDragonCache {
    pub version: String,
    pub champions: Vec<u32>,
    pub keystones: Vec<u32>,
    pub fetched_at: DateTime<Utc>,
}

impl DataDragonCache {
    pub fn from_pool(pool: &ChampionPool) -> Self {
        DataDragonCache {
            version: pool.version.clone().unwrap_or_else(|| "unknown".to_string()),
            champions: pool.champions.clone(),
            keystones: pool.keystones.clone(),
            fetched_at: Utc::now(),
        }
    }

    pub fn to_pool(&self) -> ChampionPool {
        ChampionPool::new(
            Some(self.version.clone()),
            self.champions.clone(),
            self.keystones.clone(),
        )
    }

    pub fn get_cache_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".can_i_win")
            .join("ddragon.json")
    }

    /// `Ok(None)` when nothing has been cached yet.
    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| AppError::JsonError(format!("Failed to parse cache: {}", e))),
            Err(_) => Ok(None),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::JsonError(format!("Failed to serialize cache: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn is_stale(&self, max_age_mins: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age.num_minutes() > max_age_mins as i64
    }
}

/// Returns the cached pool when it is fresh (and of the requested version),
/// otherwise calls `fetch` and caches the result. If the download fails, a
/// stale cache entry is still preferred over an error.
pub fn pool_with_cache<F>(
    path: &Path,
    version: Option<&str>,
    refresh: bool,
    fetch: F,
) -> Result<ChampionPool, AppError>
where
    F: FnOnce() -> Result<ChampionPool, AppError>,
{
    let cached = match DataDragonCache::load(path) {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!("Ignoring unreadable Data Dragon cache: {}", e);
            None
        }
    };

    if let Some(cache) = &cached {
        let version_matches = version.map_or(true, |v| v == cache.version);
        if !refresh && version_matches && !cache.is_stale(DEFAULT_MAX_AGE_MINS) {
            tracing::info!("Using cached Data Dragon patch {}", cache.version);
            return Ok(cache.to_pool());
        }
    }

    match fetch() {
        Ok(pool) => {
            if let Err(e) = DataDragonCache::from_pool(&pool).save(path) {
                tracing::warn!("Failed to write Data Dragon cache: {}", e);
            }
            Ok(pool)
        }
        Err(e) => match cached {
            Some(cache) => {
                tracing::warn!("Data Dragon unavailable ({}), using cached patch {}", e, cache.version);
                Ok(cache.to_pool())
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pool(version: &str) -> ChampionPool {
        ChampionPool::new(Some(version.to_string()), vec![1, 2, 3, 4, 5, 6], vec![8005])
    }

    #[test]
    fn test_fetches_then_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddragon.json");

        let first = pool_with_cache(&path, None, false, || Ok(pool("14.1.1"))).unwrap();
        assert_eq!(first.version.as_deref(), Some("14.1.1"));

        let second = pool_with_cache(&path, None, false, || {
            Err(AppError::HttpError("should not be called".to_string()))
        })
        .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_refresh_and_version_change_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddragon.json");
        pool_with_cache(&path, None, false, || Ok(pool("14.1.1"))).unwrap();

        let refreshed = pool_with_cache(&path, None, true, || Ok(pool("14.2.1"))).unwrap();
        assert_eq!(refreshed.version.as_deref(), Some("14.2.1"));

        let pinned = pool_with_cache(&path, Some("13.9.1"), false, || Ok(pool("13.9.1"))).unwrap();
        assert_eq!(pinned.version.as_deref(), Some("13.9.1"));
    }

    #[test]
    fn test_stale_cache_used_when_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddragon.json");

        let mut cache = DataDragonCache::from_pool(&pool("14.1.1"));
        cache.fetched_at = Utc::now() - Duration::days(3);
        assert!(cache.is_stale(DEFAULT_MAX_AGE_MINS));
        cache.save(&path).unwrap();

        let result = pool_with_cache(&path, None, false, || {
            Err(AppError::HttpError("offline".to_string()))
        })
        .unwrap();
        assert_eq!(result.version.as_deref(), Some("14.1.1"));
    }

    #[test]
    fn test_no_cache_and_fetch_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddragon.json");
        let result = pool_with_cache(&path, None, false, || {
            Err(AppError::HttpError("offline".to_string()))
        });
        assert!(matches!(result, Err(AppError::HttpError(_))));
    }
}
