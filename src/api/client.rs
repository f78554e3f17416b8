use crate::data::generator::ChampionPool;
use crate::error::AppError;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

use super::endpoints;
use super::models::*;

const USER_AGENT: &str = concat!("can_i_win/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;

/// Static game data from Riot's Data Dragon CDN. No API key needed.
pub struct DataDragonClient {
    timeout: Duration,
}

impl Default for DataDragonClient {
    fn default() -> Self {
        DataDragonClient::new()
    }
}

impl DataDragonClient {
    pub fn new() -> Self {
        DataDragonClient {
            timeout: Duration::from_secs(10),
        }
    }

    fn execute_request(&self, url: &str) -> Result<String, AppError> {
        let mut retry_count = 0;

        loop {
            let response = ureq::get(url)
                .set("User-Agent", USER_AGENT)
                .timeout(self.timeout)
                .call();

            match response {
                Ok(resp) => {
                    return resp
                        .into_string()
                        .map_err(|e| AppError::HttpError(e.to_string()));
                }
                Err(ureq::Error::Status(429, _)) => {
                    if retry_count >= MAX_RETRIES {
                        return Err(AppError::HttpError(format!(
                            "rate limited by {} after {} retries",
                            url, MAX_RETRIES
                        )));
                    }
                    let wait_ms = 2000 * (retry_count + 1) as u64;
                    tracing::warn!("Rate limited, waiting {}ms before retry...", wait_ms);
                    thread::sleep(Duration::from_millis(wait_ms));
                    retry_count += 1;
                }
                Err(e) => {
                    return Err(AppError::HttpError(e.to_string()));
                }
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let body = self.execute_request(url)?;
        serde_json::from_str(&body).map_err(|e| AppError::JsonError(format!("{}: {}", url, e)))
    }

    pub fn get_latest_version(&self) -> Result<String, AppError> {
        let versions: Vec<String> = self.get_json(endpoints::VERSIONS_ENDPOINT)?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonError("Data Dragon returned no versions".to_string()))
    }

    pub fn get_champion_ids(&self, version: &str) -> Result<Vec<u32>, AppError> {
        let champions: DataDragonChampions = self.get_json(&endpoints::champions_url(version))?;
        Ok(champions.champion_ids())
    }

    pub fn get_keystone_ids(&self, version: &str) -> Result<Vec<u32>, AppError> {
        let trees: Vec<RuneTree> = self.get_json(&endpoints::runes_url(version))?;
        Ok(keystone_ids(&trees))
    }

    /// Champions and keystones of `version`, or of the latest patch.
    pub fn fetch_pool(&self, version: Option<&str>) -> Result<ChampionPool, AppError> {
        let version = match version {
            Some(v) => v.to_string(),
            None => self.get_latest_version()?,
        };
        tracing::info!("Downloading champions and runes for patch {}", version);

        let champions = self.get_champion_ids(&version)?;
        let keystones = self.get_keystone_ids(&version)?;
        tracing::info!(
            "Data Dragon {}: {} champions, {} keystones",
            version,
            champions.len(),
            keystones.len()
        );

        Ok(ChampionPool::new(Some(version), champions, keystones))
    }
}
