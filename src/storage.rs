use chrono::Local;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::Snapshot;

const CACHE_FILE_VERSION: u32 = 1;
const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login: None,
            dark_mode: default_dark_mode(),
            output: None,
            wallpaper_command: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheFile {
    pub version: u32,
    pub snapshot: Snapshot,
}

/// All on-disk state lives under one base directory.
#[derive(Debug, Clone)]
pub struct Storage {
    base: PathBuf,
}

impl Storage {
    pub fn new() -> Option<Self> {
        dirs::home_dir().map(|base| Self { base })
    }

    pub fn at(base: PathBuf) -> Self {
        Self { base }
    }

    fn config_path(&self) -> PathBuf {
        self.base.join(".streakwall.json")
    }

    fn token_path(&self) -> PathBuf {
        self.base.join(".streakwall-token")
    }

    fn cache_path(&self) -> PathBuf {
        self.base.join(".streakwall-cache.json")
    }

    pub fn read_config(&self) -> Config {
        fs::read_to_string(self.config_path())
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    pub fn write_config(&self, config: &Config) -> Result<(), io::Error> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        fs::write(self.config_path(), json)
    }

    /// A GITHUB_TOKEN in the environment takes precedence over the token file.
    pub fn read_token(&self) -> Option<String> {
        if let Ok(value) = env::var(TOKEN_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        self.token_from_file()
    }

    fn token_from_file(&self) -> Option<String> {
        fs::read_to_string(self.token_path())
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn write_token(&self, token: &str) -> Result<(), io::Error> {
        fs::write(self.token_path(), token)
    }

    pub fn read_snapshot(&self) -> Option<Snapshot> {
        let contents = fs::read_to_string(self.cache_path()).ok()?;
        let cache: CacheFile = serde_json::from_str(&contents).ok()?;
        if cache.version != CACHE_FILE_VERSION {
            return None;
        }
        Some(cache.snapshot)
    }

    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), io::Error> {
        let cache = CacheFile {
            version: CACHE_FILE_VERSION,
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&cache)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        fs::write(self.cache_path(), json)
    }
}

pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

const fn default_dark_mode() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContributionDay, Week};
    use tempfile::tempdir;

    fn snapshot() -> Snapshot {
        Snapshot {
            login: "octocat".to_string(),
            total: 99,
            weeks: vec![Week {
                days: vec![ContributionDay {
                    date: "2026-08-22".to_string(),
                    count: 2,
                    level: 1,
                }],
            }],
            current_streak: 1,
            longest_streak: 4,
            today_count: 2,
            fetched_at: 1_766_000_000_000,
        }
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        let config = storage.read_config();
        assert_eq!(config.login, None);
        assert!(!config.dark_mode);
    }

    #[test]
    fn first_run_starts_in_light_mode() {
        assert!(!Config::default().dark_mode);
    }

    #[test]
    fn config_round_trips() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        let config = Config {
            login: Some("octocat".to_string()),
            dark_mode: true,
            output: Some(PathBuf::from("/tmp/wall.png")),
            wallpaper_command: Some("feh --bg-fill {path}".to_string()),
        };
        storage.write_config(&config).unwrap();
        let back = storage.read_config();
        assert_eq!(back.login.as_deref(), Some("octocat"));
        assert!(back.dark_mode);
        assert_eq!(back.output, Some(PathBuf::from("/tmp/wall.png")));
        assert_eq!(back.wallpaper_command.as_deref(), Some("feh --bg-fill {path}"));
    }

    #[test]
    fn corrupt_config_yields_defaults() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        fs::write(dir.path().join(".streakwall.json"), "{not json").unwrap();
        let config = storage.read_config();
        assert_eq!(config.login, None);
        assert!(!config.dark_mode);
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        let original = snapshot();
        storage.write_snapshot(&original).unwrap();
        assert_eq!(storage.read_snapshot(), Some(original));
    }

    #[test]
    fn cache_version_mismatch_is_discarded() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        let cache = CacheFile {
            version: 99,
            snapshot: snapshot(),
        };
        let json = serde_json::to_string(&cache).unwrap();
        fs::write(dir.path().join(".streakwall-cache.json"), json).unwrap();
        assert_eq!(storage.read_snapshot(), None);
    }

    #[test]
    fn missing_cache_reads_as_none() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        assert_eq!(storage.read_snapshot(), None);
    }

    #[test]
    fn token_file_is_trimmed() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        storage.write_token("ghp_abc123\n").unwrap();
        assert_eq!(storage.token_from_file().as_deref(), Some("ghp_abc123"));
    }

    #[test]
    fn blank_token_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path().to_path_buf());
        storage.write_token("  \n").unwrap();
        assert_eq!(storage.token_from_file(), None);
    }
}
