// Host Configuration - Runner settings read from the environment
// A `.env` file in the working directory is honored when present.

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::ConfigError;

pub const DATA_DIR_KEY: &str = "ORRERY_DATA_DIR";
pub const CONFIG_KEY: &str = "ORRERY_CONFIG";
pub const EXTRA_DIRS_KEY: &str = "ORRERY_EXTRA_DIRS";
pub const START_TIME_KEY: &str = "ORRERY_START_TIME";
pub const VIEWPORT_KEY: &str = "ORRERY_VIEWPORT";
pub const FRAMES_KEY: &str = "ORRERY_FRAMES";
pub const SELECT_KEY: &str = "ORRERY_SELECT";

pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);
pub const DEFAULT_FRAMES: u64 = 120;

/// Settings for one run of the host. Every field has a usable default.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Resource root handed to `chdir`.
    pub data_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub extra_dirs: Vec<PathBuf>,
    /// Simulation start; `None` means now.
    pub start_time: Option<DateTime<Utc>>,
    pub viewport: (u32, u32),
    pub frames: u64,
    /// Object to select once the clock is running.
    pub select: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            config_path: None,
            extra_dirs: Vec::new(),
            start_time: None,
            viewport: DEFAULT_VIEWPORT,
            frames: DEFAULT_FRAMES,
            select: None,
        }
    }
}

impl HostConfig {
    /// Load `.env` (if any), then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            data_dir: get(DATA_DIR_KEY).map(PathBuf::from),
            config_path: get(CONFIG_KEY).map(PathBuf::from),
            extra_dirs: get(EXTRA_DIRS_KEY)
                .map(|value| env::split_paths(&value).collect())
                .unwrap_or_default(),
            select: get(SELECT_KEY),
            ..Self::default()
        };

        if let Some(value) = get(START_TIME_KEY) {
            config.start_time = Some(parse_start_time(START_TIME_KEY, &value)?);
        }
        if let Some(value) = get(VIEWPORT_KEY) {
            config.viewport = parse_viewport(VIEWPORT_KEY, &value)?;
        }
        if let Some(value) = get(FRAMES_KEY) {
            config.frames = value.parse().map_err(|_| ConfigError::InvalidNumber {
                key: FRAMES_KEY,
                value: value.clone(),
            })?;
        }

        Ok(config)
    }
}

fn parse_start_time(key: &'static str, value: &str) -> Result<DateTime<Utc>, ConfigError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| ConfigError::InvalidTimestamp {
            key,
            value: value.to_string(),
            source,
        })
}

/// `"1920x1080"` (or `X`) to `(1920, 1080)`. Zero sizes are rejected.
fn parse_viewport(key: &'static str, value: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidViewport {
        key,
        value: value.to_string(),
    };
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
