//! Provider configuration.
//!
//! Stored as JSON, by default in the platform config directory:
//! `~/.config/course-provider/config.json` on Linux.

use course_core::{CalcMethod, DEFAULT_STALE_THRESHOLD};
use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "signalk", "course-provider")
}

/// Config file location in the platform config directory, or the
/// working directory when no home directory can be determined
pub fn default_config_path() -> PathBuf {
    match get_project_dirs() {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    }
}

/// Which notifications are raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Raise `notifications.navigation.arrivalCircleEntered`
    pub arrival_circle: bool,
    /// Raise `notifications.navigation.perpendicularPassed`
    pub perpendicular_passed: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            arrival_circle: true,
            perpendicular_passed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseConfig {
    /// Branch published under `navigation.course.calcValues`
    pub calc_method: CalcMethod,
    /// Stale snapshots before a lost destination is published as cleared
    pub stale_threshold: u32,
    pub notifications: NotificationSettings,
}

impl Default for CourseConfig {
    fn default() -> Self {
        CourseConfig {
            calc_method: CalcMethod::GreatCircle,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            notifications: NotificationSettings::default(),
        }
    }
}

impl CourseConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(CourseConfig::default());
        }

        let file = fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ConfigError::Parse {
                path: path.to_owned(),
                source,
            }
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Like [`load`](Self::load), but writes the defaults out when the file
    /// does not exist yet so there is a file to edit. Failing to write is
    /// only a warning.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }

        let config = CourseConfig::default();
        match config.save(path) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("{}", e),
        }
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_owned(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }

        let file = fs::File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_error)?;
        writer.flush().map_err(io_error)?;
        Ok(())
    }
}
