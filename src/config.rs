// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::model::Cell;
use crate::physics::operations::mapping::{
    MapOptions, MatchPolicy, DEFAULT_REPLICATION_RADIUS, DEFAULT_TOLERANCE,
};

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Matching distance in Angstrom
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default = "default_radius")]
    pub replication_radius: u32,

    #[serde(default)]
    pub policy: MatchPolicy,

    /// Write PNG plots from `fit`
    #[serde(default = "default_true")]
    pub fit_plots: bool,

    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_radius() -> u32 {
    DEFAULT_REPLICATION_RADIUS
}

fn default_true() -> bool {
    true
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            replication_radius: DEFAULT_REPLICATION_RADIUS,
            policy: MatchPolicy::Nearest,
            fit_plots: true,
            plot_dir: default_plot_dir(),
        }
    }
}

/// Outcome of reading the settings file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded(PathBuf),
    /// No file yet; defaults are in effect.
    Missing,
    /// The file exists but could not be read or parsed.
    Failed { path: PathBuf, reason: String },
}

impl LoadStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadStatus::Loaded(path) => write!(f, "Config loaded from {:?}", path),
            LoadStatus::Missing => write!(f, "No config found. Using defaults."),
            LoadStatus::Failed { path, reason } => {
                write!(f, "Error reading config {:?}: {}", path, reason)
            }
        }
    }
}

impl Config {
    /// Loads config from standard OS location (e.g., ~/.config/flpz/settings.json)
    pub fn load() -> (Self, LoadStatus) {
        Self::load_from(&Self::get_path())
    }

    /// Defaults are returned alongside a `Failed` status, never silently.
    pub fn load_from(path: &Path) -> (Self, LoadStatus) {
        if !path.exists() {
            return (Self::default(), LoadStatus::Missing);
        }
        let failed = |reason: String| LoadStatus::Failed {
            path: path.to_path_buf(),
            reason,
        };
        match File::open(path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                match serde_json::from_reader(reader) {
                    Ok(cfg) => (cfg, LoadStatus::Loaded(path.to_path_buf())),
                    Err(e) => (Self::default(), failed(e.to_string())),
                }
            }
            Err(e) => (Self::default(), failed(e.to_string())),
        }
    }

    /// Saves config to standard OS location
    pub fn save(&self) -> String {
        let path = Self::get_path();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match File::create(&path) {
            Ok(file) => {
                let writer = BufWriter::new(file);
                match serde_json::to_writer_pretty(writer, self) {
                    Ok(_) => format!("Config saved to {:?}", path),
                    Err(e) => format!("Failed to save config: {}", e),
                }
            }
            Err(e) => format!("Could not create config file: {}", e),
        }
    }

    pub fn get_path() -> PathBuf {
        if let Some(proj) = ProjectDirs::from("org", "flpz", "flpz") {
            proj.config_dir().join("settings.json")
        } else {
            PathBuf::from("settings.json")
        }
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            tolerance: self.tolerance,
            replication_radius: self.replication_radius,
            policy: self.policy,
        }
    }
}

// --- Mapping job file ---

/// Everything one mapping run needs, as a single JSON document.
/// Option fields left out fall back to the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapJob {
    pub origin: Cell,
    pub target: Cell,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub replication_radius: Option<u32>,
    #[serde(default)]
    pub policy: Option<MatchPolicy>,
}

impl MapJob {
    pub fn options(&self, base: MapOptions) -> MapOptions {
        MapOptions {
            tolerance: self.tolerance.unwrap_or(base.tolerance),
            replication_radius: self.replication_radius.unwrap_or(base.replication_radius),
            policy: self.policy.unwrap_or(base.policy),
        }
    }
}
