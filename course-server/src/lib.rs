//! # Course Server
//!
//! SignalK course calculation provider.
//!
//! This crate wraps [`course_core`] in a small async service that:
//! - Reads SignalK deltas (JSON lines) from stdin or a file
//! - Recomputes great-circle and rhumbline course values on each position update
//! - Publishes `navigation.course.calcValues.*` for the configured method
//! - Raises arrival circle and perpendicular passage notifications
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    course-server                        │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │              CourseProvider (subsystem)             ││
//! │  │  - NavigationData: delta ingest, unit conversion    ││
//! │  │  - CourseAlarms: arrival / passage watchers         ││
//! │  │  - calcValues and notification deltas to stdout     ││
//! │  └────────┬──────────────────────────────▲─────────────┘│
//! │    mpsc   │ CalcRequest         mpsc     │ CalcResponse │
//! │           ▼                              │              │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │              CourseWorker (subsystem)               ││
//! │  │  - Owns the CourseEngine and its staleness counter  ││
//! │  └─────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Command-Line Interface
//!
//! See [`Cli`] for all available options. Key options:
//!
//! - `-c, --config` - Config file (default: platform config directory)
//! - `-m, --method` - Published calculation method
//! - `--stale-threshold` - Stale snapshots before values are cleared
//! - `-i, --input` - Read deltas from a file instead of stdin
//! - `-v` - Increase verbosity (use multiple times)

use clap::Parser;
use course_core::CalcMethod;
use std::path::PathBuf;

pub mod alarms;
pub mod config;
pub mod navdata;
pub mod provider;
pub mod publish;
pub mod worker;

pub use config::{ConfigError, CourseConfig};
pub use provider::{CourseProvider, ProviderError};
pub use worker::{CalcRequest, CalcResponse, CourseWorker};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodArg {
    GreatCircle,
    Rhumbline,
}

impl From<MethodArg> for CalcMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::GreatCircle => CalcMethod::GreatCircle,
            MethodArg::Rhumbline => CalcMethod::Rhumbline,
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Config file, defaults to config.json in the platform config directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Calculation method to publish, overrides the config file
    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Stale snapshots before course values are cleared, overrides the config file
    #[arg(long)]
    pub stale_threshold: Option<u32>,

    /// Read deltas from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(config::default_config_path)
    }

    /// Load the config file, creating it on first run, and apply command
    /// line overrides
    pub fn resolve_config(&self) -> Result<CourseConfig, ConfigError> {
        let mut config = CourseConfig::load_or_init(&self.config_path())?;
        if let Some(method) = self.method {
            config.calc_method = method.into();
        }
        if let Some(threshold) = self.stale_threshold {
            config.stale_threshold = threshold;
        }
        log::debug!("Effective config: {:?}", config);
        Ok(config)
    }
}
