use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wildweather::alerts::Comparison;
use wildweather::models::Metric;
use wildweather::preferences::Theme;
use wildweather::units::UnitMode;

#[derive(Debug, Parser)]
#[command(name = "wildweather", version, about = "Location-aware weather, forecasts and alerts.")]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(env = "WILDWEATHER_CONFIG", short, long)]
    pub config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
    /// Switch the unit system before running the command (saved as preference)
    #[arg(short, long)]
    pub units: Option<UnitMode>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Weather for the detected location
    Current,
    /// Weather for a coordinate
    At {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Search places by name
    Search {
        query: String,
        /// Show the weather for the n-th result (1-based)
        #[arg(long)]
        select: Option<usize>,
    },
    Saved(SavedCommand),
    Alerts(AlertsCommand),
    Prefs(PrefsCommand),
}

#[derive(Debug, Parser)]
pub struct SavedCommand {
    #[command(subcommand)]
    pub cmd: SavedSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum SavedSubCommand {
    /// List saved locations with live temperatures
    List,
    /// Save a location
    Add {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Save the detected location under its headline name
    AddCurrent,
    /// Weather for a saved location
    Show { name: String },
    Remove { name: String },
    /// Erase all saved locations
    Clear,
}

#[derive(Debug, Parser)]
pub struct AlertsCommand {
    #[command(subcommand)]
    pub cmd: AlertsSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsSubCommand {
    List,
    Add {
        /// temperature, wind, visibility, humidity, pressure, uv or clouds
        metric: Metric,
        /// above or below
        comparison: Comparison,
        /// Threshold in the current unit system; visibility is in meters
        #[arg(allow_hyphen_values = true)]
        threshold: f64,
        /// Activity the alert is for
        activity: String,
    },
    Remove { id: u64 },
    Toggle { id: u64 },
}

#[derive(Debug, Parser)]
pub struct PrefsCommand {
    #[command(subcommand)]
    pub cmd: PrefsSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrefsSubCommand {
    Show,
    Units { mode: UnitMode },
    Theme { theme: Theme },
}
