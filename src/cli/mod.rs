//! CLI command handling

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::{default_config_path, Config, FileConfig};
use crate::services::coordinator::{Coordinator, CoordinatorData};
use crate::services::pricing::PricingResolver;
use crate::services::sensors::{readings, Reading};
use crate::services::source::SnapshotSource;
use crate::services::validation::validate_input;
use crate::types::RawPricing;

/// Hyperoptic account monitor
#[derive(Parser)]
#[command(name = "hypermon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file [default: ~/.hypermon/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account email
    #[arg(long, global = true, env = "HYPERMON_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "HYPERMON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Directory holding the account data exports
    #[arg(long, global = true, env = "HYPERMON_SNAPSHOT_DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh once and print every sensor (default)
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Reference date for pricing (YYYY-MM-DD) [default: today]
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Refresh every scan interval until interrupted
    Watch {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the configured credentials
    Validate,

    /// Resolve a pricing schedule file (JSON array of entries)
    Pricing {
        /// Schedule file
        schedule: PathBuf,

        /// Reference date (YYYY-MM-DD) [default: today]
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

impl Cli {
    /// Default log level for the selected command
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if matches!(self.command, Some(Commands::Watch { .. })) {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        match &self.command {
            None => run_status(&self.load_config()?, false, None),
            Some(Commands::Status { json, today }) => {
                run_status(&self.load_config()?, *json, *today)
            }
            Some(Commands::Watch { json }) => run_watch(self.load_config()?, *json),
            Some(Commands::Validate) => run_validate(&self.load_config()?),
            Some(Commands::Pricing { schedule, today }) => run_pricing(schedule, *today),
        }
    }

    /// Merge the config file with flags and environment
    fn load_config(&self) -> anyhow::Result<Config> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let file = FileConfig::load(&path)?;
        let overrides = FileConfig {
            email: self.email.clone(),
            password: self.password.clone(),
            snapshot_dir: self.snapshot_dir.clone(),
            scan_interval_secs: None,
        };
        Ok(Config::resolve(file.merge(overrides))?)
    }
}

fn snapshot_source(config: &Config) -> SnapshotSource {
    SnapshotSource::new(config.snapshot_dir.clone(), config.credentials())
}

/// Refresh once and print all readings
fn run_status(config: &Config, json: bool, today: Option<NaiveDate>) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(snapshot_source(config), config.scan_interval);
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let data = coordinator.refresh(today)?;
    print_readings(&data, json)
}

/// Poll until Ctrl-C
fn run_watch(config: Config, json: bool) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(snapshot_source(&config), config.scan_interval);
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(coordinator.run(|data| match print_readings(data, json) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => {
            tracing::warn!("output failed: {}", e);
            ControlFlow::Break(())
        }
    }))?;
    Ok(())
}

fn run_validate(config: &Config) -> anyhow::Result<()> {
    let source = snapshot_source(config);
    let title = validate_input(&source, &config.credentials())?;
    println!("{}", title);
    Ok(())
}

/// Resolve a schedule file and print the derived pricing as JSON
fn run_pricing(schedule: &Path, today: Option<NaiveDate>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(schedule)?;
    let entries: Vec<RawPricing> = serde_json::from_str(&content)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let resolved = PricingResolver::new(today).resolve(&entries);
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

fn print_readings(data: &CoordinatorData, json: bool) -> anyhow::Result<()> {
    let readings = readings(data);
    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        println!("{} (pricing as of {})", data.customer.full_name, data.resolved_on);
        for reading in &readings {
            println!("  {}", format_reading(reading));
        }
    }
    Ok(())
}

fn format_reading(reading: &Reading) -> String {
    let state = reading
        .state
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    match reading.unit {
        Some(unit) if reading.state.is_some() => format!("{}: {} {}", reading.name, state, unit),
        _ => format!("{}: {}", reading.name, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sensors::{SensorValue, State};

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["hypermon"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::try_parse_from(["hypermon", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status {
                json: false,
                today: None
            })
        ));
    }

    #[test]
    fn test_cli_parse_status_json_with_date() {
        let cli =
            Cli::try_parse_from(["hypermon", "status", "--json", "--today", "2025-12-01"]).unwrap();
        match cli.command {
            Some(Commands::Status { json, today }) => {
                assert!(json);
                assert_eq!(today, NaiveDate::from_ymd_opt(2025, 12, 1));
            }
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn test_cli_parse_bad_date() {
        let result = Cli::try_parse_from(["hypermon", "status", "--today", "not-a-date"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_watch() {
        let cli = Cli::try_parse_from(["hypermon", "watch"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Watch { json: false })));
        assert_eq!(cli.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::try_parse_from(["hypermon", "validate"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Validate)));
    }

    #[test]
    fn test_cli_parse_pricing() {
        let cli = Cli::try_parse_from(["hypermon", "pricing", "schedule.json"]).unwrap();
        match cli.command {
            Some(Commands::Pricing { schedule, today }) => {
                assert_eq!(schedule, PathBuf::from("schedule.json"));
                assert!(today.is_none());
            }
            _ => panic!("expected pricing"),
        }
    }

    #[test]
    fn test_cli_pricing_requires_file() {
        assert!(Cli::try_parse_from(["hypermon", "pricing"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hypermon",
            "status",
            "--snapshot-dir",
            "/tmp/snap",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.snapshot_dir, Some(PathBuf::from("/tmp/snap")));
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_tui_removed() {
        assert!(Cli::try_parse_from(["hypermon", "tui"]).is_err());
    }

    #[test]
    fn test_format_reading() {
        let reading = Reading {
            unique_id: "hyperoptic_1_pkg_download_speed".into(),
            name: "Download Speed 1".into(),
            state: Some(State::Value(SensorValue::Integer(1000))),
            unit: Some("Mbps"),
            icon: None,
        };
        assert_eq!(format_reading(&reading), "Download Speed 1: 1000 Mbps");

        let unknown = Reading {
            state: None,
            ..reading
        };
        assert_eq!(format_reading(&unknown), "Download Speed 1: unknown");
    }

    #[test]
    fn test_run_pricing_fixture() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("schedule.json");
        assert!(run_pricing(&path, NaiveDate::from_ymd_opt(2025, 12, 1)).is_ok());
    }
}
