//! Command line arguments.

use crate::config::{ConfigError, DashboardConfig};
use clap::Parser;
use std::path::PathBuf;

/// Pandemic Dashboard - cumulative cases and deaths by country, month by month
#[derive(Parser, Debug)]
#[command(name = "pandemic-dashboard", version, about)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "PANDEMIC_DASHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dataset URL or CSV path (overrides the config file)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Initial slider position (month key)
    #[arg(long)]
    pub cutoff: Option<u32>,

    /// Render a PNG snapshot to this path and exit without opening a window
    #[arg(long, value_name = "PNG")]
    pub export: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Defaults, then the config file, then command line flags.
    pub fn resolve_config(&self) -> Result<DashboardConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load_from_path(path)?,
            None => DashboardConfig::default(),
        };

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(cutoff) = self.cutoff {
            config.initial_cutoff = cutoff;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "pandemic-dashboard",
            "--source",
            "cases.csv",
            "--cutoff",
            "7",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.source, "cases.csv");
        assert_eq!(config.initial_cutoff, 7);
        assert_eq!(config.top_n, 5);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pandemic-dashboard", "-q", "-v"]).is_err());
    }

    #[test]
    fn empty_source_override_is_rejected() {
        let cli = Cli::try_parse_from(["pandemic-dashboard", "--source", ""]).unwrap();
        assert!(matches!(
            cli.resolve_config(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
