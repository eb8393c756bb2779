pub mod toml_config;

pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "reimburse")]
#[command(about = "Estimate a travel reimbursement from trip days, miles and receipts")]
#[command(allow_negative_numbers = true)]
pub struct CliConfig {
    /// Trip duration in whole days
    pub trip_days: u32,

    /// Miles traveled
    pub miles: f64,

    /// Total receipts amount in dollars
    pub receipts: f64,

    /// Decision tree model file
    #[arg(long, env = "REIMBURSE_MODEL")]
    pub model: Option<String>,

    /// Optional TOML configuration file
    #[arg(long, env = "REIMBURSE_CONFIG")]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Reads `--config` if given, otherwise the defaults.
    pub fn load_file_config(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => TomlConfig::from_file(path),
            None => Ok(TomlConfig::default()),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.model {
            validate_path("--model", path)?;
        }
        if let Some(path) = &self.config {
            validate_path("--config", path)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_arguments() {
        let config = CliConfig::try_parse_from(["reimburse", "5", "250", "1200.50"]).unwrap();
        assert_eq!(config.trip_days, 5);
        assert_eq!(config.miles, 250.0);
        assert_eq!(config.receipts, 1200.5);
        assert!(!config.verbose);
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        assert!(CliConfig::try_parse_from(["reimburse", "5", "250"]).is_err());
        assert!(CliConfig::try_parse_from(["reimburse", "5", "250", "1", "2"]).is_err());
    }

    #[test]
    fn test_non_numeric_is_rejected() {
        assert!(CliConfig::try_parse_from(["reimburse", "five", "250", "1200"]).is_err());
        assert!(CliConfig::try_parse_from(["reimburse", "2.5", "250", "1200"]).is_err());
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let config = CliConfig::try_parse_from(["reimburse", "3", "-20", "10"]).unwrap();
        assert_eq!(config.miles, -20.0);
    }

    #[test]
    fn test_options() {
        let config = CliConfig::try_parse_from([
            "reimburse", "--model", "tree.json", "-v", "1", "0", "0",
        ])
        .unwrap();
        assert_eq!(config.model.as_deref(), Some("tree.json"));
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }
}
