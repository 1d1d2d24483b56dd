//! Governance configuration with TOML file support.

use agora_types::Address;
use agora_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::GovernanceError;

/// Immutable parameters of a governance instance.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`]
/// or built programmatically with [`GovernanceConfig::new`]:
///
/// ```toml
/// administrator = "0x0101…01"
/// ledger = "0x0202…02"
/// account = "0x0303…03"
/// minimum_quorum = 100
/// debate_window = 100
///
/// [logging]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// The only account allowed to create and finalize proposals.
    pub administrator: Address,

    /// Address of the token ledger that custodies deposits.
    pub ledger: Address,

    /// The governance instance's own account: deposits are escrowed here and
    /// approved calls are made from here.
    pub account: Address,

    /// Minimum `yes + no` weight required to finalize a proposal.
    pub minimum_quorum: u64,

    /// Ticks between creation and the earliest finalization.
    pub debate_window: u64,

    /// Log output settings for embeddings that initialise logging from this file.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a full
    /// `EnvFilter` expression.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber described by this table.
    pub fn init(&self) -> Result<(), GovernanceError> {
        agora_utils::init_logging(self.format, &self.level)
            .map_err(|e| GovernanceError::Config(e.to_string()))
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    pub fn new(
        administrator: Address,
        ledger: Address,
        account: Address,
        minimum_quorum: u64,
        debate_window: u64,
    ) -> Self {
        Self {
            administrator,
            ledger,
            account,
            minimum_quorum,
            debate_window,
            logging: LoggingConfig::default(),
        }
    }

    /// Reject configurations with an absent administrator, ledger or account.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.administrator.is_zero() {
            return Err(GovernanceError::ZeroAddress("administrator"));
        }
        if self.ledger.is_zero() {
            return Err(GovernanceError::ZeroAddress("ledger"));
        }
        if self.account.is_zero() {
            return Err(GovernanceError::ZeroAddress("account"));
        }
        Ok(())
    }

    /// Minimum quorum widened to the tally's integer type.
    pub fn quorum(&self) -> u128 {
        u128::from(self.minimum_quorum)
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GovernanceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GovernanceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> GovernanceConfig {
        GovernanceConfig::new(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            100,
            100,
        )
    }

    #[test]
    fn toml_roundtrip() {
        let config = sample();
        let text = config.to_toml_string().unwrap();
        assert_eq!(GovernanceConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn logging_table_is_optional() {
        let text = format!(
            "administrator = \"{}\"\nledger = \"{}\"\naccount = \"{}\"\nminimum_quorum = 5\ndebate_window = 7\n",
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        );
        let config = GovernanceConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.minimum_quorum, 5);
        assert_eq!(config.debate_window, 7);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn logging_table_is_parsed() {
        let mut text = sample().to_toml_string().unwrap();
        text = text.replace("level = \"info\"", "level = \"debug\"");
        text = text.replace("format = \"human\"", "format = \"json\"");
        let config = GovernanceConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_administrator_rejected() {
        let mut config = sample();
        config.administrator = Address::ZERO;
        assert_eq!(
            config.validate(),
            Err(GovernanceError::ZeroAddress("administrator"))
        );
    }

    #[test]
    fn zero_ledger_rejected() {
        let mut config = sample();
        config.ledger = Address::ZERO;
        assert_eq!(config.validate(), Err(GovernanceError::ZeroAddress("ledger")));
    }

    #[test]
    fn zero_address_in_file_rejected() {
        let text = sample()
            .to_toml_string()
            .unwrap()
            .replace(&Address::repeat_byte(2).to_string(), &Address::ZERO.to_string());
        assert_eq!(
            GovernanceConfig::from_toml_str(&text),
            Err(GovernanceError::ZeroAddress("ledger"))
        );
    }

    #[test]
    fn malformed_address_is_config_error() {
        let text = "administrator = \"0x12\"\nledger = \"0x12\"\naccount = \"0x12\"\nminimum_quorum = 1\ndebate_window = 1\n";
        assert!(matches!(
            GovernanceConfig::from_toml_str(text),
            Err(GovernanceError::Config(_))
        ));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample().to_toml_string().unwrap().as_bytes())
            .unwrap();
        let loaded = GovernanceConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(
            GovernanceConfig::from_toml_file("/nonexistent/agora.toml"),
            Err(GovernanceError::Config(_))
        ));
    }
}
