use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "WhatsApp relay control service")]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// HTTP port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run with the mock session provider (no bridge required)
    Mock,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if running in mock mode
    pub fn is_mock_mode(&self) -> bool {
        matches!(self.command, Some(Command::Mock))
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Phone normalization settings
    #[serde(default)]
    pub phone: PhoneSettings,

    /// Pairing-code side channel settings
    #[serde(default)]
    pub pairing: PairingSettings,

    /// Bridge connection settings
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Mock provider settings
    #[serde(default)]
    pub mock: MockSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for one outbound send (seconds)
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

fn default_port() -> u16 {
    3000
}

fn default_send_timeout() -> u64 {
    30
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

/// Phone normalization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneSettings {
    /// Country prefix prepended to numbers that lack it
    #[serde(default = "default_country_prefix")]
    pub default_country_prefix: String,

    /// Provider domain suffix of address tokens
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,
}

fn default_country_prefix() -> String {
    "375".to_string()
}

fn default_domain_suffix() -> String {
    "c.us".to_string()
}

impl Default for PhoneSettings {
    fn default() -> Self {
        Self {
            default_country_prefix: default_country_prefix(),
            domain_suffix: default_domain_suffix(),
        }
    }
}

/// Pairing-code side channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingSettings {
    /// Plain-text file overwritten with each issued pairing code
    #[serde(default = "default_code_file")]
    pub code_file: PathBuf,
}

fn default_code_file() -> PathBuf {
    PathBuf::from("/tmp/warelay/pairing_code.txt")
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            code_file: default_code_file(),
        }
    }
}

/// Bridge connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// WebSocket URL of the WhatsApp Web bridge
    #[serde(default = "default_gateway_url")]
    pub url: String,
}

fn default_gateway_url() -> String {
    "ws://127.0.0.1:8466/session".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
        }
    }
}

/// Mock provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSettings {
    /// Delay before the mock session reports readiness (milliseconds)
    #[serde(default = "default_ready_delay")]
    pub ready_delay_ms: u64,
}

fn default_ready_delay() -> u64 {
    5000
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            ready_delay_ms: default_ready_delay(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("warelay/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/warelay/config.toml")),
            dirs::home_dir().map(|p| p.join(".warelay.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Apply environment overrides (`PORT` wins over the config file)
    pub fn merge_env(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring unparseable PORT value: {port}"),
            }
        }
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    /// Validate and normalize settings values
    pub fn validate(&mut self) {
        const MIN_SEND_TIMEOUT_SECS: u64 = 1;

        if self.server.send_timeout_secs < MIN_SEND_TIMEOUT_SECS {
            self.server.send_timeout_secs = MIN_SEND_TIMEOUT_SECS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.send_timeout_secs, 30);
        assert_eq!(settings.phone.default_country_prefix, "375");
        assert_eq!(settings.phone.domain_suffix, "c.us");
        assert_eq!(settings.mock.ready_delay_ms, 5000);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [server]
            port = 8080

            [phone]
            default_country_prefix = "49"
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.phone.default_country_prefix, "49");
        // Untouched sections keep defaults
        assert_eq!(settings.phone.domain_suffix, "c.us");
        assert_eq!(settings.server.send_timeout_secs, 30);
    }

    #[test]
    fn test_port_env_override() {
        temp_env::with_var("PORT", Some("4100"), || {
            let mut settings = Settings::default();
            settings.merge_env();
            assert_eq!(settings.server.port, 4100);
        });
    }

    #[test]
    fn test_bad_port_env_ignored() {
        temp_env::with_var("PORT", Some("not-a-port"), || {
            let mut settings = Settings::default();
            settings.merge_env();
            assert_eq!(settings.server.port, 3000);
        });
    }

    #[test]
    fn test_cli_port_beats_env() {
        temp_env::with_var("PORT", Some("4100"), || {
            let cli = Config {
                debug: false,
                config: None,
                port: Some(5200),
                command: None,
            };
            let mut settings = Settings::default();
            settings.merge_env();
            settings.merge_cli(&cli);
            assert_eq!(settings.server.port, 5200);
        });
    }

    #[test]
    fn test_validate_clamps_send_timeout() {
        let mut settings = Settings::default();
        settings.server.send_timeout_secs = 0;
        settings.validate();
        assert_eq!(settings.server.send_timeout_secs, 1);
    }
}
