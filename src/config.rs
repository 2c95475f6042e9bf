//! Configuration management for proctree-monitor.
//!
//! This module handles loading, merging, and validating configuration from
//! files and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, OutputFormat};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_ROOT_PID: &str = "1";
pub const DEFAULT_REGISTER_BIND: &str = "0.0.0.0";
pub const DEFAULT_REGISTER_PORT: u16 = 5020;

/// Register server capability, decided once at process start and threaded
/// through explicitly instead of being read from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Whether the downstream register server is started at all
    #[serde(default)]
    pub enabled: bool,

    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_register_bind")]
    pub bind: String,

    /// TCP port (default: 5020)
    #[serde(default = "default_register_port")]
    pub port: u16,

    /// Value published in every holding register (default: 12345)
    #[serde(default = "default_register_value")]
    pub value: u16,
}

fn default_register_bind() -> String {
    DEFAULT_REGISTER_BIND.to_string()
}
fn default_register_port() -> u16 {
    DEFAULT_REGISTER_PORT
}
fn default_register_value() -> u16 {
    proctree_monitor::DEFAULT_REGISTER_VALUE
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_register_bind(),
            port: default_register_port(),
            value: default_register_value(),
        }
    }
}

impl RegisterConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Polling
    pub poll_interval_ms: Option<u64>,
    pub capture_timeout_secs: Option<u64>,

    // Hierarchy
    pub root_pid: Option<String>,

    // Logging
    pub log_level: Option<String>,

    // Downstream register server capability
    #[serde(default)]
    pub register: RegisterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            capture_timeout_secs: Some(DEFAULT_CAPTURE_TIMEOUT_SECS),
            root_pid: Some(DEFAULT_ROOT_PID.to_string()),
            log_level: Some("info".into()),
            register: RegisterConfig::default(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn capture_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.capture_timeout_secs
                .unwrap_or(DEFAULT_CAPTURE_TIMEOUT_SECS),
        )
    }

    pub fn root_pid(&self) -> &str {
        self.root_pid.as_deref().unwrap_or(DEFAULT_ROOT_PID)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    if let Some(interval) = cfg.poll_interval_ms {
        if interval < 100 {
            bail!("poll_interval_ms must be at least 100 ms, got {}", interval);
        }
    }

    if let Some(timeout) = cfg.capture_timeout_secs {
        if timeout == 0 {
            bail!("capture_timeout_secs must be at least 1 second");
        }
    }

    if let Some(root) = &cfg.root_pid {
        if root.trim().is_empty() {
            bail!("root_pid must not be empty");
        }
    }

    if cfg.register.enabled && cfg.register.port == 0 {
        bail!("register.port must not be 0 when the register server is enabled");
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(interval) = args.interval_ms {
        config.poll_interval_ms = Some(interval);
    }
    if let Some(timeout) = args.capture_timeout_secs {
        config.capture_timeout_secs = Some(timeout);
    }
    if let Some(root) = &args.root {
        config.root_pid = Some(root.trim().to_string());
    }
    if args.enable_register {
        config.register.enabled = true;
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = path {
        p.to_path_buf()
    } else {
        // Try default locations
        let defaults = [
            "/etc/proctree-monitor/config.yaml",
            "/etc/proctree-monitor/config.yml",
            "./proctree-monitor.yaml",
            "./proctree-monitor.yml",
            "./proctree-monitor.toml",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        }
    };

    if !path.exists() {
        bail!("config file not found: {}", path.display());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            config
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            config
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            config
        }
    };
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Text | OutputFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
