//! Process configuration.
//!
//! Configuration is loaded from an optional TOML file given with `--config`
//! or `$MAILPEEK_CONFIG`; keys missing from the file fall back to the built-in
//! defaults. Command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SMTP listener settings.
    pub server: ServerConfig,
    /// Artifact and viewer settings.
    pub capture: CaptureConfig,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// SMTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: String,
    /// Name announced in the greeting and HELO/EHLO replies.
    pub hostname: String,
    /// Socket read timeout in seconds (0 disables it).
    pub read_timeout_secs: u64,
    /// Socket write timeout in seconds (0 disables it).
    pub write_timeout_secs: u64,
    /// Largest accepted message in bytes (default: 268435456 = 256 MiB).
    pub max_message_bytes: usize,
    /// Most recipients accepted per transaction.
    pub max_recipients: usize,
}

/// Artifact and viewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory for generated files. Defaults to the system temp directory.
    pub artifact_dir: Option<PathBuf>,
    /// Open generated documents in the default viewer.
    pub open_viewer: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            capture: CaptureConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:2028".to_string(),
            hostname: "localhost".to_string(),
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            max_message_bytes: 256 * 1024 * 1024, // 256 MiB
            max_recipients: 50,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            open_viewer: true,
        }
    }
}

impl ServerConfig {
    /// Read timeout, or `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    /// Write timeout, or `None` when disabled.
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_secs > 0).then(|| Duration::from_secs(self.write_timeout_secs))
    }
}

impl CaptureConfig {
    /// Directory artifacts are written to.
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `path`.
///
/// Without a path the defaults are returned. A path that was given must
/// point at a readable TOML file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.addr, "localhost:2028");
        assert_eq!(cfg.server.hostname, "localhost");
        assert_eq!(cfg.server.read_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.server.max_message_bytes, 262144 * 1024);
        assert_eq!(cfg.server.max_recipients, 50);
        assert!(cfg.capture.open_viewer);
        assert_eq!(cfg.capture.artifact_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
log_level = "debug"

[server]
addr = "127.0.0.1:2525"
read_timeout_secs = 0

[capture]
open_viewer = false
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.server.addr, "127.0.0.1:2525");
        assert_eq!(cfg.server.read_timeout(), None);
        assert!(!cfg.capture.open_viewer);
        // Other fields use defaults
        assert_eq!(cfg.server.write_timeout_secs, 10);
        assert_eq!(cfg.server.max_recipients, 50);
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.server.addr, "localhost:2028");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailpeek.toml");
        std::fs::write(&path, "[server]\nmax_recipients = \"five\"\n").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailpeek.toml");
        std::fs::write(&path, "[server]\nmax_recipients = 5\n").unwrap();

        let cfg = load_config(Some(path.as_path())).unwrap();
        assert_eq!(cfg.server.max_recipients, 5);
        assert_eq!(cfg.server.hostname, "localhost");
    }
}
