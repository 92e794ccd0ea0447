//! Application configuration (`rigpatch.toml`)

use anyhow::{Context, Result};
use rigpatch_core::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of `rigpatch.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Update cycles per second for `run`
    pub fps: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        // Full 512-channel DMX frames top out around 44 Hz
        Self { fps: 44 }
    }
}

impl AppConfig {
    /// Read the config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("rigpatch.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.output.fps, 44);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rigpatch.toml");
        fs::write(
            &path,
            "[log]\nlevel = \"debug\"\nfile_output = true\n\n[output]\nfps = 30\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.log.level, "debug");
        assert!(config.log.file_output);
        assert!(config.log.console_output);
        assert_eq!(config.output.fps, 30);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rigpatch.toml");
        fs::write(&path, "[output]\nfps = \"fast\"\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
