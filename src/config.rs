use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::toolkit::ExternalToolkit;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Path to the Saved Media JSON export
    pub manifest: String,
    /// Directory the archive is written to
    pub out_dir: String,
    #[serde(default = "default_exiftool")]
    pub exiftool: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    /// Remux videos before tagging them
    #[serde(default = "default_repair_videos")]
    pub repair_videos: bool,
}

fn default_exiftool() -> String {
    "exiftool".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_repair_videos() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: "memories_history.json".to_string(),
            out_dir: "archive".to_string(),
            exiftool: default_exiftool(),
            ffmpeg: default_ffmpeg(),
            repair_videos: default_repair_videos(),
        }
    }
}

impl Config {
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Ok(config)
    }

    pub fn get_config_path(config_arg: &Option<PathBuf>) -> PathBuf {
        config_arg
            .clone()
            .unwrap_or_else(|| PathBuf::from("config.yaml"))
    }

    /// Toolkit using the configured binaries
    pub fn toolkit(&self) -> ExternalToolkit {
        ExternalToolkit::new(&self.exiftool, &self.ffmpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.manifest, "memories_history.json");
        assert_eq!(config.out_dir, "archive");
        assert_eq!(config.exiftool, "exiftool");
        assert_eq!(config.ffmpeg, "ffmpeg");
        assert!(config.repair_videos);
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        let config = Config {
            repair_videos: false,
            ..Config::default()
        };
        config.save_to_file(&config_path)?;

        let loaded_config = Config::load_from_file(&config_path)?;

        assert_eq!(config.manifest, loaded_config.manifest);
        assert_eq!(config.out_dir, loaded_config.out_dir);
        assert_eq!(config.exiftool, loaded_config.exiftool);
        assert!(!loaded_config.repair_videos);

        Ok(())
    }

    #[test]
    fn test_minimal_config_uses_tool_defaults() -> Result<()> {
        let config: Config = serde_yaml::from_str("manifest: export.json\nout_dir: out\n")?;

        assert_eq!(config.manifest, "export.json");
        assert_eq!(config.exiftool, "exiftool");
        assert_eq!(config.ffmpeg, "ffmpeg");
        assert!(config.repair_videos);

        Ok(())
    }

    #[test]
    fn test_config_path_override() {
        assert_eq!(Config::get_config_path(&None), PathBuf::from("config.yaml"));
        assert_eq!(
            Config::get_config_path(&Some(PathBuf::from("custom.yaml"))),
            PathBuf::from("custom.yaml")
        );
    }
}
