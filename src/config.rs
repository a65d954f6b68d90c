use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::default_triggers;
use crate::storage::Backend;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Session name partitioning the log
    pub name: String,
    pub prompt: String,
    /// Every character in this string ends the loop
    pub break_chars: String,
    /// Commands never recorded, on top of the built-in ones
    pub dont_log: Vec<String>,
    pub wishlist: bool,
    /// Default record count for `history` and `errors`
    pub history_limit: usize,
    pub log_hotkeys: bool,
    pub report_hotkey_errors: bool,
    pub storage: StorageConfig,
    /// Session trigger name to command line
    pub sessions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chloop"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            name: "default".to_string(),
            prompt: "\n> ".to_string(),
            break_chars: String::new(),
            dont_log: Vec::new(),
            wishlist: true,
            history_limit: 10,
            log_hotkeys: false,
            report_hotkey_errors: true,
            storage: StorageConfig::default(),
            sessions: default_triggers(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.name, "default");
        assert_eq!(config.prompt, "\n> ");
        assert!(config.wishlist);
        assert_eq!(config.history_limit, 10);
        assert!(!config.log_hotkeys);
        assert!(config.report_hotkey_errors);
        assert_eq!(config.storage.backend, Backend::Jsonl);
        assert!(config.sessions.contains_key("pdb"));
        assert!(config.sessions.contains_key("ipython"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("name: work\nbreak_chars: q\n").unwrap();
        assert_eq!(config.name, "work");
        assert_eq!(config.break_chars, "q");
        assert_eq!(config.history_limit, 10);
        assert!(config.sessions.contains_key("shell"));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
name: notes
prompt: "chloop> "
dont_log: [chars, cmds]
wishlist: false
history_limit: 25
log_hotkeys: true
report_hotkey_errors: false
storage:
  backend: sqlite
  dir: /tmp/chloop-test
sessions:
  shell: bash
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.prompt, "chloop> ");
        assert_eq!(config.dont_log, vec!["chars", "cmds"]);
        assert!(!config.wishlist);
        assert_eq!(config.history_limit, 25);
        assert!(config.log_hotkeys);
        assert!(!config.report_hotkey_errors);
        assert_eq!(config.storage.backend, Backend::Sqlite);
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/chloop-test"));
        assert_eq!(config.sessions.len(), 1);
        assert_eq!(config.sessions["shell"], "bash");
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name: from-file").unwrap();
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.name, "from-file");
    }

    #[test]
    fn test_load_explicit_path_missing() {
        let path = PathBuf::from("/nonexistent/chloop.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
