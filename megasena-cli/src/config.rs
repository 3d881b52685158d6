use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::sampler::DEFAULT_EPSILON;

pub const DEFAULT_CONFIG_FILE: &str = "megasena.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Nombre maximum de concours récupérés par mise à jour.
    pub max_fetch: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            base_url: "https://servicebus2.caixa.gov.br/portaldeloterias/api/megasena".to_string(),
            timeout_secs: 5,
            max_fetch: 50,
        }
    }
}

impl RefreshConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub delay_bias: f64,
    pub epsilon: f64,
    pub ticket_count: usize,
    pub max_tickets: usize,
    pub closing_sample: usize,
    pub refresh: RefreshConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            delay_bias: 0.5,
            epsilon: DEFAULT_EPSILON,
            ticket_count: 5,
            max_tickets: 50,
            closing_sample: 10,
            refresh: RefreshConfig::default(),
        }
    }
}

impl AppConfig {
    /// Fichier absent : configuration par défaut.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("{:?} absent, configuration par défaut", path);
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&json)
            .with_context(|| format!("Configuration {:?} invalide", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(megasena_db::db::db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!((config.delay_bias - 0.5).abs() < 1e-10);
        assert!((config.epsilon - 0.01).abs() < 1e-10);
        assert_eq!(config.max_tickets, 50);
        assert_eq!(config.refresh.timeout(), Duration::from_secs(5));
        assert!(config.db_path().ends_with("data/megasena.db"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, r#"{"delay_bias": 0.8, "refresh": {"timeout_secs": 2}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!((config.delay_bias - 0.8).abs() < 1e-10);
        assert_eq!(config.refresh.timeout_secs, 2);
        assert_eq!(config.refresh.max_fetch, 50);
        assert_eq!(config.ticket_count, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = AppConfig {
            db_path: Some(PathBuf::from("/tmp/ms.db")),
            ticket_count: 12,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ delay_bias").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
