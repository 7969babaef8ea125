// ============================================================================
// Configuration
// ============================================================================
// Dérivée des variables d'environnement (pas de fichier de configuration)
//
// | Variable                    | Défaut                                  |
// |-----------------------------|-----------------------------------------|
// | MARKETNAV_DATA_DIR          | ./data                                  |
// | MARKETNAV_LOG_DIR           | <data dir plateforme>/marketnav/logs    |
// | FRED_API_KEY                | (aucune : étapes FRED ignorées)         |
// | MARKETNAV_REQUEST_DELAY_MS  | 500                                     |
// | MARKETNAV_HISTORY_START     | 1980-01-01                              |
// ============================================================================

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::series::parse_day;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
pub const DEFAULT_HISTORY_START: &str = "1980-01-01";

#[derive(Debug, Clone)]
pub struct Config {
    /// Racine du cache JSON (tickers/, fredData/, consumer-price-index/)
    pub data_dir: PathBuf,
    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
    /// Clé API FRED (None = indicateurs macro et CPI non mis à jour)
    pub fred_api_key: Option<String>,
    /// Pause entre deux requêtes HTTP
    pub request_delay: Duration,
    /// Début de l'historique pour un téléchargement complet
    pub history_start: NaiveDate,
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env_str(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Répertoire de logs par défaut
///
/// - Linux : ~/.local/share/marketnav/logs
/// - macOS : ~/Library/Application Support/marketnav/logs
/// - Windows : C:\Users\<user>\AppData\Local\marketnav\logs
/// - Plateforme inconnue : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("marketnav").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or_default()
}

impl Config {
    /// Lit la configuration depuis l'environnement
    ///
    /// Chaque variable absente (ou vide) garde la valeur de Config::default().
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_str("MARKETNAV_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_dir: env_str("MARKETNAV_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            fred_api_key: env_str("FRED_API_KEY"),
            request_delay: Duration::from_millis(env_u64(
                "MARKETNAV_REQUEST_DELAY_MS",
                DEFAULT_REQUEST_DELAY_MS,
            )),
            history_start: env_str("MARKETNAV_HISTORY_START")
                .and_then(|s| parse_day(&s))
                .unwrap_or(defaults.history_start),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_dir: default_log_dir(),
            fred_api_key: None,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            history_start: default_history_start(),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.request_delay, Duration::from_millis(500));
        assert_eq!(config.history_start.to_string(), DEFAULT_HISTORY_START);
        assert!(config.fred_api_key.is_none());
        assert!(config.log_dir.ends_with("logs"));
    }
}
