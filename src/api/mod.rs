// ============================================================================
// Module : api
// ============================================================================
// Clients HTTP des sources de données utilisées par `marketnav update` :
// - Yahoo Finance : historiques de prix journaliers
// - FRED : CPI, rendement du Trésor, indicateurs macro
// ============================================================================

pub mod fred;  // Client API FRED
pub mod yahoo; // Client API Yahoo Finance

use anyhow::{Context, Result};

// Re-export des fonctions principales
pub use fred::fetch_observations;
pub use yahoo::fetch_daily_history;

/// User-Agent de navigateur : Yahoo Finance bloque les clients sans User-Agent
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Client HTTP partagé par toutes les requêtes de la mise à jour
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Échec de la création du client HTTP")
}
