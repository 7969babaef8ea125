// ============================================================================
// API Client : FRED (Federal Reserve Economic Data)
// ============================================================================
// Endpoint series/observations : observations d'une série économique
// (CPI, taux du Trésor à 10 ans, indicateurs macro)
//
// Une clé API est obligatoire (variable FRED_API_KEY).
// ============================================================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, error, info, instrument};

use crate::models::series::DATE_FORMAT;
use crate::models::ObservationDocument;

const FRED_OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Série FRED de l'indice des prix à la consommation
pub const CPI_SERIES_ID: &str = "CPIAUCSL";

/// Série FRED du rendement du Trésor à 10 ans (enregistrée sous UST10Y)
pub const TREASURY_SERIES_ID: &str = "DGS10";

/// Indicateurs macro téléchargés tels quels dans fredData/
pub const MACRO_SERIES: &[&str] = &[
    // Croissance et production
    "GDP", "GDPC1", "INDPRO", "TCU", "DGORDER", "PCEC96",
    // Marché du travail
    "PAYEMS", "UNRATE", "CIVPART", "JTSJOL", "ICSA", "ECIALLCIV",
    // Inflation
    "CPIAUCSL", "CPILFESL", "PCE", "PCEPILFE", "PPIACO", "IR14270",
    // Consommation
    "RSAFS", "UMCSENT", "UMCSENTEX", "PSAVERT", "DRCCLACBS",
    // Monnaie et crédit
    "M2SL", "TOTBKCR", "BUSLOANS", "CONSUMERLOANS", "DBAA",
    // Immobilier
    "HOUST", "PERMIT", "NHSLTOT", "EXHOSLUSM495S", "MSPNHSUS", "MORTGAGE30US",
    // Commerce extérieur
    "BOPGSTB", "IMPGSC1", "EXPGSC1", "DTWEXBGS",
    // Politique monétaire
    "FEDFUNDS", "GS2", "WALCL",
    // Revenu réel
    "MEHOINUSA672N",
];

/// Paramètres de la requête (la clé API n'apparaît jamais dans les logs)
fn query_params(api_key: &str, series_id: &str, observation_start: Option<NaiveDate>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("series_id", series_id.to_string()),
        ("api_key", api_key.to_string()),
        ("file_type", "json".to_string()),
    ];
    if let Some(start) = observation_start {
        params.push(("observation_start", start.format(DATE_FORMAT).to_string()));
    }
    params
}

/// Récupère les observations d'une série FRED
///
/// # Arguments
/// * `observation_start` - Première date demandée (incluse) ; None = tout l'historique
#[instrument(skip(client, api_key))]
pub async fn fetch_observations(
    client: &Client,
    api_key: &str,
    series_id: &str,
    observation_start: Option<NaiveDate>,
) -> Result<ObservationDocument> {
    debug!("Sending HTTP request to FRED");
    let response = client
        .get(FRED_OBSERVATIONS_URL)
        .query(&query_params(api_key, series_id, observation_start))
        .send()
        .await
        .with_context(|| format!("Échec de la requête HTTP vers FRED pour {}", series_id))?;

    let status = response.status();
    if !status.is_success() {
        error!(status = %status, "FRED returned error status");
        anyhow::bail!("FRED a retourné une erreur pour {} : HTTP {}", series_id, status);
    }

    let doc: ObservationDocument = response
        .json()
        .await
        .with_context(|| format!("Échec du parsing JSON de la réponse FRED pour {}", series_id))?;

    info!(observations = doc.observations.len(), "Successfully fetched FRED observations");
    Ok(doc)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_query_params() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let params = query_params("KEY", CPI_SERIES_ID, Some(start));

        assert!(params.contains(&("series_id", "CPIAUCSL".to_string())));
        assert!(params.contains(&("observation_start", "2024-01-01".to_string())));
        assert_eq!(query_params("KEY", "GDP", None).len(), 3);
    }

    #[test]
    fn test_macro_series_are_unique() {
        let unique: HashSet<_> = MACRO_SERIES.iter().collect();
        assert_eq!(unique.len(), MACRO_SERIES.len());
    }
}
