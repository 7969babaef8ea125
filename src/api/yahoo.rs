// ============================================================================
// API Client : Yahoo Finance
// ============================================================================
// Récupère l'historique journalier d'un instrument depuis Yahoo Finance
// (endpoint v8/finance/chart, intervalle 1d)
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. Result<T, E> : gestion d'erreurs avec contexte
// 3. Serde : désérialisation JSON automatique
// ============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::models::series::DATE_FORMAT;
use crate::models::PriceRecord;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// ============================================================================
// Structures pour parser la réponse JSON de Yahoo Finance
// ============================================================================
// Yahoo retourne un JSON imbriqué : chart.result[0].{timestamp, indicators}
// On ne décrit que les champs utilisés ; serde ignore les autres.
// ============================================================================

/// Réponse complète de l'API Yahoo Finance
#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

/// Données OHLCV (Open, High, Low, Close, Volume)
#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

// ============================================================================
// Fonctions publiques de l'API
// ============================================================================

/// Récupère l'historique journalier d'un instrument depuis une date
///
/// # Arguments
/// * `client` - Client HTTP partagé (voir `api::http_client`)
/// * `symbol` - Symbole de l'instrument (ex: "SPY", "^VIX", "DX-Y.NYB")
/// * `since` - Premier jour demandé (inclus)
///
/// # Retourne
/// Les barres journalières triées par date. Un Vec vide signifie
/// "rien de nouveau" (ex: week-end), ce n'est pas une erreur.
#[instrument(skip(client))]
pub async fn fetch_daily_history(client: &Client, symbol: &str, since: NaiveDate) -> Result<Vec<PriceRecord>> {
    let period1 = since
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .context("Date de début invalide")?;
    let period2 = Utc::now().timestamp();

    let url = build_yahoo_url(symbol, period1, period2)?;
    debug!(url = %url, "Built Yahoo Finance API URL");

    let response = client
        .get(url)
        .send()
        .await
        .context("Échec de la requête HTTP vers Yahoo Finance")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    // Vérifie que la réponse est un succès HTTP (200-299)
    if !status.is_success() {
        error!(status = %status, "Yahoo Finance returned error status");
        anyhow::bail!("Yahoo Finance a retourné une erreur : HTTP {}", status);
    }

    let yahoo_response: YahooResponse = response
        .json()
        .await
        .context("Échec du parsing JSON de la réponse Yahoo")?;

    let records = parse_yahoo_response(yahoo_response, symbol)?;

    info!(bars = records.len(), "Successfully fetched daily history");
    Ok(records)
}

/// Construit l'URL de l'API Yahoo Finance
///
/// Le symbole est ajouté comme segment de chemin : les caractères
/// spéciaux ("^VIX", "DX-Y.NYB") sont pris en charge par Url.
fn build_yahoo_url(symbol: &str, period1: i64, period2: i64) -> Result<Url> {
    let mut url = Url::parse(YAHOO_CHART_URL).context("URL Yahoo Finance invalide")?;

    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("URL Yahoo Finance sans chemin"))?
        .push(symbol);

    url.query_pairs_mut()
        .append_pair("interval", "1d")
        .append_pair("period1", &period1.to_string())
        .append_pair("period2", &period2.to_string());

    Ok(url)
}

/// Valeur à l'index i d'un tableau Yahoo (les trous sont des null)
///
/// CONCEPT RUST : Option::flatten
/// - get(i) -> Option<&Option<T>>, copied() puis flatten() -> Option<T>
fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Convertit la réponse Yahoo en enregistrements de prix
///
/// Les barres sans cours de clôture sont ignorées.
fn parse_yahoo_response(yahoo_response: YahooResponse, symbol: &str) -> Result<Vec<PriceRecord>> {
    if let Some(err) = yahoo_response.chart.error.filter(|e| !e.is_null()) {
        anyhow::bail!("Yahoo Finance a retourné une erreur pour {} : {}", symbol, err);
    }

    // Aucun résultat : rien de nouveau sur la période
    let Some(result) = yahoo_response.chart.result.and_then(|r| r.into_iter().next()) else {
        warn!(symbol, "Yahoo Finance returned no result");
        return Ok(Vec::new());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    debug!(timestamp_count = timestamps.len(), "Received timestamps from Yahoo");

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("Pas de données OHLC dans la réponse")?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut skipped_count = 0;
    let mut records = Vec::with_capacity(timestamps.len());

    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = at(&closes, i) else {
            skipped_count += 1;
            continue;
        };

        let date = DateTime::from_timestamp(timestamp, 0)
            .context("Timestamp invalide")?
            .date_naive();

        records.push(PriceRecord {
            date: date.format(DATE_FORMAT).to_string(),
            open: at(&opens, i),
            high: at(&highs, i),
            low: at(&lows, i),
            close,
            volume: at(&volumes, i),
        });
    }

    if skipped_count > 0 {
        warn!(
            skipped = skipped_count,
            total = timestamps.len(),
            "Skipped bars with missing close"
        );
    }

    Ok(records)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_yahoo_url() {
        let url = build_yahoo_url("^VIX", 0, 86400).unwrap();
        let text = url.as_str();
        assert!(text.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/"));
        assert!(text.contains("VIX"));
        assert!(text.contains("interval=1d"));
        assert!(text.contains("period2=86400"));
    }

    #[test]
    fn test_parse_skips_missing_close() {
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "SPY"},
            "timestamp": [1577975400, 1578061800],
            "indicators": {"quote": [{
                "open": [323.5, null],
                "high": [324.9, null],
                "low": [322.5, null],
                "close": [324.8, null],
                "volume": [59151200, null]
            }]}
        }], "error": null}}"#;
        let response: YahooResponse = serde_json::from_str(json).unwrap();

        let records = parse_yahoo_response(response, "SPY").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2020-01-02");
        assert_eq!(records[0].close, 324.8);
        assert_eq!(records[0].volume, Some(59151200));
    }

    #[test]
    fn test_parse_reports_api_error() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let response: YahooResponse = serde_json::from_str(json).unwrap();
        assert!(parse_yahoo_response(response, "NOPE").is_err());
    }

    // Test avec un vrai appel API (peut échouer si pas de connexion)
    #[tokio::test]
    async fn test_fetch_daily_history() {
        let client = crate::api::http_client().unwrap();
        let since = (Utc::now() - chrono::Duration::days(10)).date_naive();

        match fetch_daily_history(&client, "SPY", since).await {
            Ok(records) => {
                assert!(records.iter().all(|r| r.close > 0.0));
                println!("✓ Récupéré {} barres pour SPY", records.len());
            }
            Err(e) => {
                println!("⚠ Test skippé (pas de connexion?) : {}", e);
            }
        }
    }
}
