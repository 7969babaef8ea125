// ============================================================================
// Mise à jour du cache de données (`marketnav update`)
// ============================================================================
// Pipeline séquentiel, une requête à la fois avec une pause entre chaque :
//
// 1. Historique de prix (Yahoo Finance) pour chaque instrument du catalogue
//    - fichier existant : téléchargement depuis le lendemain de la dernière
//      date, fusion par date (les entrées existantes sont conservées)
//    - sinon : historique complet depuis history_start
// 2. CPI (FRED CPIAUCSL) : fusion par date, les nouvelles valeurs écrasent
// 3. Rendement du Trésor à 10 ans (FRED DGS10 -> fredData/UST10Y.json)
// 4. Catalogue d'indicateurs macro (FRED), enregistrés tels quels
//
// Chaque échec est loggé et le pipeline passe à l'élément suivant.
// ============================================================================

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::api::{self, fred, yahoo};
use crate::config::Config;
use crate::models::instrument::{self, TREASURY_10Y};
use crate::models::series::parse_day;
use crate::models::{CpiTable, PriceRecord, Series};
use crate::store::DataStore;

/// Résultat de la mise à jour d'un historique de prix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUpdate {
    /// Premier téléchargement complet (nombre de barres)
    Downloaded(usize),
    /// Fusion incrémentale (nombre de nouvelles dates)
    Merged(usize),
    /// Déjà à jour, rien à écrire
    UpToDate,
    /// Réponse vide : le fichier existant est conservé
    NoData,
}

/// Bilan de la mise à jour
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl UpdateSummary {
    fn record(&mut self, outcome: &Result<bool>) {
        match outcome {
            Ok(true) => self.written += 1,
            Ok(false) => self.unchanged += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Fusionne des barres récentes dans un historique existant
///
/// Les dates déjà présentes sont conservées, le résultat est trié par date.
/// Les enregistrements dont la date est illisible sont ignorés.
/// Retourne (historique fusionné, nombre de nouvelles dates).
pub fn merge_price_records(existing: Vec<PriceRecord>, newer: Vec<PriceRecord>) -> (Vec<PriceRecord>, usize) {
    let mut by_date: BTreeMap<NaiveDate, PriceRecord> = BTreeMap::new();
    for record in existing {
        if let Some(date) = parse_day(&record.date) {
            by_date.entry(date).or_insert(record);
        }
    }

    let before = by_date.len();
    for record in newer {
        if let Some(date) = parse_day(&record.date) {
            by_date.entry(date).or_insert(record);
        }
    }
    let added = by_date.len() - before;

    (by_date.into_values().collect(), added)
}

/// Dernière date d'un historique (ordre du fichier non supposé)
fn last_date(records: &[PriceRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| parse_day(&r.date)).max()
}

/// Met à jour l'historique de prix d'un instrument
pub async fn update_price_history(
    client: &Client,
    store: &DataStore,
    id: &str,
    history_start: NaiveDate,
    today: NaiveDate,
) -> Result<PriceUpdate> {
    let existing = store.read_price_history(id).await?.unwrap_or_default();

    match last_date(&existing) {
        Some(last) => {
            let since = last + Duration::days(1);
            if since > today {
                info!(id, %last, "Price history already up to date");
                return Ok(PriceUpdate::UpToDate);
            }

            info!(id, %since, "Fetching new bars");
            let newer = yahoo::fetch_daily_history(client, id, since).await?;
            if newer.is_empty() {
                warn!(id, "No new data, keeping existing file");
                return Ok(PriceUpdate::NoData);
            }

            let (merged, added) = merge_price_records(existing, newer);
            if added == 0 {
                return Ok(PriceUpdate::UpToDate);
            }
            store.write_price_history(id, &merged).await?;
            info!(id, added, total = merged.len(), "Price history updated");
            Ok(PriceUpdate::Merged(added))
        }
        None => {
            info!(id, since = %history_start, "Downloading complete history");
            let records = yahoo::fetch_daily_history(client, id, history_start).await?;
            if records.is_empty() {
                warn!(id, "No data returned");
                return Ok(PriceUpdate::NoData);
            }

            let (records, count) = merge_price_records(Vec::new(), records);
            store.write_price_history(id, &records).await?;
            info!(id, count, "Price history saved");
            Ok(PriceUpdate::Downloaded(count))
        }
    }
}

/// Met à jour la table CPI ; retourne true si le fichier a été réécrit
pub async fn update_cpi(client: &Client, store: &DataStore, api_key: &str) -> Result<bool> {
    let mut table = store.read_cpi().await?;
    let start = table.last_date();
    if let Some(start) = start {
        info!(%start, "Found existing CPI data");
    }

    let doc = fred::fetch_observations(client, api_key, fred::CPI_SERIES_ID, start).await?;
    if doc.observations.is_empty() {
        info!("No new CPI data available");
        return Ok(false);
    }

    let fresh = Series::from_records(doc.observations);
    let added = merge_cpi(&mut table, &fresh);
    if added == 0 {
        info!("No new unique CPI entries");
        return Ok(false);
    }

    store.write_cpi(&table).await?;
    info!(added, total = table.len(), "CPI data saved");
    Ok(true)
}

/// Fusionne de nouvelles observations CPI (les nouvelles valeurs écrasent)
pub fn merge_cpi(table: &mut CpiTable, fresh: &Series) -> usize {
    table.merge_overwrite(fresh.points().iter().copied())
}

/// Télécharge une série FRED complète et l'enregistre sous `save_as`
pub async fn save_fred_series(
    client: &Client,
    store: &DataStore,
    api_key: &str,
    series_id: &str,
    save_as: &str,
) -> Result<bool> {
    let doc = fred::fetch_observations(client, api_key, series_id, None).await?;
    store.write_observations(save_as, &doc).await?;
    info!(series_id, save_as, observations = doc.observations.len(), "FRED series saved");
    Ok(true)
}

/// Exécute le pipeline complet
pub async fn run_update(config: &Config) -> Result<UpdateSummary> {
    let client = api::http_client()?;
    let store = DataStore::new(&config.data_dir);
    let today = Local::now().date_naive();
    let mut summary = UpdateSummary::default();

    info!(data_dir = %config.data_dir.display(), "Starting data update");

    // 1. Historiques de prix
    let ids: Vec<&str> = instrument::price_ids().collect();
    for (i, id) in ids.iter().enumerate() {
        info!(id, progress = i + 1, total = ids.len(), "Updating price history");
        let outcome = update_price_history(&client, &store, id, config.history_start, today)
            .await
            .map(|u| matches!(u, PriceUpdate::Downloaded(_) | PriceUpdate::Merged(_)));
        if let Err(e) = &outcome {
            error!(id, error = ?e, "Failed to update price history");
        }
        summary.record(&outcome);
        tokio::time::sleep(config.request_delay).await;
    }

    // 2-4. Séries FRED
    let Some(api_key) = config.fred_api_key.as_deref() else {
        error!("FRED_API_KEY is not set, skipping CPI and macro indicators");
        return Ok(summary);
    };

    let outcome = update_cpi(&client, &store, api_key).await;
    if let Err(e) = &outcome {
        error!(error = ?e, "Failed to update CPI data");
    }
    summary.record(&outcome);

    let mut fred_jobs = vec![(fred::TREASURY_SERIES_ID, TREASURY_10Y)];
    fred_jobs.extend(fred::MACRO_SERIES.iter().map(|&id| (id, id)));

    for (series_id, save_as) in fred_jobs {
        tokio::time::sleep(config.request_delay).await;
        let outcome = save_fred_series(&client, &store, api_key, series_id, save_as).await;
        if let Err(e) = &outcome {
            error!(series_id, error = ?e, "Failed to fetch FRED series");
        }
        summary.record(&outcome);
    }

    info!(
        written = summary.written,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "Data update finished"
    );
    Ok(summary)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpiRecord, ObservationRecord};

    fn bar(date: &str, close: f64) -> PriceRecord {
        PriceRecord {
            date: date.to_string(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    #[test]
    fn test_merge_keeps_existing_and_sorts() {
        let existing = vec![
            bar("2020-01-03T00:00:00.000Z", 2.0),
            bar("2020-01-02T00:00:00.000Z", 1.0),
        ];
        let newer = vec![bar("2020-01-03", 99.0), bar("2020-01-06", 3.0)];

        let (merged, added) = merge_price_records(existing, newer);

        assert_eq!(added, 1);
        let closes: Vec<f64> = merged.iter().map(|r| r.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_last_date_ignores_file_order() {
        let records = vec![bar("2020-01-06", 3.0), bar("2020-01-02", 1.0)];
        assert_eq!(last_date(&records), NaiveDate::from_ymd_opt(2020, 1, 6));
        assert_eq!(last_date(&[]), None);
    }

    #[test]
    fn test_cpi_merge_overwrites_and_skips_missing() {
        let mut table = CpiTable::from_records(&[
            CpiRecord { date: "2024-01-01".into(), value: 308.0 },
            CpiRecord { date: "2024-02-01".into(), value: 310.0 },
        ]);
        let fresh = Series::from_records(vec![
            ObservationRecord { date: "2024-02-01".into(), value: "310.3".into() },
            ObservationRecord { date: "2024-03-01".into(), value: "312.1".into() },
            ObservationRecord { date: "2024-04-01".into(), value: ".".into() },
        ]);

        let added = merge_cpi(&mut table, &fresh);

        assert_eq!(added, 1);
        assert_eq!(table.base(), Some(312.1));
        assert_eq!(table.entries()[1].value, 310.3);
    }

    #[tokio::test]
    async fn test_up_to_date_history_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        store
            .write_price_history("SPY", &[bar("2020-01-02", 1.0), bar("2020-01-03", 2.0)])
            .await
            .unwrap();
        let client = api::http_client().unwrap();
        let today = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let start = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();

        let outcome = update_price_history(&client, &store, "SPY", start, today).await.unwrap();

        assert_eq!(outcome, PriceUpdate::UpToDate);
    }
}
