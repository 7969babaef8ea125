// ============================================================================
// Cache disque (fichiers JSON)
// ============================================================================
// Arborescence sous le répertoire de données :
//
//   tickers/{ID}_history.json              [{date, open, high, low, close, volume}]
//   fredData/{ID}.json                     {observations: [{date, value}], ...}
//   consumer-price-index/cpi_data.json     [{date, value}]
//
// CONCEPTS RUST :
// 1. tokio::fs : entrées/sorties fichiers non-bloquantes
// 2. Deux familles d'erreurs : LoadError (lecture d'une série, non fatale)
//    et anyhow (écritures de la mise à jour, avec contexte)
// ============================================================================

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::SeriesLoader;
use crate::error::LoadError;
use crate::models::instrument as catalog;
use crate::models::{CpiRecord, CpiTable, ObservationDocument, PriceRecord, Series, SeriesRecord};

const TICKERS_DIR: &str = "tickers";
const FRED_DIR: &str = "fredData";
const CPI_DIR: &str = "consumer-price-index";
const CPI_FILE: &str = "cpi_data.json";

/// Accès au cache JSON sur disque
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // Chemins
    // ========================================================================

    pub fn price_path(&self, id: &str) -> PathBuf {
        self.root.join(TICKERS_DIR).join(format!("{}_history.json", id))
    }

    pub fn fred_path(&self, id: &str) -> PathBuf {
        self.root.join(FRED_DIR).join(format!("{}.json", id))
    }

    pub fn cpi_path(&self) -> PathBuf {
        self.root.join(CPI_DIR).join(CPI_FILE)
    }

    /// Fichier d'une série selon le type d'instrument
    pub fn series_path(&self, id: &str) -> PathBuf {
        if catalog::kind_of(id).is_macro() {
            self.fred_path(id)
        } else {
            self.price_path(id)
        }
    }

    // ========================================================================
    // Lecture
    // ========================================================================

    /// Lit et parse un fichier JSON ; Ok(None) si le fichier n'existe pas
    async fn read_json<T: DeserializeOwned>(&self, id: &str, path: &Path) -> Result<Option<T>, LoadError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LoadError::Io {
                    id: id.to_string(),
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| LoadError::Parse { id: id.to_string(), source })
    }

    /// Historique de prix d'un instrument (None si jamais téléchargé)
    pub async fn read_price_history(&self, id: &str) -> Result<Option<Vec<PriceRecord>>, LoadError> {
        self.read_json(id, &self.price_path(id)).await
    }

    /// Document FRED d'un indicateur (None si jamais téléchargé)
    pub async fn read_observations(&self, id: &str) -> Result<Option<ObservationDocument>, LoadError> {
        self.read_json(id, &self.fred_path(id)).await
    }

    /// Table CPI, triée par date ; vide si le fichier est absent
    pub async fn read_cpi(&self) -> Result<CpiTable, LoadError> {
        let records: Option<Vec<CpiRecord>> = self.read_json("CPI", &self.cpi_path()).await?;
        match records {
            Some(records) => Ok(CpiTable::from_records(&records)),
            None => {
                warn!(path = %self.cpi_path().display(), "CPI file not found, inflation adjustment unavailable");
                Ok(CpiTable::default())
            }
        }
    }

    /// Charge et normalise la série d'un instrument
    ///
    /// Un fichier absent est une erreur d'I/O : l'instrument n'a pas été
    /// téléchargé (lancer `marketnav update`).
    #[instrument(skip(self))]
    pub async fn load_series(&self, id: &str) -> Result<Series, LoadError> {
        let path = self.series_path(id);
        let missing = || LoadError::Io {
            id: id.to_string(),
            path: path.display().to_string(),
            source: std::io::Error::from(ErrorKind::NotFound),
        };

        let series = if catalog::kind_of(id).is_macro() {
            let doc = self.read_observations(id).await?.ok_or_else(missing)?;
            Series::from_records(doc.observations)
        } else {
            let records: Vec<SeriesRecord> =
                self.read_json(id, &self.price_path(id)).await?.ok_or_else(missing)?;
            Series::from_records(records)
        };

        debug!(id, points = series.len(), "Series read from disk");
        Ok(series)
    }

    // ========================================================================
    // Écriture
    // ========================================================================

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Impossible de créer le répertoire {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(value).context("Échec de la sérialisation JSON")?;

        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;

        debug!(path = %path.display(), "JSON file written");
        Ok(())
    }

    pub async fn write_price_history(&self, id: &str, records: &[PriceRecord]) -> Result<()> {
        self.write_json(&self.price_path(id), records).await
    }

    pub async fn write_observations(&self, id: &str, doc: &ObservationDocument) -> Result<()> {
        self.write_json(&self.fred_path(id), doc).await
    }

    pub async fn write_cpi(&self, table: &CpiTable) -> Result<()> {
        self.write_json(&self.cpi_path(), &table.to_records()).await
    }
}

impl SeriesLoader for DataStore {
    fn load(&self, id: &str) -> impl Future<Output = Result<Series, LoadError>> + Send {
        let store = self.clone();
        let id = id.to_string();
        async move { store.load_series(&id).await }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SeriesCache;
    use crate::models::ObservationRecord;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_paths() {
        let store = DataStore::new("/data");
        assert_eq!(store.series_path("SPY"), PathBuf::from("/data/tickers/SPY_history.json"));
        assert_eq!(store.series_path("UNRATE"), PathBuf::from("/data/fredData/UNRATE.json"));
        assert_eq!(store.series_path("UST10Y"), PathBuf::from("/data/fredData/UST10Y.json"));
        assert_eq!(store.cpi_path(), PathBuf::from("/data/consumer-price-index/cpi_data.json"));
    }

    #[tokio::test]
    async fn test_price_history_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("tickers")).unwrap();
        std::fs::write(
            store.price_path("SPY"),
            r#"[
                {"date": "2020-01-02T00:00:00.000Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100, "adjClose": 1.4},
                {"date": "2020-01-03T00:00:00.000Z", "close": 1.6}
            ]"#,
        )
        .unwrap();

        let series = store.load_series("SPY").await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.value_at(day("2020-01-02")), Some(1.5));
    }

    #[tokio::test]
    async fn test_observations_round_trip_keep_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let doc: ObservationDocument = serde_json::from_str(
            r#"{"units": "lin", "count": 2, "observations": [
                {"realtime_start": "2024-01-01", "date": "2020-01-01", "value": "3.5"},
                {"date": "2020-02-01", "value": "."}
            ]}"#,
        )
        .unwrap();

        store.write_observations("UNRATE", &doc).await.unwrap();
        let again = store.read_observations("UNRATE").await.unwrap().unwrap();

        assert_eq!(again.extra.get("units"), Some(&serde_json::json!("lin")));
        assert_eq!(
            again.observations[1],
            ObservationRecord { date: "2020-02-01".into(), value: ".".into() }
        );

        let series = store.load_series("UNRATE").await.unwrap();
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_leaves_empty_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let mut cache = SeriesCache::new();

        let result = cache.ensure_loaded("QQQ", &store).await;

        assert!(matches!(result, Err(LoadError::Io { .. })));
        assert_eq!(cache.series("QQQ").map(|s| s.is_empty()), Some(true));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("tickers")).unwrap();
        std::fs::write(store.price_path("SPY"), "not json").unwrap();

        let result = store.load_series("SPY").await;
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_cpi_is_sorted_and_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        assert!(store.read_cpi().await.unwrap().is_empty());

        let table = CpiTable::from_records(&[
            CpiRecord { date: "2024-02-01".into(), value: 310.0 },
            CpiRecord { date: "2024-01-01".into(), value: 308.0 },
        ]);
        store.write_cpi(&table).await.unwrap();

        let again = store.read_cpi().await.unwrap();
        assert_eq!(again.base(), Some(310.0));
        assert_eq!(again.len(), 2);
    }
}
