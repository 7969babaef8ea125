// ============================================================================
// Structure : CpiTable
// ============================================================================
// Table de l'indice des prix à la consommation (CPI), utilisée comme
// déflateur pour l'ajustement à l'inflation.
//
// La valeur de base est TOUJOURS la dernière entrée : la table est donc
// triée par date (et dédoublonnée) à la construction, quel que soit
// l'ordre du fichier source.
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::series::{parse_day, Series, TimeSeriesPoint};

/// Entrée brute du fichier cpi_data.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiRecord {
    pub date: String,
    pub value: f64,
}

/// Table CPI triée par date croissante
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpiTable {
    series: Series,
}

impl CpiTable {
    /// Construit la table depuis des points dans un ordre quelconque
    pub fn from_points(points: impl IntoIterator<Item = TimeSeriesPoint>) -> Self {
        Self {
            series: Series::from_points(points),
        }
    }

    /// Construit la table depuis les enregistrements du fichier JSON
    pub fn from_records(records: &[CpiRecord]) -> Self {
        Self::from_points(records.iter().filter_map(|r| {
            let date = parse_day(&r.date)?;
            r.value.is_finite().then(|| TimeSeriesPoint::new(date, r.value))
        }))
    }

    /// Reconvertit la table en enregistrements (pour l'écriture disque)
    pub fn to_records(&self) -> Vec<CpiRecord> {
        self.series
            .points()
            .iter()
            .map(|p| CpiRecord {
                date: p.date.format("%Y-%m-%d").to_string(),
                value: p.value,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn entries(&self) -> &[TimeSeriesPoint] {
        self.series.points()
    }

    /// Valeur de base : CPI le plus récent
    pub fn base(&self) -> Option<f64> {
        self.series.last().map(|p| p.value)
    }

    /// Date de la dernière entrée
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series.last().map(|p| p.date)
    }

    /// Valeur exacte à une date (entrées mensuelles datées du 1er)
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.series.value_at(date)
    }

    /// Fusionne de nouvelles observations : les nouvelles valeurs écrasent
    /// les anciennes à date égale. Retourne le nombre de dates ajoutées.
    pub fn merge_overwrite(&mut self, newer: impl IntoIterator<Item = TimeSeriesPoint>) -> usize {
        let before = self.series.len();
        let newer: Vec<TimeSeriesPoint> = newer.into_iter().collect();
        // Series::from_points garde la première occurrence : les nouveaux points passent devant
        let merged = Series::from_points(
            newer
                .iter()
                .copied()
                .chain(self.series.points().iter().copied()),
        );
        self.series = merged;
        self.series.len() - before
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
