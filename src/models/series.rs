// ============================================================================
// Structures : TimeSeriesPoint, Series, SeriesRecord
// ============================================================================
// Représente une série temporelle journalière (prix ou indicateur macro)
//
// CONCEPTS RUST :
// 1. NaiveDate : date calendaire sans fuseau horaire (résolution au jour)
// 2. Enum "tagged union" : deux formats JSON amont normalisés en un seul type
// 3. Invariant porté par le type : dates strictement croissantes
// ============================================================================

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Format des dates dans les fichiers JSON (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse une date "YYYY-MM-DD", en ignorant une éventuelle partie horaire
///
/// Exemple : "2020-01-02T00:00:00.000Z" -> 2020-01-02
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next()?.trim();
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

/// Un point d'une série : (date, valeur)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Plage de dates inclusive [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Crée une plage ; les bornes sont remises dans l'ordre si besoin
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Élargit la plage de `days` jours de chaque côté
    ///
    /// Les bornes s'arrêtent aux limites du calendrier de chrono.
    pub fn padded(&self, days: i64) -> Self {
        let delta = Duration::days(days);
        Self {
            start: self.start.checked_sub_signed(delta).unwrap_or(NaiveDate::MIN),
            end: self.end.checked_add_signed(delta).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Nombre de jours couverts (au moins 1)
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

// ============================================================================
// Formats amont (tagged union)
// ============================================================================
// CONCEPT RUST : #[serde(untagged)]
// - Serde essaie chaque variant dans l'ordre (Price, puis Observation)
// - Permet d'accepter {date, close} OU {date, value} sans champ discriminant
// - Les fichiers tickers/ sont lus directement en Vec<SeriesRecord>
// ============================================================================

/// Enregistrement de prix (fichiers tickers/{ID}_history.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

/// Observation au format FRED : la valeur est une chaîne ("." = manquante)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: String,
    pub value: String,
}

/// Document FRED complet ({ observations: [...] })
///
/// Les autres champs de la réponse FRED sont conservés tels quels
/// pour que le fichier réécrit reste identique à la réponse de l'API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationDocument {
    pub observations: Vec<ObservationRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Un enregistrement brut, quel que soit son format d'origine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeriesRecord {
    Price(PriceRecord),
    Observation(ObservationRecord),
}

impl SeriesRecord {
    /// Normalise l'enregistrement en point canonique
    ///
    /// Retourne None si la date ou la valeur est illisible
    /// (ex: valeur FRED "." pour une observation manquante)
    pub fn normalize(&self) -> Option<TimeSeriesPoint> {
        match self {
            SeriesRecord::Price(p) => {
                let date = parse_day(&p.date)?;
                p.close.is_finite().then(|| TimeSeriesPoint::new(date, p.close))
            }
            SeriesRecord::Observation(o) => {
                let date = parse_day(&o.date)?;
                let value: f64 = o.value.trim().parse().ok()?;
                value.is_finite().then(|| TimeSeriesPoint::new(date, value))
            }
        }
    }
}

impl From<PriceRecord> for SeriesRecord {
    fn from(record: PriceRecord) -> Self {
        SeriesRecord::Price(record)
    }
}

impl From<ObservationRecord> for SeriesRecord {
    fn from(record: ObservationRecord) -> Self {
        SeriesRecord::Observation(record)
    }
}

// ============================================================================
// Series
// ============================================================================

/// Série temporelle ordonnée (dates strictement croissantes, uniques)
///
/// CONCEPT RUST : Encapsulation
/// - Le Vec est privé : on ne peut construire une Series que via
///   les constructeurs qui garantissent l'invariant d'ordre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<TimeSeriesPoint>,
}

impl Series {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Construit une série depuis des points quelconques
    ///
    /// Les points sont triés par date ; en cas de doublon, la première
    /// occurrence est conservée.
    pub fn from_points(points: impl IntoIterator<Item = TimeSeriesPoint>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in points {
            by_date.entry(point.date).or_insert(point.value);
        }
        Self {
            points: by_date
                .into_iter()
                .map(|(date, value)| TimeSeriesPoint::new(date, value))
                .collect(),
        }
    }

    /// Normalise des enregistrements bruts en série
    ///
    /// Les enregistrements illisibles sont ignorés. L'ordre source est
    /// préservé lorsqu'il est déjà chronologique.
    pub fn from_records<R>(records: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<SeriesRecord>,
    {
        Self::from_points(records.into_iter().filter_map(|r| r.into().normalize()))
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TimeSeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    /// Cherche le point exactement à la date donnée
    ///
    /// CONCEPT RUST : binary_search_by_key
    /// - O(log n) grâce à l'invariant de tri
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Sous-slice des points compris dans la plage (bornes incluses)
    pub fn window(&self, range: DateRange) -> &[TimeSeriesPoint] {
        let start = self.points.partition_point(|p| p.date < range.start);
        let end = self.points.partition_point(|p| p.date <= range.end);
        &self.points[start..end.max(start)]
    }

    /// Fusionne des points plus récents (mise à jour incrémentale)
    ///
    /// Les dates déjà présentes sont conservées telles quelles,
    /// seules les nouvelles dates sont ajoutées. Retourne le nombre d'ajouts.
    pub fn merge(&mut self, newer: impl IntoIterator<Item = TimeSeriesPoint>) -> usize {
        let before = self.points.len();
        let merged = Series::from_points(self.points.drain(..).chain(newer));
        self.points = merged.points;
        self.points.len() - before
    }
}

/// Calcule (min, max) d'un itérateur de f64 en ignorant les NaN
pub fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ============================================================================
// Tests unitaires
// ============================================================================
