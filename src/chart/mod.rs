// ============================================================================
// Module : chart
// ============================================================================
// Description déclarative des graphiques, indépendante du rendu :
// - traces (lignes de données)
// - rectangles de surimpression (événements historiques)
// - annotations textuelles
// - plages des axes
//
// Le rendu ratatui (ui/chart.rs) ne fait que dessiner un ChartFigure.
// ============================================================================

pub mod sync;  // Synchronisation des plages entre graphiques
pub mod trace; // Construction des traces, surimpressions et annotations

pub use sync::{AxisView, RangeSync};
pub use trace::TraceBuilder;

use chrono::NaiveDate;

use crate::models::series::min_max;
use crate::models::DateRange;

/// Nom de la trace "érosion du dollar"
pub const DOLLAR_EROSION_NAME: &str = "Dollar Value Erosion";

/// Couleur de la trace "érosion du dollar"
pub const DOLLAR_EROSION_COLOR: &str = "rgba(128, 128, 128, 0.8)";

/// Opacité des rectangles d'événements
pub const OVERLAY_OPACITY: f64 = 0.3;

/// Style de ligne
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// Point d'une trace, avec les informations affichées au survol
#[derive(Debug, Clone, PartialEq)]
pub struct TracePoint {
    pub date: NaiveDate,
    /// Valeur tracée (ajustée à l'inflation si activé)
    pub value: f64,
    /// Variation depuis la date de référence ("+12.34%")
    pub change: Option<String>,
    /// "Équivaut à $x aujourd'hui"
    pub dollar_equivalent: Option<f64>,
}

impl TracePoint {
    pub fn plain(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            change: None,
            dollar_equivalent: None,
        }
    }
}

/// Une ligne du graphique
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Identifiant de l'instrument (ou nom pour les traces dérivées)
    pub id: String,
    /// Nom affiché dans la légende
    pub name: String,
    /// Couleur CSS ("#rrggbb" ou "rgba(...)")
    pub color: String,
    pub style: LineStyle,
    /// Points triés par date
    pub points: Vec<TracePoint>,
}

impl Trace {
    /// Points compris dans la plage (bornes incluses)
    pub fn window(&self, range: DateRange) -> &[TracePoint] {
        let start = self.points.partition_point(|p| p.date < range.start);
        let end = self.points.partition_point(|p| p.date <= range.end);
        &self.points[start..end.max(start)]
    }

    /// Point exactement à la date donnée
    pub fn point_at(&self, date: NaiveDate) -> Option<&TracePoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Dernier point à une date <= `date` (curseur du graphique)
    pub fn point_at_or_before(&self, date: NaiveDate) -> Option<&TracePoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| &self.points[i])
    }
}

/// Rectangle vertical couvrant toute la hauteur du graphique
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub color: &'static str,
    pub opacity: f64,
}

/// Position verticale d'une annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationY {
    /// Coordonnée dans l'unité des données
    Data(f64),
    /// Fraction de la hauteur du graphique (0 = bas, 1 = haut)
    Paper(f64),
}

/// Texte ancré à une date
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: NaiveDate,
    pub y: AnnotationY,
    pub text: String,
    pub color: &'static str,
}

/// Description complète d'un graphique
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartFigure {
    pub traces: Vec<Trace>,
    pub shapes: Vec<Shape>,
    pub annotations: Vec<Annotation>,
    /// Plage horizontale (None = aucune donnée)
    pub x_range: Option<DateRange>,
    /// true : l'axe vertical s'ajuste aux données visibles dans x_range
    pub y_autorange: bool,
}

impl ChartFigure {
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(|t| t.points.is_empty())
    }

    /// Bornes de l'axe vertical
    ///
    /// - y_autorange : min/max des points visibles dans x_range
    /// - sinon : min/max de toutes les données
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let values: Box<dyn Iterator<Item = f64> + '_> = match (self.y_autorange, self.x_range) {
            (true, Some(range)) => Box::new(
                self.traces
                    .iter()
                    .flat_map(move |t| t.window(range).iter().map(|p| p.value)),
            ),
            _ => Box::new(self.traces.iter().flat_map(|t| t.points.iter().map(|p| p.value))),
        };

        let (lo, hi) = min_max(values)?;
        if lo == hi {
            // Ligne plate : on ouvre un peu l'axe pour qu'elle reste visible
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
            Some((lo - pad, hi + pad))
        } else {
            Some((lo, hi))
        }
    }

    /// Convertit la position d'une annotation en coordonnée de données
    pub fn annotation_value(&self, y: AnnotationY) -> Option<f64> {
        match y {
            AnnotationY::Data(v) => Some(v),
            AnnotationY::Paper(fraction) => {
                let (lo, hi) = self.y_bounds()?;
                Some(lo + (hi - lo) * fraction)
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn trace(points: &[(&str, f64)]) -> Trace {
        Trace {
            id: "T".into(),
            name: "T".into(),
            color: "#000000".into(),
            style: LineStyle::Solid,
            points: points.iter().map(|&(d, v)| TracePoint::plain(day(d), v)).collect(),
        }
    }

    #[test]
    fn test_y_bounds_follow_autorange() {
        let mut figure = ChartFigure {
            traces: vec![trace(&[("2020-01-01", 1.0), ("2020-06-01", 5.0), ("2021-01-01", 50.0)])],
            x_range: Some(DateRange::new(day("2020-01-01"), day("2020-12-31"))),
            ..Default::default()
        };

        assert_eq!(figure.y_bounds(), Some((1.0, 50.0)));

        figure.y_autorange = true;
        assert_eq!(figure.y_bounds(), Some((1.0, 5.0)));
    }

    #[test]
    fn test_paper_annotation_maps_to_bounds() {
        let figure = ChartFigure {
            traces: vec![trace(&[("2020-01-01", 0.0), ("2020-06-01", 100.0)])],
            ..Default::default()
        };
        assert_eq!(figure.annotation_value(AnnotationY::Paper(0.25)), Some(25.0));
        assert_eq!(figure.annotation_value(AnnotationY::Data(7.0)), Some(7.0));
    }

    #[test]
    fn test_point_at_or_before() {
        let t = trace(&[("2020-01-02", 1.0), ("2020-01-06", 2.0)]);
        assert_eq!(t.point_at_or_before(day("2020-01-04")).map(|p| p.value), Some(1.0));
        assert!(t.point_at_or_before(day("2020-01-01")).is_none());
        assert!(t.point_at(day("2020-01-04")).is_none());
    }
}
