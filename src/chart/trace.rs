// ============================================================================
// Trace Builder
// ============================================================================
// Convertit (cache + sélection + CPI) en graphiques déclaratifs :
// - graphique principal : instruments de prix (+ érosion du dollar)
// - graphique secondaire : indicateurs macro (valeurs brutes)
//
// CONCEPTS RUST :
// 1. Lifetimes : le builder emprunte l'état, il ne possède rien
// 2. Iterator chains : filter_map / map / collect
// ============================================================================

use chrono::NaiveDate;
use tracing::debug;

use crate::cache::SeriesCache;
use crate::chart::{
    Annotation, AnnotationY, AxisView, ChartFigure, LineStyle, Shape, Trace, TracePoint,
    DOLLAR_EROSION_COLOR, DOLLAR_EROSION_NAME, OVERLAY_OPACITY,
};
use crate::models::event::{self, HistoricalEvent};
use crate::models::instrument;
use crate::models::series::min_max;
use crate::models::{CpiTable, DateRange};
use crate::state::SelectionState;
use crate::transform;

/// Décalage vertical des annotations, en fraction de l'amplitude des données
pub const DATA_STAGGER: [f64; 7] = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3];

/// Décalage vertical des annotations, en fraction de la hauteur du graphique
pub const PAPER_STAGGER: [f64; 7] = [0.85, 0.75, 0.65, 0.55, 0.45, 0.35, 0.25];

/// Élargissement de la fenêtre de recherche quand l'événement ne contient
/// aucun point (5 semaines)
pub const EVENT_WINDOW_PADDING_DAYS: i64 = 35;

pub struct TraceBuilder<'a> {
    state: &'a SelectionState,
    cache: &'a SeriesCache,
    cpi: &'a CpiTable,
}

impl<'a> TraceBuilder<'a> {
    pub fn new(state: &'a SelectionState, cache: &'a SeriesCache, cpi: &'a CpiTable) -> Self {
        Self { state, cache, cpi }
    }

    // ========================================================================
    // Graphiques complets
    // ========================================================================

    /// Graphique principal (prix)
    pub fn primary(&self, today: NaiveDate) -> ChartFigure {
        let traces = self.price_traces();
        let (shapes, annotations) = if self.state.show_event_overlays {
            (self.shapes(), self.annotations(&traces))
        } else {
            (Vec::new(), Vec::new())
        };

        let mut all_traces = traces;
        all_traces.extend(self.dollar_erosion_trace());

        ChartFigure {
            traces: all_traces,
            shapes,
            annotations,
            x_range: self.state.visible_range.or_else(|| self.default_range(today)),
            y_autorange: true,
        }
    }

    /// Graphique secondaire (indicateurs macro)
    ///
    /// La plage horizontale vient du synchroniseur (AxisView), sinon la
    /// plage par défaut.
    pub fn secondary(&self, axis: &AxisView, today: NaiveDate) -> ChartFigure {
        let (shapes, annotations) = if self.state.show_macro_event_overlays {
            (self.shapes(), self.macro_annotations())
        } else {
            (Vec::new(), Vec::new())
        };

        ChartFigure {
            traces: self.macro_traces(),
            shapes,
            annotations,
            x_range: axis.x_range.or_else(|| self.default_range(today)),
            y_autorange: axis.y_autorange,
        }
    }

    /// Plage par défaut : date la plus ancienne chargée (tous graphiques
    /// confondus) jusqu'à aujourd'hui
    pub fn default_range(&self, today: NaiveDate) -> Option<DateRange> {
        self.state
            .selected_instruments
            .iter()
            .filter_map(|id| self.cache.series(id))
            .filter_map(|s| s.first().map(|p| p.date))
            .min()
            .map(|earliest| DateRange::new(earliest, today))
    }

    // ========================================================================
    // Traces
    // ========================================================================

    /// Valeur tracée : ajustée à l'inflation si l'option est active
    fn plotted(&self, raw: f64, date: NaiveDate) -> f64 {
        if self.state.adjust_for_inflation {
            transform::adjust_for_inflation(raw, date, self.cpi)
        } else {
            raw
        }
    }

    /// Une trace par instrument de prix sélectionné, dans l'ordre de sélection
    ///
    /// Les instruments encore en chargement sont ignorés.
    pub fn price_traces(&self) -> Vec<Trace> {
        self.state
            .selected_instruments
            .iter()
            .filter(|id| !instrument::kind_of(id).is_macro())
            .filter_map(|id| {
                let series = self.cache.series(id)?;

                let reference = self
                    .state
                    .reference_date
                    .and_then(|date| series.value_at(date).map(|raw| self.plotted(raw, date)));

                let points = series
                    .points()
                    .iter()
                    .map(|p| {
                        let value = self.plotted(p.value, p.date);
                        TracePoint {
                            date: p.date,
                            value,
                            change: reference.and_then(|r| transform::percent_change(value, r)),
                            dollar_equivalent: transform::dollar_equivalent(p.date, self.cpi),
                        }
                    })
                    .collect();

                Some(Trace {
                    id: id.clone(),
                    name: id.clone(),
                    color: instrument::color_of(id).to_string(),
                    style: LineStyle::Solid,
                    points,
                })
            })
            .collect()
    }

    /// Trace pointillée "valeur d'un dollar en dollars d'aujourd'hui"
    pub fn dollar_erosion_trace(&self) -> Option<Trace> {
        if self.cpi.is_empty() {
            return None;
        }
        Some(Trace {
            id: DOLLAR_EROSION_NAME.to_string(),
            name: DOLLAR_EROSION_NAME.to_string(),
            color: DOLLAR_EROSION_COLOR.to_string(),
            style: LineStyle::Dotted,
            points: transform::dollar_erosion(self.cpi)
                .into_iter()
                .map(|p| TracePoint::plain(p.date, p.value))
                .collect(),
        })
    }

    /// Une trace par indicateur macro sélectionné (valeurs brutes)
    pub fn macro_traces(&self) -> Vec<Trace> {
        self.state
            .selected_instruments
            .iter()
            .filter(|id| instrument::kind_of(id).is_macro())
            .filter_map(|id| {
                let series = self.cache.series(id)?;
                Some(Trace {
                    id: id.clone(),
                    name: instrument::trace_name(id),
                    color: instrument::color_of(id).to_string(),
                    style: LineStyle::Solid,
                    points: series
                        .points()
                        .iter()
                        .map(|p| TracePoint::plain(p.date, p.value))
                        .collect(),
                })
            })
            .collect()
    }

    // ========================================================================
    // Surimpressions et annotations
    // ========================================================================

    /// Événements activés, dans l'ordre statique de la liste
    fn enabled_events(&self) -> impl Iterator<Item = &'static HistoricalEvent> + '_ {
        event::events()
            .iter()
            .filter(|e| self.state.is_event_enabled(e.label))
    }

    /// Un rectangle par événement activé, sur toute la hauteur
    pub fn shapes(&self) -> Vec<Shape> {
        self.enabled_events()
            .map(|e| Shape {
                start: e.start,
                end: e.end,
                color: e.color,
                opacity: OVERLAY_OPACITY,
            })
            .collect()
    }

    /// Annotations du graphique principal
    ///
    /// Position verticale en coordonnées de données (premier instrument
    /// ayant des points près de l'événement), sinon en fraction du graphique.
    /// Les indicateurs macro (dont UST10Y) n'ont pas de trace ici : une
    /// sélection sans instrument de prix donne toujours des fractions.
    pub fn annotations(&self, price_traces: &[Trace]) -> Vec<Annotation> {
        self.enabled_events()
            .enumerate()
            .map(|(index, e)| {
                let y = data_position(price_traces, e, index)
                    .map(AnnotationY::Data)
                    .unwrap_or_else(|| {
                        debug!(event = e.label, "No data near event, using chart-fraction position");
                        AnnotationY::Paper(PAPER_STAGGER[index % PAPER_STAGGER.len()])
                    });

                Annotation {
                    x: e.start,
                    y,
                    text: e.annotation_text(),
                    color: e.color,
                }
            })
            .collect()
    }

    /// Annotations du graphique macro : toujours en fraction du graphique
    pub fn macro_annotations(&self) -> Vec<Annotation> {
        self.enabled_events()
            .enumerate()
            .map(|(index, e)| Annotation {
                x: e.start,
                y: AnnotationY::Paper(PAPER_STAGGER[index % PAPER_STAGGER.len()]),
                text: e.annotation_text(),
                color: e.color,
            })
            .collect()
    }
}

/// Position verticale en données : min + (max - min) * décalage
///
/// On cherche le premier instrument ayant des points dans [start, end],
/// puis dans la fenêtre élargie de ±5 semaines.
fn data_position(traces: &[Trace], event: &HistoricalEvent, index: usize) -> Option<f64> {
    let exact = event.range();
    let padded = exact.padded(EVENT_WINDOW_PADDING_DAYS);

    traces.iter().find_map(|trace| {
        let window = match trace.window(exact) {
            [] => trace.window(padded),
            points => points,
        };
        let (lo, hi) = min_max(window.iter().map(|p| p.value))?;
        Some(lo + (hi - lo) * DATA_STAGGER[index % DATA_STAGGER.len()])
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instrument::TREASURY_10Y;
    use crate::models::{CpiRecord, Series, TimeSeriesPoint};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(points: &[(&str, f64)]) -> Series {
        Series::from_points(points.iter().map(|&(d, v)| TimeSeriesPoint::new(day(d), v)))
    }

    fn cache_with(entries: &[(&str, Series)]) -> SeriesCache {
        let mut cache = SeriesCache::new();
        for (id, s) in entries {
            cache.begin_load(id);
            cache.complete_load(id, Ok(s.clone())).unwrap();
        }
        cache
    }

    fn spy() -> Series {
        series(&[
            ("2020-01-02", 100.0),
            ("2020-03-02", 80.0),
            ("2020-03-23", 60.0),
            ("2020-06-01", 120.0),
        ])
    }

    #[test]
    fn test_loading_instruments_are_excluded() {
        let mut state = SelectionState::new();
        state.toggle_instrument("QQQ", true);
        let mut cache = cache_with(&[("SPY", spy())]);
        cache.begin_load("QQQ");
        let cpi = CpiTable::default();

        let traces = TraceBuilder::new(&state, &cache, &cpi).price_traces();

        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].id, "SPY");
    }

    #[test]
    fn test_reference_change_on_points() {
        let mut state = SelectionState::new();
        state.set_reference_date(Some(day("2020-01-02")));
        let cache = cache_with(&[("SPY", spy())]);
        let cpi = CpiTable::default();

        let traces = TraceBuilder::new(&state, &cache, &cpi).price_traces();
        let points = &traces[0].points;

        assert_eq!(points[0].change.as_deref(), Some("+0.00%"));
        assert_eq!(points[3].change.as_deref(), Some("+20.00%"));
        assert_eq!(points[2].change.as_deref(), Some("-40.00%"));
    }

    #[test]
    fn test_reference_missing_from_series_is_skipped() {
        let mut state = SelectionState::new();
        state.set_reference_date(Some(day("2020-01-01")));
        let cache = cache_with(&[("SPY", spy())]);
        let cpi = CpiTable::default();

        let traces = TraceBuilder::new(&state, &cache, &cpi).price_traces();
        assert!(traces[0].points.iter().all(|p| p.change.is_none()));
    }

    #[test]
    fn test_inflation_adjustment_and_erosion_trace() {
        let mut state = SelectionState::new();
        state.set_inflation_adjusted(true);
        let cache = cache_with(&[("SPY", spy())]);
        let cpi = CpiTable::from_records(&[
            CpiRecord { date: "2020-01-01".into(), value: 100.0 },
            CpiRecord { date: "2020-06-01".into(), value: 200.0 },
        ]);

        let figure = TraceBuilder::new(&state, &cache, &cpi).primary(day("2020-12-31"));

        // SPY + érosion du dollar
        assert_eq!(figure.traces.len(), 2);
        let spy = &figure.traces[0];
        assert_eq!(spy.points[0].value, 200.0);
        assert_eq!(spy.points[0].dollar_equivalent, Some(2.0));
        // Mars 2020 absent de la table : valeur brute
        assert_eq!(spy.points[1].value, 80.0);

        let erosion = &figure.traces[1];
        assert_eq!(erosion.style, LineStyle::Dotted);
        assert_eq!(erosion.name, DOLLAR_EROSION_NAME);
    }

    #[test]
    fn test_macro_traces_use_short_names() {
        let mut state = SelectionState::new();
        state.toggle_instrument("UNRATE", true);
        let cache = cache_with(&[("SPY", spy()), ("UNRATE", series(&[("2020-01-01", 3.5)]))]);
        let cpi = CpiTable::default();
        let builder = TraceBuilder::new(&state, &cache, &cpi);

        assert_eq!(builder.price_traces().len(), 1);
        let macros = builder.macro_traces();
        assert_eq!(macros.len(), 1);
        assert_eq!(macros[0].name, "Unemployment");
    }

    #[test]
    fn test_shapes_follow_enabled_events_in_static_order() {
        let mut state = SelectionState::new();
        state.disable_all_events();
        state.toggle_event("COVID-19 Crash", true);
        state.toggle_event("1987 Black Monday", true);
        let cache = SeriesCache::new();
        let cpi = CpiTable::default();

        let shapes = TraceBuilder::new(&state, &cache, &cpi).shapes();

        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].start, day("1987-10-19"));
        assert_eq!(shapes[1].start, day("2020-02-20"));
        assert_eq!(shapes[1].opacity, OVERLAY_OPACITY);
    }

    #[test]
    fn test_annotation_stagger_cycles_after_seven() {
        let mut state = SelectionState::new();
        state.deselect_all();
        state.disable_all_events();
        for e in event::events().iter().take(10) {
            state.toggle_event(e.label, true);
        }
        let cache = SeriesCache::new();
        let cpi = CpiTable::default();

        let annotations = TraceBuilder::new(&state, &cache, &cpi).annotations(&[]);

        assert_eq!(annotations.len(), 10);
        assert_eq!(annotations[0].y, AnnotationY::Paper(0.85));
        assert_eq!(annotations[7].y, annotations[0].y);
        assert_eq!(annotations[8].y, annotations[1].y);
    }

    #[test]
    fn test_annotation_uses_data_coordinates() {
        let mut state = SelectionState::new();
        state.disable_all_events();
        state.toggle_event("COVID-19 Crash", true);
        let cache = cache_with(&[("SPY", spy())]);
        let cpi = CpiTable::default();
        let builder = TraceBuilder::new(&state, &cache, &cpi);

        let annotations = builder.annotations(&builder.price_traces());

        // Points du 2020-03-02 (80) et 2020-03-23 (60) dans l'événement
        assert_eq!(annotations[0].y, AnnotationY::Data(60.0 + 20.0 * 0.9));
        assert_eq!(annotations[0].text, "COVID-19 Crash (2020)");
    }

    #[test]
    fn test_annotation_uses_padded_window() {
        let mut state = SelectionState::new();
        state.disable_all_events();
        state.toggle_event("1987 Black Monday", true);
        let cache = cache_with(&[("SPY", series(&[("1987-10-01", 10.0), ("1987-11-20", 20.0)]))]);
        let cpi = CpiTable::default();
        let builder = TraceBuilder::new(&state, &cache, &cpi);

        let annotations = builder.annotations(&builder.price_traces());
        assert_eq!(annotations[0].y, AnnotationY::Data(10.0 + 10.0 * 0.9));
    }

    #[test]
    fn test_treasury_selection_keeps_price_coordinates() {
        let mut state = SelectionState::new();
        state.disable_all_events();
        state.toggle_event("COVID-19 Crash", true);
        state.toggle_instrument(TREASURY_10Y, true);
        let cache = cache_with(&[
            ("SPY", spy()),
            (TREASURY_10Y, series(&[("2020-03-01", 1.0), ("2020-03-10", 0.5)])),
        ]);
        let cpi = CpiTable::default();
        let builder = TraceBuilder::new(&state, &cache, &cpi);

        // Le rendement vit sur le graphique macro : la position vient de SPY
        let annotations = builder.annotations(&builder.price_traces());
        assert_eq!(annotations[0].y, AnnotationY::Data(60.0 + 20.0 * 0.9));

        // Rendement seul : aucune trace de prix, fractions du graphique
        state.deselect_all();
        assert_eq!(state.selected_instruments, vec![TREASURY_10Y.to_string()]);
        let builder = TraceBuilder::new(&state, &cache, &cpi);
        assert!(builder.price_traces().is_empty());
        let annotations = builder.annotations(&builder.price_traces());
        assert_eq!(annotations[0].y, AnnotationY::Paper(0.85));
    }

    #[test]
    fn test_default_range_spans_both_charts() {
        let mut state = SelectionState::new();
        state.toggle_instrument("UNRATE", true);
        let cache = cache_with(&[("SPY", spy()), ("UNRATE", series(&[("1990-01-01", 5.0)]))]);
        let cpi = CpiTable::default();
        let builder = TraceBuilder::new(&state, &cache, &cpi);

        let range = builder.default_range(day("2024-01-01"));
        assert_eq!(range, Some(DateRange::new(day("1990-01-01"), day("2024-01-01"))));

        let empty = SelectionState {
            selected_instruments: Vec::new(),
            ..SelectionState::new()
        };
        assert_eq!(TraceBuilder::new(&empty, &cache, &cpi).default_range(day("2024-01-01")), None);
    }

    #[test]
    fn test_hidden_overlays_produce_no_shapes() {
        let mut state = SelectionState::new();
        state.show_event_overlays = false;
        let cache = cache_with(&[("SPY", spy())]);
        let cpi = CpiTable::default();

        let figure = TraceBuilder::new(&state, &cache, &cpi).primary(day("2021-01-01"));
        assert!(figure.shapes.is_empty());
        assert!(figure.annotations.is_empty());
    }
}
