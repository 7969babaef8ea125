// ============================================================================
// Range Synchronizer
// ============================================================================
// Un zoom/pan sur le graphique principal est répercuté sur le graphique
// macro (axe horizontal uniquement). L'axe vertical du graphique macro est
// alors recalculé sur les données visibles.
//
// Sens unique : une interaction sur le graphique macro ne remonte jamais
// vers le graphique principal.
// ============================================================================

use chrono::Duration;
use tracing::debug;

use crate::models::DateRange;
use crate::state::SelectionState;

/// Plage minimale affichable lors d'un zoom (en jours)
pub const MIN_SPAN_DAYS: i64 = 7;

/// État d'affichage des axes d'un graphique
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisView {
    /// Plage horizontale imposée (None = plage par défaut)
    pub x_range: Option<DateRange>,
    /// Ajustement vertical sur les données visibles
    pub y_autorange: bool,
}

/// Propage les plages du graphique principal vers le graphique macro
#[derive(Debug, Clone, Default)]
pub struct RangeSync {
    secondary: AxisView,
}

impl RangeSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Axes du graphique macro
    pub fn secondary(&self) -> &AxisView {
        &self.secondary
    }

    /// Zoom/pan sur le graphique principal
    ///
    /// La plage devient la plage partagée et la plage horizontale du
    /// graphique macro, dont l'axe vertical passe en auto-ajustement.
    pub fn on_primary_range(&mut self, state: &mut SelectionState, range: DateRange) {
        debug!(start = %range.start, end = %range.end, "Syncing secondary chart range");
        state.set_visible_range(Some(range));
        self.secondary.x_range = Some(range);
        self.secondary.y_autorange = true;
    }

    /// Zoom/pan sur le graphique macro : reste local
    pub fn on_secondary_range(&mut self, range: DateRange) {
        self.secondary.x_range = Some(range);
    }

    /// Réinitialise le zoom : les deux graphiques reviennent à la plage par défaut
    pub fn reset(&mut self, state: &mut SelectionState) {
        state.set_visible_range(None);
        self.secondary = AxisView::default();
    }
}

/// Marge autour des données dans laquelle le pan/zoom peut se déplacer (jours)
pub const NAVIGATION_PADDING_DAYS: i64 = 365;

/// Décale une plage de `days` jours ; None si une borne sort du calendrier
fn shifted(range: DateRange, days: i64) -> Option<DateRange> {
    let delta = Duration::days(days);
    Some(DateRange {
        start: range.start.checked_add_signed(delta)?,
        end: range.end.checked_add_signed(delta)?,
    })
}

/// Ramène une plage à l'intérieur de `bounds` en conservant sa largeur
///
/// Une plage plus large que `bounds` devient `bounds`.
pub fn clamp_to(range: DateRange, bounds: DateRange) -> DateRange {
    if range.span_days() >= bounds.span_days() {
        return bounds;
    }
    let correction = if range.start < bounds.start {
        (bounds.start - range.start).num_days()
    } else if range.end > bounds.end {
        -(range.end - bounds.end).num_days()
    } else {
        return range;
    };
    shifted(range, correction).unwrap_or(bounds)
}

/// Décale une plage de `fraction` de sa largeur (négatif = vers le passé),
/// sans sortir de `bounds`
pub fn pan(range: DateRange, fraction: f64, bounds: DateRange) -> DateRange {
    let shift = (range.span_days() as f64 * fraction).round() as i64;
    let shift = if shift == 0 { fraction.signum() as i64 } else { shift };
    match shifted(range, shift) {
        Some(moved) => clamp_to(moved, bounds),
        None => range,
    }
}

/// Zoom centré : factor < 1 rapproche, factor > 1 éloigne
///
/// La largeur reste comprise entre MIN_SPAN_DAYS et celle de `bounds`.
pub fn zoom(range: DateRange, factor: f64, bounds: DateRange) -> DateRange {
    let span = range.span_days();
    let new_span = ((span as f64 * factor).round() as i64)
        .min(bounds.span_days())
        .max(MIN_SPAN_DAYS);

    let zoomed = range
        .start
        .checked_add_signed(Duration::days(span / 2))
        .and_then(|center| center.checked_sub_signed(Duration::days(new_span / 2)))
        .and_then(|start| {
            let end = start.checked_add_signed(Duration::days(new_span))?;
            Some(DateRange { start, end })
        });

    match zoomed {
        Some(zoomed) => clamp_to(zoomed, bounds),
        None => range,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_primary_range_propagates_to_secondary() {
        let mut state = SelectionState::new();
        let mut sync = RangeSync::new();
        let range = DateRange::new(day("2020-01-01"), day("2021-01-01"));

        sync.on_primary_range(&mut state, range);

        assert_eq!(state.visible_range, Some(range));
        assert_eq!(sync.secondary().x_range, Some(range));
        assert!(sync.secondary().y_autorange);
    }

    #[test]
    fn test_secondary_range_does_not_propagate_back() {
        let mut state = SelectionState::new();
        let mut sync = RangeSync::new();
        let primary = DateRange::new(day("2020-01-01"), day("2021-01-01"));
        sync.on_primary_range(&mut state, primary);

        let secondary = DateRange::new(day("2015-01-01"), day("2016-01-01"));
        sync.on_secondary_range(secondary);

        assert_eq!(state.visible_range, Some(primary));
        assert_eq!(sync.secondary().x_range, Some(secondary));
    }

    #[test]
    fn test_reset_clears_shared_range() {
        let mut state = SelectionState::new();
        let mut sync = RangeSync::new();
        sync.on_primary_range(&mut state, DateRange::new(day("2020-01-01"), day("2021-01-01")));

        sync.reset(&mut state);

        assert_eq!(state.visible_range, None);
        assert_eq!(*sync.secondary(), AxisView::default());
    }

    #[test]
    fn test_pan_and_zoom() {
        let range = DateRange::new(day("2020-01-01"), day("2020-01-21"));
        let bounds = DateRange::new(day("2010-01-01"), day("2030-01-01"));

        let panned = pan(range, 0.5, bounds);
        assert_eq!(panned.start, day("2020-01-11"));
        assert_eq!(panned.span_days(), 20);

        let zoomed = zoom(range, 0.5, bounds);
        assert_eq!(zoomed.span_days(), 10);
        assert_eq!(zoomed.start, day("2020-01-06"));

        assert_eq!(zoom(range, 0.01, bounds).span_days(), MIN_SPAN_DAYS);
    }

    #[test]
    fn test_zoom_out_stops_at_bounds() {
        let bounds = DateRange::new(day("1992-01-01"), day("2025-01-01"));
        let mut range = DateRange::new(day("2020-01-01"), day("2021-01-01"));

        for _ in 0..40 {
            range = zoom(range, 1.5, bounds);
        }

        assert_eq!(range, bounds);
    }

    #[test]
    fn test_pan_stays_inside_bounds() {
        let bounds = DateRange::new(day("1992-01-01"), day("2025-01-01"));
        let start = DateRange::new(day("2020-01-01"), day("2021-01-01"));

        let mut range = start;
        for _ in 0..500 {
            range = pan(range, 0.1, bounds);
        }
        assert_eq!(range.end, bounds.end);
        assert_eq!(range.span_days(), start.span_days());

        for _ in 0..500 {
            range = pan(range, -0.1, bounds);
        }
        assert_eq!(range.start, bounds.start);
        assert_eq!(range.span_days(), start.span_days());
    }

    #[test]
    fn test_calendar_overflow_leaves_range_unchanged() {
        let edge = DateRange::new(NaiveDate::MAX - Duration::days(10), NaiveDate::MAX);
        let bounds = DateRange::new(NaiveDate::MIN, NaiveDate::MAX);

        assert_eq!(pan(edge, 1.0, bounds), edge);
    }
}
