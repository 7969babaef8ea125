// ============================================================================
// Structure : App (contrôleur)
// ============================================================================
// Possède tout l'état de l'application et applique les commandes
//
// CONCEPTS RUST :
// 1. State Management : un seul propriétaire, sur le thread de l'UI
//    (pas d'Arc<Mutex<App>> : le worker ne touche jamais à l'état)
// 2. Pattern "reducer" : update(Command) -> Vec<Effect>
//    - la commande modifie l'état de manière synchrone
//    - les effets (chargement, redessin) sont exécutés par la boucle
// 3. Enums avec données : Command et Effect
//
// PATTERN : Les commandes sont traitées une par une, dans l'ordre d'arrivée
// ============================================================================

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::cache::SeriesCache;
use crate::chart::{sync, ChartFigure, RangeSync, TraceBuilder};
use crate::error::LoadError;
use crate::models::instrument::{self, Instrument, INSTRUMENTS};
use crate::models::{event, CpiTable, DateRange, HistoricalEvent, Series};
use crate::state::SelectionState;

/// Fraction de la plage visible parcourue par un pan
pub const PAN_FRACTION: f64 = 0.1;

/// Facteur de zoom (avant : 1/ZOOM_FACTOR)
pub const ZOOM_FACTOR: f64 = 1.5;

/// Nombre de pas du curseur pour traverser la plage visible
const CURSOR_STEPS: i64 = 100;

// ============================================================================
// Enum : Focus
// ============================================================================

/// Liste active dans le panneau de gauche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Instruments,
    Events,
}

// ============================================================================
// Commandes et effets
// ============================================================================
// CONCEPT : Command pattern
// - Toute interaction (clavier, fin de chargement) devient une Command
// - update() est la SEULE fonction qui modifie l'état
// ============================================================================

/// Commandes traitées par App::update
#[derive(Debug)]
pub enum Command {
    // === Sélection ===
    ToggleInstrument { id: String, selected: bool },
    ToggleEvent { label: String, enabled: bool },
    EnableAllEvents,
    DisableAllEvents,
    DeselectAll,
    SetReferenceDate(Option<NaiveDate>),
    SetInflationAdjusted(bool),
    ToggleEventOverlays,
    ToggleMacroEventOverlays,

    // === Plages des graphiques ===
    PrimaryRangeChanged(DateRange),
    SecondaryRangeChanged(DateRange),
    ResetZoom,
    /// Pan du graphique principal (-1 = passé, +1 = futur)
    Pan(i64),
    /// Zoom du graphique principal (+1 = avant, -1 = arrière)
    Zoom(i64),

    // === Curseur (équivalent du clic sur un point) ===
    MoveCursor(i64),
    SetReferenceAtCursor,

    // === Navigation dans les listes ===
    FocusNext,
    NavigateUp,
    NavigateDown,
    /// Bascule l'élément en surbrillance dans la liste active
    ToggleHighlighted,
    ToggleInflation,

    // === Cycle de vie ===
    /// Résultat d'un chargement en arrière-plan
    SeriesLoaded { id: String, result: Result<Series, LoadError> },
    /// 'q' : première pression = confirmation, deuxième = sortie
    Quit,
}

/// Effets demandés à la boucle d'événements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Charger la série d'un instrument en arrière-plan
    Load(String),
    /// Redessiner l'interface
    Redraw,
}

// ============================================================================
// Structure : App
// ============================================================================

pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : attend une deuxième pression de 'q'
    pub confirm_quit: bool,

    /// Sélection de l'utilisateur
    pub selection: SelectionState,

    /// Séries chargées (ou en cours de chargement)
    pub cache: SeriesCache,

    /// Table CPI pour l'ajustement à l'inflation
    pub cpi: CpiTable,

    /// Synchronisation graphique principal -> graphique macro
    pub sync: RangeSync,

    /// Liste active et index en surbrillance
    pub focus: Focus,
    pub instrument_index: usize,
    pub event_index: usize,

    /// Date sous le curseur du graphique principal
    pub cursor: Option<NaiveDate>,

    /// Date du jour (fin de la plage par défaut)
    pub today: NaiveDate,
}

impl App {
    /// Crée l'application avec la sélection par défaut
    pub fn new(cpi: CpiTable, today: NaiveDate) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            selection: SelectionState::new(),
            cache: SeriesCache::new(),
            cpi,
            sync: RangeSync::new(),
            focus: Focus::Instruments,
            instrument_index: 0,
            event_index: 0,
            cursor: None,
            today,
        }
    }

    /// Effets initiaux : chargement des instruments sélectionnés par défaut
    ///
    /// Garantit que chaque instrument sélectionné a une entrée dans le cache.
    pub fn init(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self
            .selection
            .selected_instruments
            .iter()
            .filter(|id| self.cache.begin_load(id))
            .map(|id| Effect::Load(id.clone()))
            .collect();
        effects.push(Effect::Redraw);
        effects
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Reducer
    // ========================================================================

    /// Applique une commande et retourne les effets à exécuter
    pub fn update(&mut self, command: Command) -> Vec<Effect> {
        // Toute commande autre que Quit annule la confirmation en attente
        if !matches!(command, Command::Quit | Command::SeriesLoaded { .. }) {
            self.confirm_quit = false;
        }

        match command {
            Command::ToggleInstrument { id, selected } => {
                if !self.selection.toggle_instrument(&id, selected) {
                    return Vec::new();
                }
                info!(id = %id, selected, "Instrument toggled");
                let mut effects = Vec::new();
                if selected && self.cache.begin_load(&id) {
                    effects.push(Effect::Load(id));
                }
                effects.push(Effect::Redraw);
                effects
            }

            Command::ToggleEvent { label, enabled } => {
                self.selection.toggle_event(&label, enabled);
                vec![Effect::Redraw]
            }

            Command::EnableAllEvents => {
                self.selection.enable_all_events();
                vec![Effect::Redraw]
            }

            Command::DisableAllEvents => {
                self.selection.disable_all_events();
                vec![Effect::Redraw]
            }

            Command::DeselectAll => {
                self.selection.deselect_all();
                vec![Effect::Redraw]
            }

            Command::SetReferenceDate(date) => {
                info!(?date, "Reference date changed");
                self.selection.set_reference_date(date);
                vec![Effect::Redraw]
            }

            Command::SetInflationAdjusted(enabled) => {
                self.selection.set_inflation_adjusted(enabled);
                vec![Effect::Redraw]
            }

            Command::ToggleInflation => {
                let enabled = !self.selection.adjust_for_inflation;
                self.update(Command::SetInflationAdjusted(enabled))
            }

            Command::ToggleEventOverlays => {
                self.selection.show_event_overlays = !self.selection.show_event_overlays;
                vec![Effect::Redraw]
            }

            Command::ToggleMacroEventOverlays => {
                self.selection.show_macro_event_overlays = !self.selection.show_macro_event_overlays;
                vec![Effect::Redraw]
            }

            Command::PrimaryRangeChanged(range) => {
                self.sync.on_primary_range(&mut self.selection, range);
                self.clamp_cursor(range);
                vec![Effect::Redraw]
            }

            Command::SecondaryRangeChanged(range) => {
                self.sync.on_secondary_range(range);
                vec![Effect::Redraw]
            }

            Command::ResetZoom => {
                self.sync.reset(&mut self.selection);
                vec![Effect::Redraw]
            }

            Command::Pan(direction) => match (self.primary_range(), self.navigation_bounds()) {
                (Some(range), Some(bounds)) => {
                    let panned = sync::pan(range, PAN_FRACTION * direction as f64, bounds);
                    self.update(Command::PrimaryRangeChanged(panned))
                }
                _ => Vec::new(),
            },

            Command::Zoom(direction) => match (self.primary_range(), self.navigation_bounds()) {
                (Some(range), Some(bounds)) => {
                    let factor = if direction > 0 { 1.0 / ZOOM_FACTOR } else { ZOOM_FACTOR };
                    self.update(Command::PrimaryRangeChanged(sync::zoom(range, factor, bounds)))
                }
                _ => Vec::new(),
            },

            Command::MoveCursor(steps) => {
                let Some(range) = self.primary_range() else {
                    return Vec::new();
                };
                let step = (range.span_days() / CURSOR_STEPS).max(1);
                let from = self.cursor.unwrap_or(range.end);
                self.cursor = Some(from + Duration::days(step * steps));
                self.clamp_cursor(range);
                vec![Effect::Redraw]
            }

            Command::SetReferenceAtCursor => {
                let date = self.cursor.and_then(|c| self.snap_to_data(c));
                match date {
                    Some(date) => self.update(Command::SetReferenceDate(Some(date))),
                    None => Vec::new(),
                }
            }

            Command::FocusNext => {
                self.focus = match self.focus {
                    Focus::Instruments => Focus::Events,
                    Focus::Events => Focus::Instruments,
                };
                vec![Effect::Redraw]
            }

            Command::NavigateUp => {
                let index = self.focused_index_mut();
                *index = index.saturating_sub(1);
                vec![Effect::Redraw]
            }

            Command::NavigateDown => {
                let max_index = self.focused_len().saturating_sub(1);
                let index = self.focused_index_mut();
                *index = (*index + 1).min(max_index);
                vec![Effect::Redraw]
            }

            Command::ToggleHighlighted => match self.focus {
                Focus::Instruments => {
                    let Some(item) = self.highlighted_instrument() else {
                        return Vec::new();
                    };
                    let selected = !self.selection.is_selected(item.id);
                    self.update(Command::ToggleInstrument {
                        id: item.id.to_string(),
                        selected,
                    })
                }
                Focus::Events => {
                    let Some(e) = self.highlighted_event() else {
                        return Vec::new();
                    };
                    let enabled = !self.selection.is_event_enabled(e.label);
                    self.update(Command::ToggleEvent {
                        label: e.label.to_string(),
                        enabled,
                    })
                }
            },

            Command::SeriesLoaded { id, result } => {
                // Le cache est rempli même si l'instrument a été désélectionné entre-temps.
                // Un échec est loggé par le cache : l'entrée vide suffit au rendu.
                if self.cache.complete_load(&id, result).is_err() {
                    debug!(id = %id, "Series left empty after failed load");
                }
                vec![Effect::Redraw]
            }

            Command::Quit => {
                if self.confirm_quit {
                    info!("User confirmed quit");
                    self.running = false;
                } else {
                    info!("User requested quit (awaiting confirmation)");
                    self.confirm_quit = true;
                }
                vec![Effect::Redraw]
            }
        }
    }

    // ========================================================================
    // Lecture de l'état (pour le rendu)
    // ========================================================================

    fn builder(&self) -> TraceBuilder<'_> {
        TraceBuilder::new(&self.selection, &self.cache, &self.cpi)
    }

    /// Graphique principal prêt à dessiner
    pub fn primary_figure(&self) -> ChartFigure {
        self.builder().primary(self.today)
    }

    /// Graphique macro prêt à dessiner
    pub fn secondary_figure(&self) -> ChartFigure {
        self.builder().secondary(self.sync.secondary(), self.today)
    }

    /// Plage horizontale actuelle du graphique principal
    pub fn primary_range(&self) -> Option<DateRange> {
        self.selection
            .visible_range
            .or_else(|| self.builder().default_range(self.today))
    }

    /// Zone dans laquelle le pan/zoom peut se déplacer : données
    /// sélectionnées jusqu'à aujourd'hui, plus une marge
    pub fn navigation_bounds(&self) -> Option<DateRange> {
        self.builder()
            .default_range(self.today)
            .map(|range| range.padded(sync::NAVIGATION_PADDING_DAYS))
    }

    /// Le graphique macro n'est affiché que si un indicateur est sélectionné
    pub fn has_macro_selection(&self) -> bool {
        self.selection
            .selected_instruments
            .iter()
            .any(|id| instrument::kind_of(id).is_macro())
    }

    pub fn highlighted_instrument(&self) -> Option<&'static Instrument> {
        INSTRUMENTS.get(self.instrument_index)
    }

    pub fn highlighted_event(&self) -> Option<&'static HistoricalEvent> {
        event::events().get(self.event_index)
    }

    /// Titre et description de l'élément en surbrillance dans la liste active
    pub fn highlighted_description(&self) -> Option<(String, &'static str)> {
        match self.focus {
            Focus::Instruments => self
                .highlighted_instrument()
                .map(|item| (item.display(), item.description)),
            Focus::Events => self
                .highlighted_event()
                .map(|e| (e.label.to_string(), e.description)),
        }
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Instruments => INSTRUMENTS.len(),
            Focus::Events => event::events().len(),
        }
    }

    fn focused_index_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Instruments => &mut self.instrument_index,
            Focus::Events => &mut self.event_index,
        }
    }

    fn clamp_cursor(&mut self, range: DateRange) {
        if let Some(cursor) = self.cursor {
            self.cursor = Some(cursor.clamp(range.start, range.end));
        }
    }

    /// Date de données la plus proche (à gauche) du curseur, sur le premier
    /// instrument de prix chargé
    fn snap_to_data(&self, date: NaiveDate) -> Option<NaiveDate> {
        let snapped = self
            .selection
            .selected_instruments
            .iter()
            .filter(|id| !instrument::kind_of(id).is_macro())
            .filter_map(|id| self.cache.series(id))
            .find_map(|series| {
                let first = series.first()?.date;
                series.window(DateRange::new(first, date)).last().map(|p| p.date)
            });
        debug!(%date, ?snapped, "Cursor snapped to data");
        snapped
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSeriesPoint;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn app() -> App {
        App::new(CpiTable::default(), day("2024-01-01"))
    }

    fn series(points: &[(&str, f64)]) -> Series {
        Series::from_points(points.iter().map(|&(d, v)| TimeSeriesPoint::new(day(d), v)))
    }

    #[test]
    fn test_init_loads_default_selection() {
        let mut app = app();
        let effects = app.init();

        assert_eq!(effects, vec![Effect::Load("SPY".into()), Effect::Redraw]);
        assert!(app.cache.is_loading("SPY"));
    }

    #[test]
    fn test_toggle_requests_load_once() {
        let mut app = app();
        app.init();

        let effects = app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: true });
        assert_eq!(effects, vec![Effect::Load("QQQ".into()), Effect::Redraw]);

        // Déjà sélectionné : aucun effet
        let effects = app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: true });
        assert!(effects.is_empty());

        // Désélection puis resélection : déjà dans le cache, pas de nouveau chargement
        app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: false });
        let effects = app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: true });
        assert_eq!(effects, vec![Effect::Redraw]);
    }

    #[test]
    fn test_toggle_off_before_load_resolves() {
        let mut app = app();
        app.init();

        app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: true });
        app.update(Command::ToggleInstrument { id: "QQQ".into(), selected: false });
        let effects = app.update(Command::SeriesLoaded {
            id: "QQQ".into(),
            result: Ok(series(&[("2020-01-02", 1.0)])),
        });

        assert_eq!(effects, vec![Effect::Redraw]);
        assert!(!app.selection.is_selected("QQQ"));
        assert_eq!(app.cache.series("QQQ").map(|s| s.len()), Some(1));
        assert!(app.primary_figure().traces.iter().all(|t| t.id != "QQQ"));
    }

    #[test]
    fn test_failed_load_leaves_empty_series() {
        let mut app = app();
        app.init();

        app.update(Command::SeriesLoaded {
            id: "SPY".into(),
            result: Err(LoadError::Aborted { id: "SPY".into() }),
        });

        assert_eq!(app.cache.series("SPY").map(|s| s.is_empty()), Some(true));
        assert!(app.is_running());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = app();
        app.update(Command::Quit);
        assert!(app.is_running());

        app.update(Command::NavigateDown);
        app.update(Command::Quit);
        assert!(app.is_running());

        app.update(Command::Quit);
        assert!(!app.is_running());
    }

    #[test]
    fn test_navigation_and_toggle_highlighted() {
        let mut app = app();
        app.init();

        // Index 0 = DIA
        let effects = app.update(Command::ToggleHighlighted);
        assert_eq!(effects[0], Effect::Load("DIA".into()));
        assert!(app.selection.is_selected("DIA"));

        app.update(Command::NavigateUp);
        assert_eq!(app.instrument_index, 0);

        app.update(Command::FocusNext);
        app.update(Command::NavigateDown);
        assert_eq!(app.event_index, 1);
        let label = app.highlighted_event().unwrap().label;
        app.update(Command::ToggleHighlighted);
        assert!(!app.selection.is_event_enabled(label));
    }

    #[test]
    fn test_highlighted_description_follows_focus() {
        let mut app = app();

        let (title, description) = app.highlighted_description().unwrap();
        assert_eq!(title, INSTRUMENTS[0].display());
        assert_eq!(description, INSTRUMENTS[0].description);
        assert!(!description.is_empty());

        app.update(Command::FocusNext);
        app.update(Command::NavigateDown);
        let highlighted = app.highlighted_event().unwrap();
        let (title, description) = app.highlighted_description().unwrap();
        assert_eq!(title, highlighted.label);
        assert_eq!(description, highlighted.description);
    }

    #[test]
    fn test_zoom_syncs_secondary_chart() {
        let mut app = app();
        app.init();
        app.update(Command::SeriesLoaded {
            id: "SPY".into(),
            result: Ok(series(&[("2020-01-01", 1.0), ("2023-12-31", 2.0)])),
        });

        app.update(Command::Zoom(1));

        let range = app.selection.visible_range.unwrap();
        assert!(range.span_days() < 1461);
        assert_eq!(app.sync.secondary().x_range, Some(range));
        assert!(app.sync.secondary().y_autorange);

        app.update(Command::ResetZoom);
        assert_eq!(app.selection.visible_range, None);
        assert_eq!(app.primary_range(), Some(DateRange::new(day("2020-01-01"), day("2024-01-01"))));
    }

    #[test]
    fn test_repeated_zoom_out_and_pan_stay_in_bounds() {
        let mut app = app();
        app.init();
        app.update(Command::SeriesLoaded {
            id: "SPY".into(),
            result: Ok(series(&[("1993-01-29", 43.9), ("2023-12-29", 475.3)])),
        });
        let bounds = app.navigation_bounds().unwrap();
        assert_eq!(bounds, DateRange::new(day("1993-01-29"), day("2024-01-01")).padded(365));

        for _ in 0..40 {
            app.update(Command::Zoom(-1));
        }
        assert_eq!(app.selection.visible_range, Some(bounds));

        for _ in 0..5 {
            app.update(Command::Zoom(1));
        }
        let zoomed = app.selection.visible_range.unwrap();
        for _ in 0..200 {
            app.update(Command::Pan(1));
        }
        let range = app.selection.visible_range.unwrap();
        assert_eq!(range.end, bounds.end);
        assert_eq!(range.span_days(), zoomed.span_days());

        for _ in 0..200 {
            app.update(Command::Pan(-1));
        }
        assert_eq!(app.selection.visible_range.unwrap().start, bounds.start);
    }

    #[test]
    fn test_reference_at_cursor_snaps_to_data() {
        let mut app = app();
        app.init();
        app.update(Command::SeriesLoaded {
            id: "SPY".into(),
            result: Ok(series(&[("2020-01-02", 100.0), ("2020-01-06", 110.0)])),
        });
        app.update(Command::PrimaryRangeChanged(DateRange::new(day("2020-01-01"), day("2020-01-10"))));

        app.cursor = Some(day("2020-01-04"));
        app.update(Command::SetReferenceAtCursor);

        assert_eq!(app.selection.reference_date, Some(day("2020-01-02")));
        let figure = app.primary_figure();
        assert_eq!(figure.traces[0].points[1].change.as_deref(), Some("+10.00%"));
    }

    #[test]
    fn test_macro_selection_shows_secondary_chart() {
        let mut app = app();
        assert!(!app.has_macro_selection());
        app.update(Command::ToggleInstrument { id: "UNRATE".into(), selected: true });
        assert!(app.has_macro_selection());
    }
}
