// ============================================================================
// Structure : SelectionState
// ============================================================================
// Ce que l'utilisateur a choisi d'afficher :
// - instruments sélectionnés (ordre d'insertion = ordre de rendu)
// - événements historiques activés
// - date de référence (variation en %)
// - plage visible partagée entre les deux graphiques
//
// Les mutations sont synchrones et passent toutes par App::update
// ============================================================================

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::event;
use crate::models::instrument;
use crate::models::DateRange;

/// Instrument sélectionné au démarrage
pub const DEFAULT_INSTRUMENT: &str = "SPY";

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    /// Instruments sélectionnés, dans l'ordre de sélection
    pub selected_instruments: Vec<String>,

    /// Libellés des événements activés
    pub enabled_events: BTreeSet<&'static str>,

    /// Date de référence pour la variation en %
    pub reference_date: Option<NaiveDate>,

    /// Plage horizontale partagée (None = plage par défaut)
    pub visible_range: Option<DateRange>,

    /// Valeurs exprimées en dollars d'aujourd'hui
    pub adjust_for_inflation: bool,

    /// Surimpression des événements sur le graphique principal
    pub show_event_overlays: bool,

    /// Surimpression des événements sur le graphique macro
    pub show_macro_event_overlays: bool,
}

impl SelectionState {
    /// État initial : SPY sélectionné, tous les événements activés
    pub fn new() -> Self {
        Self {
            selected_instruments: vec![DEFAULT_INSTRUMENT.to_string()],
            enabled_events: event::all_labels().collect(),
            reference_date: None,
            visible_range: None,
            adjust_for_inflation: false,
            show_event_overlays: true,
            show_macro_event_overlays: true,
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_instruments.iter().any(|s| s == id)
    }

    /// Sélectionne ou désélectionne un instrument
    ///
    /// Retourne true si l'état a changé (sélectionner un instrument déjà
    /// sélectionné, ou désélectionner un absent, ne fait rien).
    pub fn toggle_instrument(&mut self, id: &str, selected: bool) -> bool {
        match (selected, self.is_selected(id)) {
            (true, false) => {
                self.selected_instruments.push(id.to_string());
                true
            }
            (false, true) => {
                self.selected_instruments.retain(|s| s != id);
                true
            }
            _ => false,
        }
    }

    /// Désélectionne tous les instruments de prix
    ///
    /// Les indicateurs macro sélectionnés sont conservés.
    pub fn deselect_all(&mut self) {
        self.selected_instruments
            .retain(|id| instrument::kind_of(id).is_macro());
    }

    pub fn is_event_enabled(&self, label: &str) -> bool {
        self.enabled_events.contains(label)
    }

    /// Active ou désactive un événement (libellé inconnu ignoré)
    pub fn toggle_event(&mut self, label: &str, enabled: bool) {
        let Some(known) = event::all_labels().find(|l| *l == label) else {
            return;
        };
        if enabled {
            self.enabled_events.insert(known);
        } else {
            self.enabled_events.remove(known);
        }
    }

    pub fn enable_all_events(&mut self) {
        self.enabled_events = event::all_labels().collect();
    }

    pub fn disable_all_events(&mut self) {
        self.enabled_events.clear();
    }

    pub fn set_reference_date(&mut self, date: Option<NaiveDate>) {
        self.reference_date = date;
    }

    pub fn set_visible_range(&mut self, range: Option<DateRange>) {
        self.visible_range = range;
    }

    pub fn set_inflation_adjusted(&mut self, enabled: bool) {
        self.adjust_for_inflation = enabled;
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
