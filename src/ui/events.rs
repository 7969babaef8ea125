// ============================================================================
// Gestion des événements
// ============================================================================
// Lit les événements clavier et les traduit en commandes pour App::update
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching sur KeyCode : une table de correspondance lisible
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

use crate::app::Command;

/// Délai maximal d'attente d'un événement avant un Tick
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Terminal redimensionné : il faut redessiner
    Resize,

    /// Tick régulier (aucun événement pendant POLL_TIMEOUT)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    /// - Le Tick permet à la boucle de relever les résultats du worker
    pub fn next(&self) -> Result<Event> {
        if !event::poll(POLL_TIMEOUT)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            CrosstermEvent::Resize(_, _) => Ok(Event::Resize),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Correspondance touche -> commande
// ============================================================================
//
//   q          quitter (deux pressions)
//   Tab        changer de liste (instruments / événements)
//   ↑↓ / k j   naviguer
//   Espace     sélectionner / activer l'élément en surbrillance
//   A / N      activer / désactiver tous les événements
//   i          ajustement à l'inflation
//   x          désélectionner tous les instruments
//   ← →        pan du graphique principal
//   + -        zoom avant / arrière
//   0          réinitialiser le zoom
//   , .        déplacer le curseur
//   Entrée     date de référence = curseur
//   c          effacer la date de référence
//   e / m      surimpressions du graphique principal / macro
// ============================================================================

/// Traduit un événement en commande (None = touche non utilisée)
pub fn command_for(event: &Event) -> Option<Command> {
    let Event::Key(key) = event else {
        return None;
    };

    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Tab | KeyCode::BackTab => Command::FocusNext,
        KeyCode::Up | KeyCode::Char('k') => Command::NavigateUp,
        KeyCode::Down | KeyCode::Char('j') => Command::NavigateDown,
        KeyCode::Char(' ') => Command::ToggleHighlighted,
        KeyCode::Char('A') => Command::EnableAllEvents,
        KeyCode::Char('N') => Command::DisableAllEvents,
        KeyCode::Char('i') | KeyCode::Char('I') => Command::ToggleInflation,
        KeyCode::Char('x') | KeyCode::Char('X') => Command::DeselectAll,
        KeyCode::Left | KeyCode::Char('h') => Command::Pan(-1),
        KeyCode::Right | KeyCode::Char('l') => Command::Pan(1),
        KeyCode::Char('+') | KeyCode::Char('=') => Command::Zoom(1),
        KeyCode::Char('-') | KeyCode::Char('_') => Command::Zoom(-1),
        KeyCode::Char('0') => Command::ResetZoom,
        KeyCode::Char(',') | KeyCode::Char('<') => Command::MoveCursor(-1),
        KeyCode::Char('.') | KeyCode::Char('>') => Command::MoveCursor(1),
        KeyCode::Enter => Command::SetReferenceAtCursor,
        KeyCode::Char('c') | KeyCode::Char('C') => Command::SetReferenceDate(None),
        KeyCode::Char('e') | KeyCode::Char('E') => Command::ToggleEventOverlays,
        KeyCode::Char('m') | KeyCode::Char('M') => Command::ToggleMacroEventOverlays,
        _ => return None,
    };

    Some(command)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_quit_key() {
        assert!(matches!(command_for(&key(KeyCode::Char('q'))), Some(Command::Quit)));
        assert!(command_for(&Event::Tick).is_none());
        assert!(command_for(&Event::Resize).is_none());
    }

    #[test]
    fn test_chart_keys() {
        assert!(matches!(command_for(&key(KeyCode::Left)), Some(Command::Pan(-1))));
        assert!(matches!(command_for(&key(KeyCode::Char('+'))), Some(Command::Zoom(1))));
        assert!(matches!(command_for(&key(KeyCode::Char('0'))), Some(Command::ResetZoom)));
        assert!(matches!(
            command_for(&key(KeyCode::Char('c'))),
            Some(Command::SetReferenceDate(None))
        ));
    }

    #[test]
    fn test_event_bulk_keys_are_case_sensitive() {
        assert!(matches!(command_for(&key(KeyCode::Char('A'))), Some(Command::EnableAllEvents)));
        assert!(matches!(command_for(&key(KeyCode::Char('N'))), Some(Command::DisableAllEvents)));
        assert!(command_for(&key(KeyCode::Char('a'))).is_none());
    }
}
