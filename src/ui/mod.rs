// ============================================================================
// Module : ui
// ============================================================================
// Interface utilisateur (Terminal User Interface) : lecture du clavier et
// rendu de l'état de App. Aucun état n'est modifié ici.
// ============================================================================

pub mod chart;     // Rendu d'un ChartFigure sur un Canvas
pub mod dashboard; // Disposition : listes, graphiques, statut, footer
pub mod events;    // Clavier -> Command

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{command_for, Event, EventHandler};
