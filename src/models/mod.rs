// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : séries temporelles, catalogue
// d'instruments, événements historiques et table CPI
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod cpi;        // Table CPI (déflateur)
pub mod event;      // Événements historiques (surimpressions)
pub mod instrument; // Catalogue des instruments
pub mod series;     // Séries temporelles et formats amont

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use marketnav::models::series::Series;
// On peut faire : use marketnav::models::Series;
pub use cpi::{CpiRecord, CpiTable};
pub use event::HistoricalEvent;
pub use instrument::{Instrument, InstrumentKind};
pub use series::{
    DateRange, ObservationDocument, ObservationRecord, PriceRecord, Series, SeriesRecord,
    TimeSeriesPoint,
};
