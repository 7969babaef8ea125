// ============================================================================
// Cache des séries
// ============================================================================
// Map en mémoire : identifiant d'instrument -> série chargée
//
// - Rempli à la demande (première sélection d'un instrument)
// - Jamais vidé pendant la session (pas d'éviction, pas de TTL)
// - Un échec de chargement laisse une série VIDE : la clé n'est jamais retirée
//
// CONCEPTS RUST :
// 1. Trait avec méthode async (impl Future dans la signature)
// 2. Enum d'état : Loading | Loaded
// ============================================================================

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, error, info};

use crate::error::LoadError;
use crate::models::Series;

/// Source de séries (fichiers JSON, HTTP, données de test...)
///
/// CONCEPT RUST : `impl Future` dans un trait
/// - Le chargement est asynchrone (non-bloquant)
/// - + Send : la future peut être exécutée par le runtime tokio multi-thread
pub trait SeriesLoader {
    fn load(&self, id: &str) -> impl Future<Output = Result<Series, LoadError>> + Send;
}

/// État d'une entrée du cache
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// Chargement en cours
    Loading,
    /// Série disponible (éventuellement vide après un échec)
    Loaded(Series),
}

/// Résultat d'une consultation du cache
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Absent,
    Pending,
    Ready(&'a Series),
}

#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<String, CacheEntry>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consulte le cache
    pub fn get(&self, id: &str) -> Lookup<'_> {
        match self.entries.get(id) {
            None => Lookup::Absent,
            Some(CacheEntry::Loading) => Lookup::Pending,
            Some(CacheEntry::Loaded(series)) => Lookup::Ready(series),
        }
    }

    /// Série chargée, ou None si absente / en cours
    pub fn series(&self, id: &str) -> Option<&Series> {
        match self.get(id) {
            Lookup::Ready(series) => Some(series),
            _ => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(CacheEntry::Loading))
    }

    /// Marque une entrée "en cours de chargement"
    ///
    /// Retourne false si l'entrée existe déjà (chargée ou en cours) :
    /// l'appelant ne doit alors PAS relancer de chargement.
    pub fn begin_load(&mut self, id: &str) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        debug!(id, "Series marked as loading");
        self.entries.insert(id.to_string(), CacheEntry::Loading);
        true
    }

    /// Termine un chargement
    ///
    /// En cas d'erreur, l'entrée devient une série vide, l'erreur est loggée
    /// puis rendue à l'appelant.
    pub fn complete_load(&mut self, id: &str, result: Result<Series, LoadError>) -> Result<(), LoadError> {
        let (series, outcome) = match result {
            Ok(series) => {
                info!(id, points = series.len(), "Series loaded");
                (series, Ok(()))
            }
            Err(e) => {
                error!(id, error = ?e, "Failed to load series, keeping empty entry");
                (Series::new(), Err(e))
            }
        };
        self.entries.insert(id.to_string(), CacheEntry::Loaded(series));
        outcome
    }

    /// Charge une série si elle n'est pas déjà dans le cache
    ///
    /// Idempotent : aucun effet si l'entrée existe déjà.
    /// En cas d'échec, l'entrée est une série vide et l'erreur est retournée.
    pub async fn ensure_loaded<L: SeriesLoader>(&mut self, id: &str, loader: &L) -> Result<(), LoadError> {
        if !self.begin_load(id) {
            return Ok(());
        }
        let result = loader.load(id).await;
        self.complete_load(id, result)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
