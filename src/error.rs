// ============================================================================
// Erreurs de chargement des séries
// ============================================================================
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère Display et std::error::Error
// - #[source] chaîne l'erreur d'origine (io, JSON)
//
// Le reste de l'application utilise anyhow::Result avec .context()
// ============================================================================

use thiserror::Error;

/// Échec du chargement d'une série (réseau, disque ou parsing)
///
/// Jamais fatal : l'entrée du cache devient une série vide et
/// seul l'instrument concerné est affecté.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("lecture impossible de {path} pour {id}")]
    Io {
        id: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON invalide pour {id}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("chargement de {id} interrompu avant la fin")]
    Aborted { id: String },
}

impl LoadError {
    /// Identifiant de l'instrument concerné
    pub fn id(&self) -> &str {
        match self {
            LoadError::Io { id, .. } | LoadError::Parse { id, .. } | LoadError::Aborted { id } => id,
        }
    }
}
