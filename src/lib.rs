// ============================================================================
// MarketNav - Library
// ============================================================================
// Navigateur de marchés : historiques de prix et indicateurs macro, ajustement
// à l'inflation, variation depuis une date de référence, événements
// historiques en surimpression.
//
// Couches (de bas en haut) :
// - models, transform : données et calculs purs
// - store, cache      : cache JSON sur disque, séries chargées en mémoire
// - state, chart      : sélection de l'utilisateur, figures à dessiner
// - app               : contrôleur (Command -> état -> Effect)
// - ui                : rendu TUI et clavier
// - api, updater      : mise à jour du cache (`marketnav update`)
// ============================================================================

pub mod api;       // Clients Yahoo Finance et FRED
pub mod app;       // Contrôleur de l'application
pub mod cache;     // Cache des séries chargées
pub mod chart;     // Construction des graphiques et synchronisation des plages
pub mod config;    // Configuration (variables d'environnement)
pub mod error;     // Erreurs de chargement
pub mod models;    // Structures de données
pub mod state;     // Sélection de l'utilisateur
pub mod store;     // Cache JSON sur disque
pub mod transform; // Inflation, érosion du dollar, variations
pub mod ui;        // Interface utilisateur
pub mod updater;   // Pipeline de mise à jour des données
