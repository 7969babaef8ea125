// ============================================================================
// Structure : Instrument
// ============================================================================
// Catalogue statique des instruments sélectionnables :
// ETFs, actions individuelles et indicateurs macro-économiques (FRED)
//
// CONCEPTS RUST :
// 1. &'static str : données compilées dans le binaire, aucune allocation
// 2. const tableaux : tables de référence en lecture seule
// 3. Iterator::find : recherche linéaire dans une petite table
// ============================================================================

use serde::{Deserialize, Serialize};

/// Couleur utilisée quand un identifiant n'est pas dans le catalogue
pub const DEFAULT_COLOR: &str = "#1f77b4";

/// Identifiant du rendement du Trésor à 10 ans (cas particulier des annotations)
pub const TREASURY_10Y: &str = "UST10Y";

/// Type d'instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Exchange-Traded Fund ou indice (ex: SPY, ^VIX)
    Etf,
    /// Action individuelle (ex: AAPL)
    Stock,
    /// Indicateur macro-économique (ex: UNRATE)
    Macro,
}

impl InstrumentKind {
    /// Les indicateurs macro sont tracés sur le graphique secondaire
    pub fn is_macro(&self) -> bool {
        matches!(self, InstrumentKind::Macro)
    }
}

/// Entrée du catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub id: &'static str,
    pub kind: InstrumentKind,
    pub short_name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl Instrument {
    const fn new(
        id: &'static str,
        kind: InstrumentKind,
        short_name: &'static str,
        color: &'static str,
        description: &'static str,
    ) -> Self {
        Self { id, kind, short_name, color, description }
    }

    /// Libellé court pour l'affichage : "SPY · S&P 500"
    pub fn display(&self) -> String {
        if self.short_name.is_empty() {
            self.id.to_string()
        } else {
            format!("{} · {}", self.id, self.short_name)
        }
    }
}

use InstrumentKind::{Etf, Macro, Stock};

/// Catalogue complet, trié par type puis par identifiant
pub const INSTRUMENTS: &[Instrument] = &[
    // === ETFs et indices ===
    Instrument::new("DIA", Etf, "Dow Jones", "#2ca02c", "SPDR Dow Jones Industrial Average ETF."),
    Instrument::new("DX-Y.NYB", Etf, "Dollar Index", "#4ecdc4", "U.S. Dollar Index: value of the U.S. dollar relative to a basket of foreign currencies."),
    Instrument::new("IWM", Etf, "Russell 2000", "#d62728", "iShares Russell 2000 ETF: small-cap U.S. stocks."),
    Instrument::new("QQQ", Etf, "Nasdaq 100", "#ff7f0e", "Invesco QQQ ETF: tracks the Nasdaq-100 index."),
    Instrument::new("SPY", Etf, "S&P 500", "#1f77b4", "SPDR S&P 500 ETF: tracks the S&P 500 index."),
    Instrument::new("VT", Etf, "Global Stocks", "#9467bd", "Vanguard Total World Stock ETF."),
    Instrument::new("VTI", Etf, "Total US Market", "#8c564b", "Vanguard Total Stock Market ETF: entire U.S. market."),
    Instrument::new("XLB", Etf, "Materials", "#dbdb8d", "Materials Select Sector SPDR Fund."),
    Instrument::new("XLC", Etf, "Communication", "#f7b6d3", "Communication Services Select Sector SPDR Fund."),
    Instrument::new("XLE", Etf, "Energy", "#17becf", "Energy Select Sector SPDR Fund."),
    Instrument::new("XLF", Etf, "Financials", "#e377c2", "Financial Select Sector SPDR Fund."),
    Instrument::new("XLI", Etf, "Industrials", "#c5b0d5", "Industrial Select Sector SPDR Fund."),
    Instrument::new("XLK", Etf, "Technology", "#7f7f7f", "Technology Select Sector SPDR Fund."),
    Instrument::new("XLRE", Etf, "Real Estate", "#c49c94", "Real Estate Select Sector SPDR Fund."),
    Instrument::new("XLU", Etf, "Utilities", "#c7c7c7", "Utilities Select Sector SPDR Fund."),
    Instrument::new("XLV", Etf, "Healthcare", "#bcbd22", "Health Care Select Sector SPDR Fund."),
    Instrument::new("XLY", Etf, "Consumer Disc.", "#ff9896", "Consumer Discretionary Select Sector SPDR Fund."),
    Instrument::new("^VIX", Etf, "Volatility", "#ff6b6b", "CBOE Volatility Index: market volatility and investor sentiment."),
    // === Actions individuelles ===
    Instrument::new("AAPL", Stock, "", "#007aff", "Apple Inc.: technology and consumer electronics company."),
    Instrument::new("ABBV", Stock, "", "#4169e1", "AbbVie Inc.: biopharmaceutical company."),
    Instrument::new("COST", Stock, "", "#e31837", "Costco Wholesale Corporation: membership warehouse club."),
    Instrument::new("DUK", Stock, "", "#005eb8", "Duke Energy Corporation: electric power and natural gas company."),
    Instrument::new("GIS", Stock, "", "#0057b8", "General Mills, Inc.: food processing company."),
    Instrument::new("KO", Stock, "", "#f40009", "The Coca-Cola Company: beverage company."),
    Instrument::new("MSFT", Stock, "", "#00a2ed", "Microsoft Corporation: technology and software company."),
    Instrument::new("SAP", Stock, "", "#0f7db8", "SAP SE: enterprise software company."),
    Instrument::new("XYZ", Stock, "", "#6c757d", "Block, Inc.: payments and financial services company."),
    // === Indicateurs macro (FRED) ===
    Instrument::new("CPIAUCSL", Macro, "CPI Inflation", "#28a745", "Consumer Price Index: inflation measured by price changes in consumer goods and services."),
    Instrument::new("FEDFUNDS", Macro, "Fed Funds Rate", "#dc3545", "Federal Funds Rate: overnight interbank lending rate."),
    Instrument::new("GDP", Macro, "GDP Growth", "#6f42c1", "Gross Domestic Product: total value of goods and services produced."),
    Instrument::new("M2SL", Macro, "Money Supply", "#fd7e14", "M2 Money Supply: cash, checking deposits and near money."),
    Instrument::new("MEHOINUSA672N", Macro, "Median Income", "#20c997", "Real Median Household Income: inflation-adjusted median income of U.S. households."),
    Instrument::new("PSAVERT", Macro, "Savings Rate", "#17a2b8", "Personal Savings Rate: share of disposable income that households save."),
    Instrument::new("UNRATE", Macro, "Unemployment", "#ffc107", "Unemployment Rate: share of the labor force unemployed and seeking work."),
    Instrument::new("UST10Y", Macro, "10Y Treasury", "#45b7d1", "10-Year U.S. Treasury Yield: benchmark long-term interest rate."),
];

/// Cherche un instrument par identifiant
pub fn find(id: &str) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.id == id)
}

/// Type d'un identifiant ; inconnu = instrument de prix
pub fn kind_of(id: &str) -> InstrumentKind {
    find(id).map(|i| i.kind).unwrap_or(InstrumentKind::Stock)
}

/// Couleur d'affichage (couleur par défaut si inconnu)
pub fn color_of(id: &str) -> &'static str {
    find(id).map(|i| i.color).unwrap_or(DEFAULT_COLOR)
}

/// Nom d'affichage sur le graphique (nom court pour les indicateurs macro)
pub fn trace_name(id: &str) -> String {
    match find(id) {
        Some(i) if i.kind.is_macro() && !i.short_name.is_empty() => i.short_name.to_string(),
        _ => id.to_string(),
    }
}

/// Identifiants des instruments de prix (téléchargés depuis Yahoo Finance)
pub fn price_ids() -> impl Iterator<Item = &'static str> {
    INSTRUMENTS.iter().filter(|i| !i.kind.is_macro()).map(|i| i.id)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<_> = INSTRUMENTS.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), INSTRUMENTS.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(kind_of("SPY"), InstrumentKind::Etf);
        assert_eq!(kind_of("UNRATE"), InstrumentKind::Macro);
        assert_eq!(kind_of("UNKNOWN"), InstrumentKind::Stock);
        assert_eq!(color_of("UNKNOWN"), DEFAULT_COLOR);
        assert_eq!(trace_name("UNRATE"), "Unemployment");
        assert_eq!(trace_name("SPY"), "SPY");
    }

    #[test]
    fn test_price_ids_exclude_macro() {
        assert!(price_ids().any(|id| id == "^VIX"));
        assert!(!price_ids().any(|id| id == TREASURY_10Y));
    }

    #[test]
    fn test_display() {
        assert_eq!(find("SPY").unwrap().display(), "SPY · S&P 500");
        assert_eq!(find("AAPL").unwrap().display(), "AAPL");
    }
}
