// ============================================================================
// Structure : HistoricalEvent
// ============================================================================
// Événements historiques affichés en surimpression sur les graphiques
// (récessions, krachs, bulles...)
//
// CONCEPTS RUST :
// 1. OnceLock : initialisation paresseuse d'une donnée globale immuable
// 2. filter_map : parse + filtre en une seule passe
// ============================================================================

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};

use crate::models::series::{parse_day, DateRange};

/// Un événement historique (lecture seule)
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalEvent {
    /// Libellé unique (sert d'identifiant)
    pub label: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Couleur au format "rgba(r, g, b, a)"
    pub color: &'static str,
    pub description: &'static str,
}

impl HistoricalEvent {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    /// Texte de l'annotation : "Label (2008)" ou "Label (2008-2009)"
    pub fn annotation_text(&self) -> String {
        let (start_year, end_year) = (self.start.year(), self.end.year());
        if start_year == end_year {
            format!("{} ({})", self.label, start_year)
        } else {
            format!("{} ({}-{})", self.label, start_year, end_year)
        }
    }
}

/// (label, début, fin, couleur, description)
type RawEvent = (&'static str, &'static str, &'static str, &'static str, &'static str);

const RAW_EVENTS: &[RawEvent] = &[
    ("1966 Credit Crunch", "1966-01-01", "1966-12-31", "rgba(255, 0, 0, 0.2)",
     "Credit crunch and market downturn following Federal Reserve tightening."),
    ("1969-70 Recession", "1969-12-01", "1970-11-01", "rgba(255, 0, 0, 0.2)",
     "Recession triggered by tight monetary policy and fiscal tightening."),
    ("1973-75 Recession", "1973-11-01", "1975-03-01", "rgba(255, 0, 0, 0.2)",
     "Severe recession due to oil crisis and stock market crash."),
    ("1970s Stagflation", "1974-01-01", "1982-12-31", "rgba(255, 165, 0, 0.2)",
     "Period of high inflation and stagnant economic growth."),
    ("1980-82 Recession", "1980-01-01", "1982-11-01", "rgba(255, 0, 0, 0.2)",
     "Double-dip recession with high interest rates to combat inflation."),
    ("1987 Black Monday", "1987-10-19", "1987-10-19", "rgba(128, 0, 128, 0.2)",
     "Largest one-day percentage decline in stock market history."),
    ("1990-91 Recession", "1990-07-01", "1991-03-01", "rgba(255, 0, 0, 0.2)",
     "Recession following savings and loan crisis and Gulf War."),
    ("Dot-Com Bubble Burst", "2000-03-10", "2002-10-09", "rgba(255, 165, 0, 0.2)",
     "Decline in technology stock valuations after a period of speculation in internet companies."),
    ("Housing Bubble", "2004-01-01", "2006-12-31", "rgba(255, 215, 0, 0.2)",
     "Real estate mania driven by low interest rates, loose lending standards and speculation."),
    ("2008 Financial Crisis", "2008-09-01", "2009-06-01", "rgba(255, 0, 0, 0.2)",
     "Global financial collapse triggered by the subprime mortgage crisis."),
    ("European Debt Crisis", "2010-04-01", "2012-06-01", "rgba(255, 215, 0, 0.2)",
     "Collapse of financial institutions, high government debt and rising bond spreads in Europe."),
    ("COVID-19 Crash", "2020-02-20", "2020-04-01", "rgba(0, 0, 255, 0.2)",
     "Market crash due to coronavirus pandemic uncertainty."),
    ("2022 Inflation Shock", "2022-01-01", "2022-12-31", "rgba(128, 0, 128, 0.2)",
     "Markets declined as interest rates rose in response to post-COVID inflation."),
    ("AI Boom", "2022-11-30", "2024-12-31", "rgba(0, 255, 127, 0.2)",
     "Market surge driven by generative AI adoption and AI chip demand."),
    ("2024 Trump Election", "2024-11-05", "2024-11-06", "rgba(255, 140, 0, 0.2)",
     "Market rally following the 2024 presidential election result."),
    ("Tariff Chaos", "2025-03-03", "2025-04-15", "rgba(255, 69, 0, 0.2)",
     "Volatility from tariff announcements on Mexico, Canada and \"Liberation Day\"."),
    ("DeepSeek Shock", "2025-01-27", "2025-01-28", "rgba(148, 0, 211, 0.2)",
     "Tech selloff triggered by a low-cost AI model from Chinese startup DeepSeek."),
];

/// Liste statique des événements, dans l'ordre d'affichage
pub fn events() -> &'static [HistoricalEvent] {
    static EVENTS: OnceLock<Vec<HistoricalEvent>> = OnceLock::new();
    EVENTS.get_or_init(|| {
        RAW_EVENTS
            .iter()
            .filter_map(|&(label, start, end, color, description)| {
                Some(HistoricalEvent {
                    label,
                    start: parse_day(start)?,
                    end: parse_day(end)?,
                    color,
                    description,
                })
            })
            .collect()
    })
}

/// Tous les libellés d'événements
pub fn all_labels() -> impl Iterator<Item = &'static str> {
    events().iter().map(|e| e.label)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_events_parse() {
        assert_eq!(events().len(), RAW_EVENTS.len());
    }

    #[test]
    fn test_labels_are_unique() {
        let labels: HashSet<_> = all_labels().collect();
        assert_eq!(labels.len(), events().len());
    }

    #[test]
    fn test_ranges_are_ordered() {
        assert!(events().iter().all(|e| e.start <= e.end));
    }

    #[test]
    fn test_annotation_text() {
        let covid = events().iter().find(|e| e.label == "COVID-19 Crash").unwrap();
        assert_eq!(covid.annotation_text(), "COVID-19 Crash (2020)");

        let crisis = events().iter().find(|e| e.label == "2008 Financial Crisis").unwrap();
        assert_eq!(crisis.annotation_text(), "2008 Financial Crisis (2008-2009)");
    }
}
