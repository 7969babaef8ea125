// ============================================================================
// Transformations : inflation et variation depuis la référence
// ============================================================================
// Fonctions pures, sans état :
// - cpi_for_date : CPI du mois contenant une date
// - adjust_for_inflation : valeur exprimée en dollars d'aujourd'hui
// - percent_change : variation formatée "+12.34%"
//
// Les absences (lookup raté, référence nulle) sont des Option::None,
// jamais des erreurs : l'appelant affiche simplement la valeur brute.
// ============================================================================

use chrono::{Datelike, NaiveDate};

use crate::models::{CpiTable, TimeSeriesPoint};

/// Ramène une date au premier jour de son mois (YYYY-MM-01)
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// CPI de l'entrée datée du 1er du mois contenant `date`
pub fn cpi_for_date(cpi: &CpiTable, date: NaiveDate) -> Option<f64> {
    cpi.value_at(month_start(date))
}

/// Ajuste une valeur à l'inflation : raw * (CPI le plus récent / CPI(date))
///
/// Retourne `raw` inchangée si le CPI du mois est introuvable
/// (ou nul) ou si la table est vide.
pub fn adjust_for_inflation(raw: f64, date: NaiveDate, cpi: &CpiTable) -> f64 {
    match dollar_equivalent(date, cpi) {
        Some(factor) => raw * factor,
        None => raw,
    }
}

/// Valeur aujourd'hui d'un dollar à la date donnée (CPI base / CPI(date))
pub fn dollar_equivalent(date: NaiveDate, cpi: &CpiTable) -> Option<f64> {
    let base = cpi.base()?;
    let at_date = cpi_for_date(cpi, date)?;
    (at_date != 0.0).then(|| base / at_date)
}

/// Série "érosion du dollar" : CPI base / CPI_i pour chaque entrée
pub fn dollar_erosion(cpi: &CpiTable) -> Vec<TimeSeriesPoint> {
    let Some(base) = cpi.base() else {
        return Vec::new();
    };
    cpi.entries()
        .iter()
        .filter(|p| p.value != 0.0)
        .map(|p| TimeSeriesPoint::new(p.date, base / p.value))
        .collect()
}

/// Variation en pourcentage depuis une valeur de référence
///
/// Format : deux décimales, signe "+" explicite si positif ou nul.
/// Retourne None si la référence est nulle (division par zéro).
///
/// # Exemple
/// ```
/// use marketnav::transform::percent_change;
/// assert_eq!(percent_change(150.0, 100.0).as_deref(), Some("+50.00%"));
/// ```
pub fn percent_change(current: f64, reference: f64) -> Option<String> {
    if reference == 0.0 {
        return None;
    }
    let change = (current - reference) / reference * 100.0;
    if !change.is_finite() {
        return None;
    }
    let sign = if change >= 0.0 { "+" } else { "" };
    Some(format!("{}{:.2}%", sign, change))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CpiRecord;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn table() -> CpiTable {
        CpiTable::from_records(&[
            CpiRecord { date: "2000-01-01".into(), value: 100.0 },
            CpiRecord { date: "2010-06-01".into(), value: 150.0 },
            CpiRecord { date: "2024-01-01".into(), value: 300.0 },
        ])
    }

    #[test]
    fn test_cpi_for_date_truncates_to_month() {
        let cpi = table();
        assert_eq!(cpi_for_date(&cpi, day("2010-06-17")), Some(150.0));
        assert_eq!(cpi_for_date(&cpi, day("2010-07-01")), None);
    }

    #[test]
    fn test_adjust_for_inflation() {
        let cpi = table();
        assert_eq!(adjust_for_inflation(10.0, day("2000-01-20"), &cpi), 30.0);
        assert_eq!(adjust_for_inflation(10.0, day("2010-06-03"), &cpi), 20.0);
    }

    #[test]
    fn test_adjust_passes_through_on_miss() {
        let cpi = table();
        assert_eq!(cpi_for_date(&cpi, day("1999-05-05")), None);
        assert_eq!(adjust_for_inflation(42.0, day("1999-05-05"), &cpi), 42.0);
        assert_eq!(adjust_for_inflation(42.0, day("2000-01-01"), &CpiTable::default()), 42.0);
    }

    #[test]
    fn test_percent_change_format() {
        assert_eq!(percent_change(100.0, 100.0).as_deref(), Some("+0.00%"));
        assert_eq!(percent_change(150.0, 100.0).as_deref(), Some("+50.00%"));
        assert_eq!(percent_change(50.0, 100.0).as_deref(), Some("-50.00%"));
        assert_eq!(percent_change(100.123, 100.0).as_deref(), Some("+0.12%"));
    }

    #[test]
    fn test_percent_change_guards_zero_reference() {
        assert_eq!(percent_change(10.0, 0.0), None);
    }

    #[test]
    fn test_dollar_erosion() {
        let erosion = dollar_erosion(&table());
        assert_eq!(erosion.len(), 3);
        assert_eq!(erosion[0].value, 3.0);
        assert_eq!(erosion[2].value, 1.0);
        assert!(dollar_erosion(&CpiTable::default()).is_empty());
    }
}
