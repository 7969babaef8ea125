// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI :
//
//   ┌ Instruments ┐┌ Marchés ─────────────────────────────────┐
//   │ [x] SPY …   ││ graphique principal                       │
//   │ [ ] QQQ     │└───────────────────────────────────────────┘
//   ├ Événements ┤┌ Indicateurs macro (si sélectionnés) ──────┐
//   │ [x] 2008 …  ││ graphique secondaire                      │
//   └─────────────┘└───────────────────────────────────────────┘
//    statut : référence, inflation, valeurs sous le curseur, description
//    raccourcis / confirmation de sortie
//
// CONCEPTS RATATUI :
// 1. Layout imbriqués : horizontal (panneaux) puis vertical
// 2. List + ListState : liste avec défilement automatique sur la sélection
// 3. Span et Line : composition de texte multicolore
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, Focus};
use crate::chart::Trace;
use crate::models::instrument::{InstrumentKind, INSTRUMENTS};
use crate::models::series::DATE_FORMAT;
use crate::models::event;
use crate::ui::chart::{parse_color, parse_rgb, render_figure};

/// Largeur du panneau de gauche (listes)
const SIDEBAR_WIDTH: u16 = 38;

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'interface complète
///
/// CONCEPT RUST : &App
/// - Le rendu ne fait que LIRE l'état
/// - Les figures sont reconstruites à chaque frame à partir de l'état
pub fn render(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Panneaux
            Constraint::Length(3), // Statut
            Constraint::Length(3), // Footer
        ])
        .split(frame.size())
        .to_vec();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[0])
        .to_vec();

    render_sidebar(frame, app, columns[0]);
    render_charts(frame, app, columns[1]);
    render_status(frame, app, rows[1]);
    render_footer(frame, app, rows[2]);
}

// ============================================================================
// Panneau de gauche : instruments et événements
// ============================================================================

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area)
        .to_vec();

    render_instrument_list(frame, app, chunks[0]);
    render_event_list(frame, app, chunks[1]);
}

/// Style du cadre selon que la liste a le focus
fn list_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x] "
    } else {
        "[ ] "
    }
}

/// En-tête de groupe dans la liste des instruments
fn kind_header(kind: InstrumentKind) -> &'static str {
    match kind {
        InstrumentKind::Etf => "── ETFs ──",
        InstrumentKind::Stock => "── Actions ──",
        InstrumentKind::Macro => "── Indicateurs macro ──",
    }
}

/// Liste des instruments, groupés par type
///
/// CONCEPT RUST : la ligne en surbrillance ne correspond pas à l'index de
/// l'instrument (les en-têtes de groupe occupent des lignes)
fn render_instrument_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Instruments;
    let mut items: Vec<ListItem> = Vec::new();
    let mut highlighted_row = None;
    let mut previous_kind = None;

    for (index, item) in INSTRUMENTS.iter().enumerate() {
        if previous_kind != Some(item.kind) {
            items.push(ListItem::new(Span::styled(
                kind_header(item.kind),
                Style::default().fg(Color::DarkGray),
            )));
            previous_kind = Some(item.kind);
        }

        if index == app.instrument_index {
            highlighted_row = Some(items.len());
        }

        let selected = app.selection.is_selected(item.id);
        let mut spans = vec![
            Span::styled(checkbox(selected), Style::default().fg(parse_color(item.color))),
            Span::raw(item.display()),
        ];
        if app.cache.is_loading(item.id) {
            spans.push(Span::styled(" …", Style::default().fg(Color::Yellow)));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    let title = format!(
        " Instruments ({} sélectionnés) ",
        app.selection.selected_instruments.len()
    );
    let list = List::new(items)
        .block(list_block(title, focused))
        .highlight_style(highlight_style(focused));

    let mut state = ListState::default().with_selected(highlighted_row);
    frame.render_stateful_widget(list, area, &mut state);
}

/// Liste des événements historiques avec le compteur d'activés
fn render_event_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Events;
    let events = event::events();

    let items: Vec<ListItem> = events
        .iter()
        .map(|e| {
            let enabled = app.selection.is_event_enabled(e.label);
            let style = if enabled {
                Style::default().fg(parse_rgb(e.color))
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(checkbox(enabled), style),
                Span::raw(e.annotation_text()),
            ]))
        })
        .collect();

    let title = format!(
        " Événements ({}/{} activés) ",
        app.selection.enabled_events.len(),
        events.len()
    );
    let list = List::new(items)
        .block(list_block(title, focused))
        .highlight_style(highlight_style(focused));

    let mut state = ListState::default().with_selected(Some(app.event_index));
    frame.render_stateful_widget(list, area, &mut state);
}

// ============================================================================
// Panneau de droite : graphiques
// ============================================================================

/// Graphique principal, plus le graphique macro si un indicateur est choisi
fn render_charts(frame: &mut Frame, app: &App, area: Rect) {
    if !app.has_macro_selection() {
        render_figure(frame, area, &app.primary_figure(), "Marchés", app.cursor);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area)
        .to_vec();

    render_figure(frame, chunks[0], &app.primary_figure(), "Marchés", app.cursor);
    render_figure(
        frame,
        chunks[1],
        &app.secondary_figure(),
        "Indicateurs macro",
        None,
    );
}

// ============================================================================
// Ligne de statut
// ============================================================================

/// Résumé d'une trace à la date du curseur
///
/// Format : "SPY 412.30 (+10.00%) 1$ = 1.25$ auj."
fn point_label(trace: &Trace, date: chrono::NaiveDate) -> Option<String> {
    let point = trace.point_at_or_before(date)?;
    let mut label = format!("{} {:.2}", trace.id, point.value);
    if let Some(change) = &point.change {
        label.push_str(&format!(" ({})", change));
    }
    if let Some(factor) = point.dollar_equivalent {
        label.push_str(&format!(" 1$ = {:.2}$ auj.", factor));
    }
    Some(label)
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let reference = app
        .selection
        .reference_date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "aucune".to_string());
    let inflation = if app.selection.adjust_for_inflation {
        Span::styled("ON", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("OFF", Style::default().fg(Color::DarkGray))
    };
    let overlays = |on: bool| if on { "ON" } else { "OFF" };

    let settings = Line::from(vec![
        Span::raw(" Référence : "),
        Span::styled(reference, Style::default().fg(Color::Cyan)),
        Span::raw("   Inflation : "),
        inflation,
        Span::raw(format!(
            "   Événements : {}   Événements macro : {}",
            overlays(app.selection.show_event_overlays),
            overlays(app.selection.show_macro_event_overlays)
        )),
    ]);

    let cursor_line = match app.cursor {
        Some(date) => {
            let figure = app.primary_figure();
            let values: Vec<String> = figure
                .traces
                .iter()
                .filter_map(|trace| point_label(trace, date))
                .collect();
            Line::from(vec![
                Span::styled(
                    format!(" ▏{} ", date.format(DATE_FORMAT)),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(values.join(" │ ")),
            ])
        }
        None => Line::from(Span::styled(
            " Curseur : [, .] pour le déplacer, [Entrée] pour fixer la date de référence",
            Style::default().fg(Color::DarkGray),
        )),
    };

    // Description de l'instrument ou de l'événement en surbrillance
    let description_line = match app.highlighted_description() {
        Some((title, description)) => Line::from(vec![
            Span::styled(format!(" {} : ", title), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(description, Style::default().fg(Color::Gray)),
        ]),
        None => Line::from(""),
    };

    frame.render_widget(
        Paragraph::new(vec![settings, cursor_line, description_line]),
        area,
    );
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
///
/// CONCEPT : Confirmation de quit two-step
/// - Si app.confirm_quit, affiche un message d'avertissement
/// - Sinon, affiche les raccourcis normaux
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    };

    let shortcuts = if app.confirm_quit {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            key("[q]"),
            Span::raw(" Quit  "),
            key("[Tab]"),
            Span::raw(" Liste  "),
            key("[Espace]"),
            Span::raw(" Choisir  "),
            key("[A/N]"),
            Span::raw(" Tous/aucun  "),
            key("[i]"),
            Span::raw(" Inflation  "),
            key("[←→ +-0]"),
            Span::raw(" Pan/zoom  "),
            key("[, . Entrée c]"),
            Span::raw(" Référence  "),
            key("[e/m]"),
            Span::raw(" Surimpressions"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{LineStyle, TracePoint};
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_point_label_uses_point_at_or_before() {
        let trace = Trace {
            id: "SPY".into(),
            name: "SPY".into(),
            color: "#1f77b4".into(),
            style: LineStyle::Solid,
            points: vec![TracePoint {
                date: day("2020-01-02"),
                value: 110.0,
                change: Some("+10.00%".into()),
                dollar_equivalent: Some(1.25),
            }],
        };

        assert_eq!(
            point_label(&trace, day("2020-01-05")).as_deref(),
            Some("SPY 110.00 (+10.00%) 1$ = 1.25$ auj.")
        );
        assert_eq!(point_label(&trace, day("2020-01-01")), None);
    }

    #[test]
    fn test_kind_headers_are_distinct() {
        assert_ne!(kind_header(InstrumentKind::Etf), kind_header(InstrumentKind::Stock));
        assert_ne!(kind_header(InstrumentKind::Stock), kind_header(InstrumentKind::Macro));
    }
}
