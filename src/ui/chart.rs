// ============================================================================
// Chart - Rendu d'un ChartFigure dans le terminal
// ============================================================================
// Dessine un graphique (traces, rectangles d'événements, annotations) sur un
// Canvas ratatui. Toute la logique (valeurs, plages, positions) est déjà
// calculée par crate::chart : ce module ne fait que convertir en pixels.
//
// CONCEPTS RUST :
// 1. Closures : le Canvas reçoit une closure de dessin (paint)
// 2. Iterator::windows : relier les points deux à deux
// 3. Parsing de chaînes sans regex : strip_prefix / split / parse
//
// CONCEPTS RATATUI :
// 1. Canvas : surface de dessin en coordonnées réelles (x_bounds, y_bounds)
// 2. Marker::Braille : 2x4 "pixels" par cellule, lignes fines
// 3. Context::layer : superposer les couches (rectangles sous les lignes)
// ============================================================================

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
        Block, Borders, Paragraph,
    },
    Frame,
};

use crate::chart::{ChartFigure, LineStyle, Shape, Trace};
use crate::models::series::DATE_FORMAT;

/// Couleur utilisée quand une couleur CSS est illisible
const FALLBACK_COLOR: Color = Color::Gray;

// ============================================================================
// Couleurs
// ============================================================================

/// Convertit une couleur CSS ("#rrggbb" ou "rgba(r, g, b, a)") en couleur
/// terminal
///
/// L'alpha est appliqué en assombrissant la couleur (fond noir supposé).
pub fn parse_color(css: &str) -> Color {
    parse_rgba(css)
        .map(|(r, g, b, a)| fade(Color::Rgb(r, g, b), a))
        .unwrap_or(FALLBACK_COLOR)
}

/// Comme parse_color, mais sans appliquer l'alpha
///
/// Les couleurs d'événements ont un alpha faible pensé pour un remplissage
/// sur fond clair : le texte et les contours utilisent la teinte pleine.
pub fn parse_rgb(css: &str) -> Color {
    parse_rgba(css)
        .map(|(r, g, b, _)| Color::Rgb(r, g, b))
        .unwrap_or(FALLBACK_COLOR)
}

/// Couleur du contour d'un rectangle d'événement : une seule opacité,
/// celle de la figure
fn shape_color(shape: &Shape) -> Color {
    fade(parse_rgb(shape.color), shape.opacity)
}

/// Décompose une couleur CSS en (r, g, b, alpha)
fn parse_rgba(css: &str) -> Option<(u8, u8, u8, f64)> {
    let css = css.trim();

    if let Some(hex) = css.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some((channel(0)?, channel(2)?, channel(4)?, 1.0));
    }

    let inner = css
        .strip_prefix("rgba(")
        .or_else(|| css.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let r = parts.next()?.parse().ok()?;
    let g = parts.next()?.parse().ok()?;
    let b = parts.next()?.parse().ok()?;
    let a = match parts.next() {
        Some(alpha) => alpha.parse::<f64>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Some((r, g, b, a))
}

/// Assombrit une couleur RGB selon une opacité (0 = noir, 1 = inchangée)
pub fn fade(color: Color, opacity: f64) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let scale = |c: u8| (c as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
            Color::Rgb(scale(r), scale(g), scale(b))
        }
        other => other,
    }
}

/// Abscisse d'une date sur le Canvas (jours depuis l'an 1)
fn x_of(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

// ============================================================================
// Rendu principal
// ============================================================================

/// Dessine un graphique complet : Canvas + légende
///
/// # Arguments
/// * `title` - Titre du cadre
/// * `cursor` - Date du curseur (ligne verticale), si présente
pub fn render_figure(
    frame: &mut Frame,
    area: Rect,
    figure: &ChartFigure,
    title: &str,
    cursor: Option<NaiveDate>,
) {
    // CONCEPT RUST : let-else pour les cas sans données
    let (Some(x_range), Some((y_min, y_max))) = (figure.x_range, figure.y_bounds()) else {
        render_no_data(frame, area, title);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area)
        .to_vec();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " {} · {} → {} · [{:.2} ; {:.2}] ",
            title,
            x_range.start.format(DATE_FORMAT),
            x_range.end.format(DATE_FORMAT),
            y_min,
            y_max
        ));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([x_of(x_range.start), x_of(x_range.end)])
        .y_bounds([y_min, y_max])
        .paint(|ctx| {
            // Couche 1 : rectangles d'événements (sous les lignes)
            for shape in &figure.shapes {
                ctx.draw(&Rectangle {
                    x: x_of(shape.start),
                    y: y_min,
                    width: x_of(shape.end) - x_of(shape.start),
                    height: y_max - y_min,
                    color: shape_color(shape),
                });
            }
            ctx.layer();

            // Couche 2 : traces
            for trace in &figure.traces {
                draw_trace(ctx, trace, x_range);
            }

            // Couche 3 : curseur
            if let Some(date) = cursor {
                ctx.draw(&CanvasLine {
                    x1: x_of(date),
                    y1: y_min,
                    x2: x_of(date),
                    y2: y_max,
                    color: Color::White,
                });
            }
            ctx.layer();

            // Couche 4 : annotations (texte au-dessus de tout)
            for annotation in &figure.annotations {
                if let Some(y) = figure.annotation_value(annotation.y) {
                    ctx.print(
                        x_of(annotation.x),
                        y,
                        Span::styled(
                            annotation.text.clone(),
                            Style::default().fg(parse_rgb(annotation.color)),
                        ),
                    );
                }
            }
        });

    frame.render_widget(canvas, chunks[0]);
    render_legend(frame, chunks[1], figure);
}

/// Relie les points visibles d'une trace
///
/// Style Dotted : un segment sur deux est dessiné.
fn draw_trace(ctx: &mut Context, trace: &Trace, range: crate::models::DateRange) {
    let color = parse_color(&trace.color);
    let points = trace.window(range);

    if let [only] = points {
        // Un seul point : petit trait horizontal pour rester visible
        ctx.draw(&CanvasLine {
            x1: x_of(only.date),
            y1: only.value,
            x2: x_of(only.date) + 1.0,
            y2: only.value,
            color,
        });
        return;
    }

    for (i, pair) in points.windows(2).enumerate() {
        if trace.style == LineStyle::Dotted && i % 2 == 1 {
            continue;
        }
        ctx.draw(&CanvasLine {
            x1: x_of(pair[0].date),
            y1: pair[0].value,
            x2: x_of(pair[1].date),
            y2: pair[1].value,
            color,
        });
    }
}

/// Légende : une entrée colorée par trace
fn render_legend(frame: &mut Frame, area: Rect, figure: &ChartFigure) {
    let spans: Vec<Span> = figure
        .traces
        .iter()
        .flat_map(|trace| {
            let marker = match trace.style {
                LineStyle::Solid => "━━ ",
                LineStyle::Dotted => "┅┅ ",
            };
            let style = Style::default().fg(parse_color(&trace.color));
            [
                Span::styled(marker, style),
                Span::styled(trace.name.clone(), style.add_modifier(Modifier::BOLD)),
                Span::raw("   "),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ============================================================================
// Helper : Message quand pas de données
// ============================================================================

fn render_no_data(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", title));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Aucune donnée à afficher",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "Sélectionnez un instrument [Espace] ou lancez `marketnav update`",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================
