use guardwatch_core::{LabeledValue, PanelView, Severity, SeverityCounts, WidgetPanel};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use std::f64::consts::{FRAC_PI_2, TAU};
use throbber_widgets_tui::{Throbber, ThrobberState};

pub const SLICE_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::Rgb(0, 0, 238),
    Color::LightBlue,
    Color::Gray,
];

const LABEL_WIDTH: usize = 12;

pub fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Draws the non-populated states and returns the records when the panel has
/// data. Callers only draw their chart for `Some`.
pub fn render_panel_frame<'a, T>(
    f: &mut Frame<'_>,
    area: Rect,
    block: Block<'_>,
    panel: &'a WidgetPanel<T>,
    throbber: &ThrobberState,
) -> Option<&'a [T]> {
    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel.view() {
        PanelView::Loading => {
            render_loading(f, inner, throbber);
            None
        }
        PanelView::Empty => {
            render_notice(f, inner, "No data for the current filters", Color::Gray);
            None
        }
        PanelView::Error(message) => {
            render_notice(f, inner, &format!("Failed to load: {message}"), Color::Red);
            None
        }
        PanelView::Populated(records) => Some(records),
    }
}

pub fn render_loading(f: &mut Frame<'_>, area: Rect, throbber: &ThrobberState) {
    if area.height == 0 {
        return;
    }
    let line = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    let spinner = Throbber::default()
        .label("Loading...")
        .style(Style::default().fg(Color::Gray))
        .throbber_style(Style::default().fg(Color::Cyan));
    let mut state = throbber.clone();
    f.render_stateful_widget(spinner, line, &mut state);
}

pub fn render_notice(f: &mut Frame<'_>, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(message.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    let line = Rect {
        y: area.y + area.height / 2,
        height: area.height - area.height / 2,
        ..area
    };
    f.render_widget(paragraph, line);
}

pub fn short_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        return label.to_string();
    }
    let mut short: String = label.chars().take(width.saturating_sub(1)).collect();
    short.push('~');
    short
}

/// Bar chart over any labeled records. The record under the cursor is
/// highlighted when the panel has focus.
pub fn render_bar_panel<T: LabeledValue>(
    f: &mut Frame<'_>,
    area: Rect,
    title: &str,
    panel: &WidgetPanel<T>,
    focused: bool,
    throbber: &ThrobberState,
    direction: Direction,
) {
    let block = panel_block(title, focused);
    let Some(records) = render_panel_frame(f, area, block.clone(), panel, throbber) else {
        return;
    };

    let bars: Vec<Bar<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let selected = focused && index == panel.cursor();
            let color = if selected { Color::Yellow } else { Color::Cyan };
            Bar::default()
                .value(record.value())
                .label(TextLine::from(short_label(record.label(), LABEL_WIDTH)))
                .style(Style::default().fg(color))
                .value_style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let max_value = records.iter().map(LabeledValue::value).max().unwrap_or(0).max(1);

    let chart = BarChart::default()
        .block(block)
        .direction(direction)
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(1)
        .bar_width(if direction == Direction::Horizontal { 1 } else { 5 });

    f.render_widget(chart, area);
}

/// One pie slice in radians, clockwise from twelve o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: u64,
    pub share: f64,
    pub start: f64,
    pub end: f64,
}

pub fn pie_slices<T: LabeledValue>(records: &[T]) -> Vec<Slice> {
    let total: u64 = records.iter().map(LabeledValue::value).sum();
    if total == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let total = total as f64;
    let mut start = 0.0;
    records
        .iter()
        .map(|record| {
            #[allow(clippy::cast_precision_loss)]
            let share = record.value() as f64 / total;
            let slice = Slice {
                label: record.label().to_string(),
                value: record.value(),
                share,
                start,
                end: share.mul_add(TAU, start),
            };
            start = slice.end;
            slice
        })
        .collect()
}

pub fn render_pie_panel<T: LabeledValue>(
    f: &mut Frame<'_>,
    area: Rect,
    title: &str,
    panel: &WidgetPanel<T>,
    focused: bool,
    throbber: &ThrobberState,
) {
    let block = panel_block(title, focused);
    let inner = block.inner(area);
    let Some(records) = render_panel_frame(f, area, block, panel, throbber) else {
        return;
    };

    let slices = pie_slices(records);
    if slices.is_empty() {
        render_notice(f, inner, "All counts are zero", Color::Gray);
        return;
    }

    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let selected = focused.then(|| panel.cursor());
    let pie_slices = slices.clone();
    let pie = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-1.1, 1.1])
        .y_bounds([-1.1, 1.1])
        .paint(move |ctx| {
            for (index, slice) in pie_slices.iter().enumerate() {
                let color = SLICE_COLORS[index % SLICE_COLORS.len()];
                let radius = if selected == Some(index) { 1.05 } else { 0.95 };
                let mut angle = slice.start;
                while angle < slice.end {
                    let theta = FRAC_PI_2 - angle;
                    ctx.draw(&CanvasLine {
                        x1: 0.0,
                        y1: 0.0,
                        x2: theta.cos() * radius,
                        y2: theta.sin() * radius,
                        color,
                    });
                    angle += 0.02;
                }
            }
        });
    f.render_widget(pie, split[0]);

    let legend: Vec<TextLine<'_>> = slices
        .iter()
        .enumerate()
        .map(|(index, slice)| {
            let color = SLICE_COLORS[index % SLICE_COLORS.len()];
            let marker = if selected == Some(index) { "> " } else { "  " };
            TextLine::from(vec![
                Span::raw(marker),
                Span::styled("■ ", Style::default().fg(color)),
                Span::styled(
                    short_label(&slice.label, LABEL_WIDTH),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!(" {} ({:.1}%)", slice.value, slice.share * 100.0),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(legend), split[1]);
}

pub fn render_severity_header(
    f: &mut Frame<'_>,
    area: Rect,
    panel: &WidgetPanel<SeverityCounts>,
    active: Option<Severity>,
    selected: Option<Severity>,
    focused: bool,
    throbber: &ThrobberState,
) {
    let block = panel_block("Open Issues by Severity", focused);
    let Some(records) = render_panel_frame(f, area, block.clone(), panel, throbber) else {
        return;
    };
    let counts = records.first().copied().unwrap_or_default();

    let mut spans = Vec::new();
    for severity in Severity::ALL {
        let color = match severity {
            Severity::High => Color::Red,
            Severity::Medium => Color::Yellow,
            Severity::Low => Color::Green,
        };
        let mut style = Style::default().fg(color);
        if active == Some(severity) {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if focused && selected == Some(severity) {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(
            format!(" {}: {} ", severity.label(), counts.count(severity)),
            style,
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        format!("Total: {}", counts.total()),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(TextLine::from(spans))
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardwatch_core::CountryCount;

    fn country(name: &str, count: u64) -> CountryCount {
        CountryCount {
            country_name: name.to_string(),
            count,
        }
    }

    #[test]
    fn slices_cover_the_full_circle_in_order() {
        let slices = pie_slices(&[country("a", 1), country("b", 3)]);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "a");
        assert!((slices[0].share - 0.25).abs() < 1e-9);
        assert!((slices[0].end - slices[1].start).abs() < 1e-9);
        assert!((slices[1].end - TAU).abs() < 1e-9);
    }

    #[test]
    fn zero_total_yields_no_slices() {
        assert!(pie_slices(&[country("a", 0)]).is_empty());
        assert!(pie_slices::<CountryCount>(&[]).is_empty());
    }

    #[test]
    fn long_labels_are_shortened() {
        assert_eq!(short_label("China", 12), "China");
        assert_eq!(short_label("United Kingdom", 8), "United ~");
    }
}
