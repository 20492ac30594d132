use guardwatch_core::GeoEvent;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);

    horizontal_layout[1]
}

fn popup_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn render_hint(f: &mut Frame<'_>, popup_area: Rect, hint: &str) {
    let hint = Paragraph::new(Span::styled(hint.to_string(), Style::default().fg(Color::Gray)))
        .alignment(Alignment::Center);

    let hint_area = Rect {
        x: popup_area.x,
        y: popup_area.y + popup_area.height.saturating_sub(2),
        width: popup_area.width,
        height: 1,
    };

    f.render_widget(hint, hint_area);
}

pub fn detail_lines(event: &GeoEvent) -> Vec<TextLine<'static>> {
    event
        .detail_fields()
        .into_iter()
        .map(|(name, value)| {
            TextLine::from(vec![
                Span::styled(
                    format!("{name:<14}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(value, Style::default().fg(Color::White)),
            ])
        })
        .collect()
}

pub fn render_detail_popup(f: &mut Frame<'_>, event: &GeoEvent) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(Text::from(detail_lines(event)))
        .block(popup_block("== Event Detail ==", Color::Yellow))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);

    render_hint(f, popup_area, "Press Esc to close");
}

pub fn render_account_popup(f: &mut Frame<'_>, input: &str) {
    let area = f.area();
    let popup_area = Rect {
        height: 5.min(area.height),
        ..centered_rect(50, 20, area)
    };
    f.render_widget(Clear, popup_area);

    let lines = vec![
        TextLine::from(Span::styled(
            "Account id (empty for all accounts):",
            Style::default().fg(Color::Green),
        )),
        TextLine::from(vec![
            Span::styled(input.to_string(), Style::default().fg(Color::White)),
            Span::styled("_", Style::default().fg(Color::Green)),
        ]),
    ];

    let paragraph = Paragraph::new(Text::from(lines)).block(popup_block(" Account ", Color::Green));
    f.render_widget(paragraph, popup_area);
}

pub fn help_lines() -> Vec<TextLine<'static>> {
    let bindings = [
        ("Tab / Shift+Tab", "Move focus between panels"),
        ("Arrows", "Move the selection in the focused panel"),
        ("Enter", "Filter by severity or technology, centre the map on a country, open a marker"),
        ("a", "Select an account"),
        ("c", "Clear all filters"),
        ("r", "Refresh every panel"),
        ("f", "Fit the map to all markers"),
        ("? / F1", "Toggle this help"),
        ("Esc", "Close a popup"),
        ("q", "Quit"),
    ];

    let mut lines = vec![
        TextLine::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
    ];
    lines.extend(bindings.into_iter().map(|(key, action)| {
        TextLine::from(vec![
            Span::styled(
                format!("{key:<18}"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(action),
        ])
    }));
    lines
}

pub fn render_help_popup(f: &mut Frame<'_>) {
    let popup_area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, popup_area);

    let help_paragraph = Paragraph::new(Text::from(help_lines()))
        .block(popup_block("== Help & Keyboard Shortcuts ==", Color::Yellow))
        .wrap(Wrap { trim: true });
    f.render_widget(help_paragraph, popup_area);

    render_hint(f, popup_area, "Press ? or Esc to close");
}
