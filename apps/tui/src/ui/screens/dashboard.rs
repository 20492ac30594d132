use crate::app::{App, InputMode, Panel};
use crate::ui::widgets::charts::{render_bar_panel, render_pie_panel, render_severity_header};
use crate::ui::widgets::map::render_map_panel;
use crate::ui::widgets::popup::{render_account_popup, render_detail_popup, render_help_popup};
use guardwatch_core::WidgetId;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render_dashboard(app: &App, f: &mut Frame<'_>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Title and filters
            Constraint::Length(3),      // Severity header
            Constraint::Percentage(55), // Countries and map
            Constraint::Min(8),         // Technologies and months
            Constraint::Length(3),      // Status
            Constraint::Length(1),      // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(1, 0)));

    render_title(app, f, layout[0]);

    let dashboard = &app.dashboard;
    let filters = dashboard.filters();
    render_severity_header(
        f,
        layout[1],
        dashboard.severity(),
        filters.severity(),
        app.selected_severity(),
        app.focus == Panel::Severity,
        &app.throbber,
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(layout[2]);
    render_bar_panel(
        f,
        middle[0],
        WidgetId::CountryBar.label(),
        dashboard.countries(),
        app.focus == Panel::Countries,
        &app.throbber,
        Direction::Horizontal,
    );
    render_map_panel(
        f,
        middle[1],
        dashboard.state_of(WidgetId::Map),
        dashboard.map(),
        app.focus == Panel::Map,
        &app.throbber,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[3]);
    render_pie_panel(
        f,
        bottom[0],
        WidgetId::TechnologyPie.label(),
        dashboard.technologies(),
        app.focus == Panel::Technologies,
        &app.throbber,
    );
    render_bar_panel(
        f,
        bottom[1],
        WidgetId::TimeBar.label(),
        dashboard.months(),
        app.focus == Panel::Months,
        &app.throbber,
        Direction::Vertical,
    );

    render_status(app, f, layout[4]);
    render_shortcuts(f, layout[5]);

    if let Some(event) = dashboard.map().detail() {
        render_detail_popup(f, event);
    }
    if app.input_mode == InputMode::EditingAccount {
        render_account_popup(f, &app.current_input);
    }
    if app.show_help {
        render_help_popup(f);
    }
}

fn render_title(app: &App, f: &mut Frame<'_>, area: Rect) {
    let refreshed = app.last_refresh.map_or_else(
        || "never".to_string(),
        |at| at.format("%H:%M:%S").to_string(),
    );

    let title = Paragraph::new(TextLine::from(vec![
        Span::styled(
            "Guardwatch ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Security Dashboard", Style::default().fg(Color::White)),
        Span::raw("   "),
        Span::styled(
            format!("[{}]", app.filter_summary()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("   "),
        Span::styled(
            format!("last request {refreshed}"),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(title, area);
}

fn render_status(app: &App, f: &mut Frame<'_>, area: Rect) {
    let loading = WidgetId::ALL
        .iter()
        .filter(|&&widget| app.dashboard.state_of(widget).is_loading())
        .count();
    let status = if loading > 0 {
        format!("{}  ({loading} panel(s) loading)", app.status_message)
    } else {
        app.status_message.clone()
    };

    let paragraph = Paragraph::new(status)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(format!(" Focus: {} ", app.focus.label()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(paragraph, area);
}

fn render_shortcuts(f: &mut Frame<'_>, area: Rect) {
    let hint = Paragraph::new(Span::styled(
        "Tab focus | Enter select | a account | c clear | r refresh | f fit map | ? help | q quit",
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint, area);
}
