mod animation;
mod fetch;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use animation::{advance_spinner, spinner_glyph, SpinnerMode};
use fetch::{WebFetcher, API_BASE};
use guardwatch_core::loader::execute;
use guardwatch_core::{
    Dashboard, LabeledValue, PanelView, ReloadPlan, Severity, WidgetId, WidgetPanel, WidgetState,
};
use ratzilla::event::{KeyCode, KeyEvent};
use ratzilla::ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line as TextLine, Span, Text},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use ratzilla::{DomBackend, WebRenderer};
use wasm_bindgen_futures::spawn_local;

const PANELS: [WidgetId; 5] = [
    WidgetId::SeveritySummary,
    WidgetId::CountryBar,
    WidgetId::Map,
    WidgetId::TechnologyPie,
    WidgetId::TimeBar,
];

struct WebState {
    dashboard: Dashboard,
    focus: usize,
    severity_index: usize,
    show_help: bool,
    editing_account: Option<String>,
    status: String,
    spinner: f64,
    last_tick: Option<f64>,
}

impl WebState {
    fn new() -> Self {
        Self {
            dashboard: Dashboard::new(),
            focus: 0,
            severity_index: 0,
            show_help: false,
            editing_account: None,
            status: "Loading dashboard...".to_string(),
            spinner: 0.0,
            last_tick: None,
        }
    }

    fn focused(&self) -> WidgetId {
        PANELS[self.focus % PANELS.len()]
    }

    /// Applies one key press and returns the loads it triggered.
    fn handle_key(&mut self, event: &KeyEvent) -> Option<ReloadPlan> {
        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1)) {
                self.show_help = false;
            }
            return None;
        }

        if self.dashboard.map().detail().is_some() {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.dashboard.map_mut().close_detail();
            }
            return None;
        }

        if let Some(input) = self.editing_account.as_mut() {
            match event.code {
                KeyCode::Char(c) => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => self.editing_account = None,
                KeyCode::Enter => {
                    let account = self.editing_account.take().unwrap_or_default();
                    self.status = format!("Account: {}", display_account(&account));
                    return Some(self.dashboard.select_account(&account));
                }
                _ => {}
            }
            return None;
        }

        match event.code {
            KeyCode::Tab if event.shift => self.focus = (self.focus + PANELS.len() - 1) % PANELS.len(),
            KeyCode::Tab => self.focus = (self.focus + 1) % PANELS.len(),
            KeyCode::Down | KeyCode::Right => self.move_selection(true),
            KeyCode::Up | KeyCode::Left => self.move_selection(false),
            KeyCode::Enter => return self.activate(),
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('a') => {
                self.editing_account = Some(self.dashboard.filters().account().to_string());
            }
            KeyCode::Char('c') => {
                self.severity_index = 0;
                self.status = "Filters cleared".to_string();
                return Some(self.dashboard.clear_filters());
            }
            KeyCode::Char('r') => {
                self.status = "Refreshing all panels".to_string();
                return Some(self.dashboard.refresh());
            }
            KeyCode::Char('f') => self.dashboard.map_mut().fit_all(),
            _ => {}
        }
        None
    }

    fn move_selection(&mut self, forward: bool) {
        let len = Severity::ALL.len();
        match (self.focused(), forward) {
            (WidgetId::SeveritySummary, true) => self.severity_index = (self.severity_index + 1) % len,
            (WidgetId::SeveritySummary, false) => {
                self.severity_index = (self.severity_index + len - 1) % len;
            }
            (WidgetId::CountryBar, true) => self.dashboard.countries_mut().select_next(),
            (WidgetId::CountryBar, false) => self.dashboard.countries_mut().select_previous(),
            (WidgetId::TechnologyPie, true) => self.dashboard.technologies_mut().select_next(),
            (WidgetId::TechnologyPie, false) => self.dashboard.technologies_mut().select_previous(),
            (WidgetId::TimeBar, true) => self.dashboard.months_mut().select_next(),
            (WidgetId::TimeBar, false) => self.dashboard.months_mut().select_previous(),
            (WidgetId::Map, true) => self.dashboard.map_mut().select_next_marker(),
            (WidgetId::Map, false) => self.dashboard.map_mut().select_previous_marker(),
        }
    }

    fn activate(&mut self) -> Option<ReloadPlan> {
        match self.focused() {
            WidgetId::SeveritySummary => {
                let severity = Severity::from_index(self.severity_index)?;
                self.status = format!("Severity: {}", severity.label());
                Some(self.dashboard.select_severity(severity))
            }
            WidgetId::TechnologyPie => {
                let technology = self.dashboard.technologies().selected()?.label().to_string();
                self.status = format!("Technology: {technology}");
                Some(self.dashboard.select_technology(&technology))
            }
            WidgetId::CountryBar => {
                let country = self.dashboard.countries().selected()?.label().to_string();
                self.status = if self.dashboard.select_country(&country) {
                    format!("Map centred on {country}")
                } else {
                    format!("No markers for {country}")
                };
                None
            }
            WidgetId::TimeBar => {
                let month = self.dashboard.months().selected()?;
                self.status = format!("{}: {} issues", month.label(), month.value());
                None
            }
            WidgetId::Map => {
                self.dashboard.map_mut().activate_selected();
                None
            }
        }
    }
}

fn display_account(account: &str) -> &str {
    if account.trim().is_empty() {
        "all accounts"
    } else {
        account.trim()
    }
}

fn dispatch(state: &Rc<RefCell<WebState>>, fetcher: &Rc<WebFetcher>, plan: ReloadPlan) {
    for request in plan {
        let state = state.clone();
        let fetcher = fetcher.clone();
        spawn_local(async move {
            let outcome = execute(fetcher.as_ref(), request).await;
            if let Err(error) = &outcome.result {
                web_sys::console::error_1(
                    &format!("Failed to load {}: {error}", outcome.widget.label()).into(),
                );
            }
            state.borrow_mut().dashboard.apply(outcome);
        });
    }
}

fn main() -> io::Result<()> {
    let state = Rc::new(RefCell::new(WebState::new()));
    let fetcher = Rc::new(WebFetcher::new(API_BASE));

    let plan = state.borrow_mut().dashboard.initial_load();
    dispatch(&state, &fetcher, plan);

    let backend = DomBackend::new()?;
    let mut terminal = Terminal::new(backend)?;

    terminal.on_key_event({
        let state = state.clone();
        let fetcher = fetcher.clone();
        move |event| {
            let plan = state.borrow_mut().handle_key(&event);
            if let Some(plan) = plan {
                dispatch(&state, &fetcher, plan);
            }
        }
    });

    terminal.draw_web(move |f| {
        let mut state = state.borrow_mut();
        let mode = if state.dashboard.is_loading() {
            SpinnerMode::Running
        } else {
            SpinnerMode::Idle
        };
        let (spinner, last_tick) =
            advance_spinner(state.spinner, state.last_tick, js_sys::Date::now() / 1000.0, mode);
        state.spinner = spinner;
        state.last_tick = last_tick;

        render_dashboard(&state, f);
    });

    Ok(())
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn render_dashboard(state: &WebState, f: &mut Frame<'_>) {
    let area = f.area();
    let block = Block::default()
        .title("Guardwatch")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area).inner(Margin::new(1, 0));
    f.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(55),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(inner);

    let spinner = spinner_glyph(state.spinner);
    let focused = state.focused();

    render_severity(state, f, layout[0], spinner);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(layout[1]);
    render_bars(
        f,
        middle[0],
        state.dashboard.countries(),
        WidgetId::CountryBar,
        focused == WidgetId::CountryBar,
        spinner,
        Direction::Horizontal,
    );
    render_map(state, f, middle[1], spinner);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[2]);
    render_technologies(state, f, bottom[0], spinner);
    render_bars(
        f,
        bottom[1],
        state.dashboard.months(),
        WidgetId::TimeBar,
        focused == WidgetId::TimeBar,
        spinner,
        Direction::Vertical,
    );

    let footer = Paragraph::new(Span::styled(
        format!(
            "{}  |  Tab focus  Enter select  a account  c clear  r refresh  f fit  ? help",
            state.status
        ),
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(footer, layout[3]);

    if let Some(event) = state.dashboard.map().detail() {
        let lines: Vec<TextLine<'_>> = event
            .detail_fields()
            .into_iter()
            .map(|(name, value)| {
                TextLine::from(vec![
                    Span::styled(format!("{name:<14}"), Style::default().fg(Color::Cyan)),
                    Span::raw(value),
                ])
            })
            .collect();
        render_popup(f, "Event Detail", Text::from(lines));
    } else if let Some(input) = &state.editing_account {
        render_popup(
            f,
            "Account",
            Text::from(vec![
                TextLine::from("Account id (empty for all accounts):"),
                TextLine::from(format!("{input}_")),
            ]),
        );
    } else if state.show_help {
        render_popup(
            f,
            "Help",
            Text::from(vec![
                TextLine::from("Tab / Shift+Tab  move focus"),
                TextLine::from("Arrows           move selection"),
                TextLine::from("Enter            filter, centre map or open marker"),
                TextLine::from("a                select account"),
                TextLine::from("c                clear filters"),
                TextLine::from("r                refresh"),
                TextLine::from("f                fit map"),
                TextLine::from("Esc              close popup"),
            ]),
        );
    }
}

/// Draws the loading, empty and error states; returns the records otherwise.
fn panel_records<'a, T>(
    f: &mut Frame<'_>,
    area: Rect,
    panel: &'a WidgetPanel<T>,
    spinner: &str,
) -> Option<&'a [T]> {
    let message = match panel.view() {
        PanelView::Populated(records) => return Some(records),
        PanelView::Loading => (format!("{spinner} Loading..."), Color::Gray),
        PanelView::Empty => ("No data for the current filters".to_string(), Color::Gray),
        PanelView::Error(error) => (format!("Failed to load: {error}"), Color::Red),
    };
    render_message(f, area, message.0, message.1);
    None
}

fn render_message(f: &mut Frame<'_>, area: Rect, message: String, color: Color) {
    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_severity(state: &WebState, f: &mut Frame<'_>, area: Rect, spinner: &str) {
    let focused = state.focused() == WidgetId::SeveritySummary;
    let block = panel_block(WidgetId::SeveritySummary.label(), focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(records) = panel_records(f, inner, state.dashboard.severity(), spinner) else {
        return;
    };
    let counts = records.first().copied().unwrap_or_default();
    let active = state.dashboard.filters().severity();

    let mut spans = Vec::new();
    for (index, severity) in Severity::ALL.into_iter().enumerate() {
        let mut style = Style::default().fg(match severity {
            Severity::High => Color::Red,
            Severity::Medium => Color::Yellow,
            Severity::Low => Color::Green,
        });
        if active == Some(severity) {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if focused && index == state.severity_index {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(
            format!(" {}: {} ", severity.label(), counts.count(severity)),
            style,
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::raw(format!("Total: {}", counts.total())));

    f.render_widget(
        Paragraph::new(TextLine::from(spans)).alignment(Alignment::Center),
        inner,
    );
}

fn render_bars<T: LabeledValue>(
    f: &mut Frame<'_>,
    area: Rect,
    panel: &WidgetPanel<T>,
    widget: WidgetId,
    focused: bool,
    spinner: &str,
    direction: Direction,
) {
    let block = panel_block(widget.label(), focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(records) = panel_records(f, inner, panel, spinner) else {
        return;
    };

    let bars: Vec<Bar<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let color = if focused && index == panel.cursor() {
                Color::Yellow
            } else {
                Color::Cyan
            };
            Bar::default()
                .value(record.value())
                .label(TextLine::from(record.label().to_string()))
                .style(Style::default().fg(color))
        })
        .collect();
    let max_value = records.iter().map(LabeledValue::value).max().unwrap_or(0).max(1);

    let chart = BarChart::default()
        .direction(direction)
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(1)
        .bar_width(if direction == Direction::Horizontal { 1 } else { 5 });
    f.render_widget(chart, inner);
}

fn render_technologies(state: &WebState, f: &mut Frame<'_>, area: Rect, spinner: &str) {
    let focused = state.focused() == WidgetId::TechnologyPie;
    let panel = state.dashboard.technologies();
    let block = panel_block(WidgetId::TechnologyPie.label(), focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(records) = panel_records(f, inner, panel, spinner) else {
        return;
    };

    let total: u64 = records.iter().map(LabeledValue::value).sum::<u64>().max(1);
    let lines: Vec<TextLine<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            #[allow(clippy::cast_precision_loss)]
            let share = record.value() as f64 / total as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let width = (share * 20.0).round() as usize;
            let marker = if focused && index == panel.cursor() { "> " } else { "  " };
            TextLine::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<14}", record.label()), Style::default().fg(Color::White)),
                Span::styled("█".repeat(width), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!(" {} ({:.1}%)", record.value(), share * 100.0),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_map(state: &WebState, f: &mut Frame<'_>, area: Rect, spinner: &str) {
    let focused = state.focused() == WidgetId::Map;
    let block = panel_block(WidgetId::Map.label(), focused);
    let inner = block.inner(area);

    match state.dashboard.state_of(WidgetId::Map) {
        WidgetState::Loading => {
            f.render_widget(block, area);
            render_message(f, inner, format!("{spinner} Loading..."), Color::Gray);
            return;
        }
        WidgetState::Error(error) => {
            f.render_widget(block, area);
            render_message(f, inner, format!("Failed to load: {error}"), Color::Red);
            return;
        }
        WidgetState::Empty | WidgetState::Populated => {}
    }

    let map = state.dashboard.map();
    let viewport = map.viewport();
    let clusters = map.clusters((inner.width / 4).max(1), (inner.height / 2).max(1));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([viewport.west, viewport.east])
        .y_bounds([viewport.south, viewport.north])
        .paint(move |ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();
            for cluster in &clusters {
                let text = if cluster.members > 1 {
                    cluster.members.to_string()
                } else {
                    "●".to_string()
                };
                ctx.print(
                    cluster.center.lon,
                    cluster.center.lat,
                    Span::styled(text, Style::default().fg(Color::Yellow)),
                );
            }
        });
    f.render_widget(canvas, area);

    if map.shows_empty_indicator() {
        render_message(f, inner, "No geolocation data".to_string(), Color::Gray);
    }
}

fn render_popup(f: &mut Frame<'_>, title: &str, text: Text<'_>) {
    let area = f.area();
    let width = (area.width * 3 / 5).max(20).min(area.width);
    let height = (area.height * 3 / 5).max(6).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    f.render_widget(Clear, popup);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(format!(" {title} (Esc to close) "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup);
}
