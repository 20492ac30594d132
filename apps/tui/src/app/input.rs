use crossterm::event::KeyCode;
use guardwatch_core::{LabeledValue, Severity};

use crate::app::state::{App, InputMode, Panel};

pub fn handle_input(app: &mut App, key: KeyCode) {
    if app.show_help {
        if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1)) {
            app.show_help = false;
        }
        return;
    }

    if app.dashboard.map().detail().is_some() {
        match key {
            KeyCode::Esc | KeyCode::Enter => app.dashboard.map_mut().close_detail(),
            KeyCode::Char('q') => app.running = false,
            _ => {}
        }
        return;
    }

    match app.input_mode {
        InputMode::EditingAccount => handle_account_input(app, key),
        InputMode::Normal => handle_command(app, key),
    }
}

fn handle_account_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => app.submit_account_input(),
        KeyCode::Esc => app.cancel_account_input(),
        KeyCode::Backspace => {
            app.current_input.pop();
        }
        KeyCode::Char(c) => app.current_input.push(c),
        _ => {}
    }
}

fn handle_command(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') | KeyCode::F(1) => app.show_help = true,
        KeyCode::Tab => app.focus = cycle_focus(app.focus, true),
        KeyCode::BackTab => app.focus = cycle_focus(app.focus, false),
        KeyCode::Down | KeyCode::Right => move_selection(app, true),
        KeyCode::Up | KeyCode::Left => move_selection(app, false),
        KeyCode::Enter => activate(app),
        KeyCode::Char('a') => app.start_account_input(),
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('f') => app.fit_map(),
        _ => {}
    }
}

fn cycle_focus(focus: Panel, forward: bool) -> Panel {
    let len = Panel::ALL.len();
    let index = if forward {
        wrap_increment(focus.index(), len)
    } else {
        wrap_decrement(focus.index(), len)
    };
    Panel::from_index(index).unwrap_or(Panel::Severity)
}

fn move_selection(app: &mut App, forward: bool) {
    let dashboard = &mut app.dashboard;
    match (app.focus, forward) {
        (Panel::Severity, true) => {
            app.severity_index = wrap_increment(app.severity_index, Severity::ALL.len());
        }
        (Panel::Severity, false) => {
            app.severity_index = wrap_decrement(app.severity_index, Severity::ALL.len());
        }
        (Panel::Countries, true) => dashboard.countries_mut().select_next(),
        (Panel::Countries, false) => dashboard.countries_mut().select_previous(),
        (Panel::Technologies, true) => dashboard.technologies_mut().select_next(),
        (Panel::Technologies, false) => dashboard.technologies_mut().select_previous(),
        (Panel::Months, true) => dashboard.months_mut().select_next(),
        (Panel::Months, false) => dashboard.months_mut().select_previous(),
        (Panel::Map, true) => dashboard.map_mut().select_next_marker(),
        (Panel::Map, false) => dashboard.map_mut().select_previous_marker(),
    }
}

fn activate(app: &mut App) {
    match app.focus {
        Panel::Severity => {
            if let Some(severity) = app.selected_severity() {
                app.select_severity(severity);
            }
        }
        Panel::Countries => {
            if let Some(country) = app.dashboard.countries().selected() {
                let country = country.label().to_string();
                app.select_country(&country);
            }
        }
        Panel::Technologies => {
            if let Some(share) = app.dashboard.technologies().selected() {
                let technology = share.label().to_string();
                app.select_technology(&technology);
            }
        }
        Panel::Months => {
            if let Some(month) = app.dashboard.months().selected() {
                app.status_message = format!("{}: {} issues", month.label(), month.value());
            }
        }
        Panel::Map => {
            if !app.dashboard.map_mut().activate_selected() {
                app.status_message = "No marker to open".to_string();
            }
        }
    }
}

const fn wrap_decrement(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    if index == 0 {
        len - 1
    } else {
        index - 1
    }
}

const fn wrap_increment(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    (index + 1) % len
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardwatch_core::{Dashboard, Dataset, LoadOutcome, WidgetId};
    use guardwatch_core::metric::{CountryCount, GeoEvent, TechnologyShare};

    fn loaded_app() -> App {
        let mut app = App::new(Dashboard::new());
        app.initial_load();
        for plan in app.take_pending() {
            for request in plan {
                let result = match request.widget {
                    WidgetId::CountryBar => Ok(Dataset::Countries(vec![
                        CountryCount { country_name: "China".into(), count: 5 },
                        CountryCount { country_name: "Russia".into(), count: 4 },
                    ])),
                    WidgetId::TechnologyPie => Ok(Dataset::Technologies(vec![TechnologyShare {
                        technology: "s3".into(),
                        count: 3,
                        percentage: 100.0,
                    }])),
                    WidgetId::Map => Ok(Dataset::Events(vec![geo("Russia", 55.7, 37.6)])),
                    WidgetId::SeveritySummary => Ok(Dataset::Severity(Vec::new())),
                    WidgetId::TimeBar => Ok(Dataset::Months(Vec::new())),
                };
                app.apply(LoadOutcome {
                    widget: request.widget,
                    seq: request.seq,
                    result,
                });
            }
        }
        app
    }

    fn geo(country: &str, lat: f64, lon: f64) -> GeoEvent {
        let json = format!(r#"{{"lat":{lat},"lon":{lon},"countryName":"{country}","count":1}}"#);
        serde_json::from_str(&json).unwrap_or_else(|e| panic!("bad fixture: {e}"))
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            handle_input(app, *key);
        }
    }

    #[test]
    fn tab_cycles_focus_both_ways() {
        let mut app = App::new(Dashboard::new());
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        assert_eq!(app.focus, Panel::Map);
        press(&mut app, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(app.focus, Panel::Months);
    }

    #[test]
    fn enter_on_severity_row_filters_by_it() {
        let mut app = loaded_app();
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);

        assert_eq!(app.dashboard.filters().severity(), Some(Severity::Medium));
        let plans = app.take_pending();
        assert_eq!(plans.len(), 1);
        assert!(!plans[0].contains(WidgetId::CountryBar));
    }

    #[test]
    fn enter_on_country_recenters_map_without_reload() {
        let mut app = loaded_app();
        app.focus = Panel::Countries;
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);

        assert!(app.take_pending().is_empty());
        assert_eq!(app.status_message, "Map centred on Russia");

        press(&mut app, &[KeyCode::Up, KeyCode::Enter]);
        assert_eq!(app.status_message, "No markers for China");
    }

    #[test]
    fn enter_on_technology_selects_it() {
        let mut app = loaded_app();
        app.focus = Panel::Technologies;
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.dashboard.filters().technology(), "s3");
    }

    #[test]
    fn map_detail_opens_and_escape_closes_it() {
        let mut app = loaded_app();
        app.focus = Panel::Map;
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.dashboard.map().detail().is_some());

        // Other commands are ignored while the detail popup is open.
        press(&mut app, &[KeyCode::Char('c')]);
        assert!(app.take_pending().is_empty());

        press(&mut app, &[KeyCode::Esc]);
        assert!(app.dashboard.map().detail().is_none());
    }

    #[test]
    fn account_input_collects_characters() {
        let mut app = App::new(Dashboard::new());
        press(
            &mut app,
            &[
                KeyCode::Char('a'),
                KeyCode::Char('d'),
                KeyCode::Char('e'),
                KeyCode::Char('x'),
                KeyCode::Backspace,
                KeyCode::Char('v'),
                KeyCode::Enter,
            ],
        );

        assert_eq!(app.dashboard.filters().account(), "dev");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn quit_key_is_text_while_editing() {
        let mut app = App::new(Dashboard::new());
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char('q')]);
        assert!(app.running);
        assert_eq!(app.current_input, "q");

        press(&mut app, &[KeyCode::Esc, KeyCode::Char('q')]);
        assert!(!app.running);
    }

    #[test]
    fn help_swallows_keys_until_closed() {
        let mut app = App::new(Dashboard::new());
        press(&mut app, &[KeyCode::F(1), KeyCode::Char('r')]);
        assert!(app.show_help);
        assert!(app.take_pending().is_empty());

        press(&mut app, &[KeyCode::Char('?')]);
        assert!(!app.show_help);
    }

    #[test]
    fn wrap_helpers_handle_empty_lists() {
        assert_eq!(wrap_increment(0, 0), 0);
        assert_eq!(wrap_decrement(0, 0), 0);
        assert_eq!(wrap_decrement(0, 3), 2);
        assert_eq!(wrap_increment(2, 3), 0);
    }
}
