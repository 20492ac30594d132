use chrono::Local;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use guardwatch_core::{Applied, Dashboard, LabeledValue, LoadOutcome, SeverityCounts, WidgetId, WidgetState};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{handle_input, App, AppActions};
use crate::terminal::Tui;
use crate::ui;

/// Run the dashboard once without a UI and print a report
pub async fn run_headless(app: &mut App, actions: &AppActions, json: bool) -> Result<()> {
    app.initial_load();
    for plan in app.take_pending() {
        for outcome in actions.run_to_completion(plan).await {
            app.apply(outcome);
        }
    }

    let report = build_report(&app.dashboard);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct HeadlessReport {
    generated_at: String,
    filters: HeadlessFilters,
    panels: Vec<HeadlessPanel>,
    severity: Option<SeverityCounts>,
    top_countries: Vec<HeadlessEntry>,
    technologies: Vec<HeadlessEntry>,
    issues_by_month: Vec<HeadlessEntry>,
    map_markers: usize,
}

#[derive(Debug, Serialize)]
struct HeadlessFilters {
    account: Option<String>,
    severity: Option<String>,
    technology: Option<String>,
}

#[derive(Debug, Serialize)]
struct HeadlessPanel {
    widget: &'static str,
    status: &'static str,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HeadlessEntry {
    label: String,
    value: u64,
}

fn entries<T: LabeledValue>(records: &[T]) -> Vec<HeadlessEntry> {
    records
        .iter()
        .map(|record| HeadlessEntry {
            label: record.label().to_string(),
            value: record.value(),
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn build_report(dashboard: &Dashboard) -> HeadlessReport {
    let filters = dashboard.filters();

    let panels = WidgetId::ALL
        .iter()
        .map(|&widget| {
            let (status, error) = match dashboard.state_of(widget) {
                WidgetState::Loading => ("loading", None),
                WidgetState::Empty => ("empty", None),
                WidgetState::Populated => ("populated", None),
                WidgetState::Error(message) => ("error", Some(message.clone())),
            };
            HeadlessPanel {
                widget: widget.label(),
                status,
                error,
            }
        })
        .collect();

    HeadlessReport {
        generated_at: Local::now().to_rfc3339(),
        filters: HeadlessFilters {
            account: non_empty(filters.account()),
            severity: filters.severity().map(|severity| severity.as_str().to_string()),
            technology: non_empty(filters.technology()),
        },
        panels,
        severity: dashboard.severity().records().first().copied(),
        top_countries: entries(dashboard.countries().records()),
        technologies: entries(dashboard.technologies().records()),
        issues_by_month: entries(dashboard.months().records()),
        map_markers: dashboard.map().markers().len(),
    }
}

fn render_text(report: &HeadlessReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nGuardwatch Report");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out, "Generated: {}", report.generated_at);

    if let Some(counts) = report.severity {
        let _ = writeln!(
            out,
            "Open issues: {} (high {}, medium {}, low {})",
            counts.total(),
            counts.high,
            counts.medium,
            counts.low
        );
    }

    for (title, items) in [
        ("Top Countries", &report.top_countries),
        ("Vulnerabilities by Technology", &report.technologies),
        ("Issues by Month", &report.issues_by_month),
    ] {
        let _ = writeln!(out, "\n{title}:");
        if items.is_empty() {
            let _ = writeln!(out, "- (none)");
        }
        for item in items {
            let _ = writeln!(out, "- {}: {}", item.label, item.value);
        }
    }

    let _ = writeln!(out, "\nMap markers: {}", report.map_markers);

    let failures: Vec<&HeadlessPanel> = report
        .panels
        .iter()
        .filter(|panel| panel.error.is_some())
        .collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailed panels:");
        for panel in failures {
            let _ = writeln!(
                out,
                "- {}: {}",
                panel.widget,
                panel.error.as_deref().unwrap_or_default()
            );
        }
    }

    out
}

fn drain_outcomes(app: &mut App, outcomes: &mut UnboundedReceiver<LoadOutcome>) {
    while let Ok(outcome) = outcomes.try_recv() {
        let widget = outcome.widget;
        if app.apply(outcome) == Applied::Accepted {
            if let WidgetState::Error(message) = app.dashboard.state_of(widget) {
                app.status_message = format!("{} failed: {message}", widget.label());
            }
        }
    }
}

/// Run the main application event loop
pub async fn run(
    terminal: &mut Tui,
    app: &mut App,
    actions: &AppActions,
    outcomes: &mut UnboundedReceiver<LoadOutcome>,
) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    app.initial_load();

    loop {
        for plan in app.take_pending() {
            actions.dispatch(plan);
        }
        drain_outcomes(app, outcomes);
        app.update();

        terminal
            .draw(|f| ui::ui(app, f))
            .map_err(|e| eyre!("Terminal draw error: {e}"))?;

        if matches!(
            event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_input(app, key.code);
                    if !app.running {
                        break;
                    }
                }
                // Resize and the rest are picked up by the next draw
                Ok(_) | Err(_) => {}
            }
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardwatch_core::{CountryCount, Dataset, FetchError, LoadError};

    fn finished_dashboard() -> Dashboard {
        let mut dashboard = Dashboard::with_account("prod");
        for request in dashboard.initial_load() {
            let result = match request.widget {
                WidgetId::SeveritySummary => Ok(Dataset::Severity(vec![SeverityCounts {
                    high: 2,
                    medium: 3,
                    low: 4,
                }])),
                WidgetId::CountryBar => Ok(Dataset::Countries(vec![CountryCount {
                    country_name: "China".into(),
                    count: 5,
                }])),
                WidgetId::TimeBar => Err(LoadError::Fetch(FetchError::Timeout)),
                WidgetId::TechnologyPie => Ok(Dataset::Technologies(Vec::new())),
                WidgetId::Map => Ok(Dataset::Events(Vec::new())),
            };
            dashboard.apply(LoadOutcome {
                widget: request.widget,
                seq: request.seq,
                result,
            });
        }
        dashboard
    }

    #[test]
    fn report_collects_records_and_failures() {
        let report = build_report(&finished_dashboard());

        assert_eq!(report.filters.account.as_deref(), Some("prod"));
        assert_eq!(report.filters.severity, None);
        assert_eq!(report.top_countries.len(), 1);
        assert_eq!(report.severity.map(|counts| counts.total()), Some(9));
        assert_eq!(report.map_markers, 0);

        let failed: Vec<&str> = report
            .panels
            .iter()
            .filter(|panel| panel.status == "error")
            .map(|panel| panel.widget)
            .collect();
        assert_eq!(failed, [WidgetId::TimeBar.label()]);
    }

    #[test]
    fn text_report_lists_sections() {
        let text = render_text(&build_report(&finished_dashboard()));

        assert!(text.contains("Open issues: 9 (high 2, medium 3, low 4)"));
        assert!(text.contains("- China: 5"));
        assert!(text.contains("Vulnerabilities by Technology:\n- (none)"));
        assert!(text.contains("Failed panels:\n- Issues by Month: request timed out"));
    }

    #[test]
    fn json_report_uses_snake_case_keys() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(build_report(&finished_dashboard()))?;
        assert_eq!(json["top_countries"][0]["label"], "China");
        assert_eq!(json["severity"]["high"], 2);
        assert!(json["filters"]["technology"].is_null());
        Ok(())
    }
}
