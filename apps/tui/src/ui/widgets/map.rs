use guardwatch_core::{MapController, MarkerCluster, WidgetState};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Map, MapResolution, Points};
use ratatui::Frame;
use throbber_widgets_tui::ThrobberState;

use crate::ui::widgets::charts::{panel_block, render_loading, render_notice};

/// Terminal cells per cluster cell. Markers closer than this merge.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;

pub const fn cluster_color(events: u64) -> Color {
    match events {
        0..=9 => Color::Green,
        10..=99 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn cluster_text(cluster: &MarkerCluster) -> String {
    if cluster.members > 1 {
        cluster.members.to_string()
    } else {
        "●".to_string()
    }
}

pub fn render_map_panel(
    f: &mut Frame<'_>,
    area: Rect,
    state: &WidgetState,
    map: &MapController,
    focused: bool,
    throbber: &ThrobberState,
) {
    let block = panel_block("World Map", focused);
    let inner = block.inner(area);

    match state {
        WidgetState::Loading => {
            f.render_widget(block, area);
            render_loading(f, inner, throbber);
            return;
        }
        WidgetState::Error(message) => {
            f.render_widget(block, area);
            render_notice(f, inner, &format!("Failed to load: {message}"), Color::Red);
            return;
        }
        WidgetState::Empty | WidgetState::Populated => {}
    }

    let viewport = map.viewport();
    let clusters = map.clusters(
        (inner.width / CELL_WIDTH).max(1),
        (inner.height / CELL_HEIGHT).max(1),
    );
    let selected = focused
        .then(|| map.selected_marker())
        .flatten()
        .map(|marker| (marker.position.lon, marker.position.lat));

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
                ctx.print(
                    cluster.center.lon,
                    cluster.center.lat,
                    Span::styled(
                        cluster_text(cluster),
                        Style::default().fg(cluster_color(cluster.events)),
                    ),
                );
            }

            if let Some(coords) = selected {
                ctx.draw(&Points {
                    coords: &[coords],
                    color: Color::Cyan,
                });
            }
        });
    f.render_widget(canvas, area);

    if map.shows_empty_indicator() {
        render_notice(f, inner, "No geolocation data", Color::Gray);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardwatch_core::GeoPoint;

    fn cluster(members: usize, events: u64) -> MarkerCluster {
        MarkerCluster {
            center: GeoPoint::new(0.0, 0.0),
            members,
            events,
            label: "Brazil".to_string(),
        }
    }

    #[test]
    fn cluster_text_shows_member_count() {
        assert_eq!(cluster_text(&cluster(1, 3)), "●");
        assert_eq!(cluster_text(&cluster(12, 40)), "12");
    }

    #[test]
    fn cluster_color_follows_event_volume() {
        assert_eq!(cluster_color(3), Color::Green);
        assert_eq!(cluster_color(42), Color::Yellow);
        assert_eq!(cluster_color(500), Color::Red);
    }
}
