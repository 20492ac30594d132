use std::collections::BTreeMap;

use crate::metric::GeoEvent;

/// Smallest lat/lon span a fitted viewport may have. Keeps a single marker
/// from zooming to a zero-area box.
const MIN_SPAN_DEGREES: f64 = 4.0;
/// Fraction of the span added around fitted markers.
const FIT_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Lat/lon bounding box; also used as the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub const WORLD: Self = Self {
        south: -90.0,
        west: -180.0,
        north: 90.0,
        east: 180.0,
    };

    /// Tightest box around the valid points, `None` when there are none.
    pub fn around(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        points
            .into_iter()
            .filter(|point| point.is_valid())
            .fold(None, |bounds: Option<Self>, point| {
                Some(match bounds {
                    None => Self {
                        south: point.lat,
                        west: point.lon,
                        north: point.lat,
                        east: point.lon,
                    },
                    Some(b) => Self {
                        south: b.south.min(point.lat),
                        west: b.west.min(point.lon),
                        north: b.north.max(point.lat),
                        east: b.east.max(point.lon),
                    },
                })
            })
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lon)
    }

    /// Grows the box by a margin, enforces the minimum span and clamps it to
    /// the world.
    pub fn fitted(self) -> Self {
        let center = self.center();
        let half_height = (self.height() * (1.0 + FIT_MARGIN)).max(MIN_SPAN_DEGREES) / 2.0;
        let half_width = (self.width() * (1.0 + FIT_MARGIN)).max(MIN_SPAN_DEGREES) / 2.0;

        Self {
            south: (center.lat - half_height).max(Self::WORLD.south),
            west: (center.lon - half_width).max(Self::WORLD.west),
            north: (center.lat + half_height).min(Self::WORLD.north),
            east: (center.lon + half_width).min(Self::WORLD.east),
        }
    }
}

/// One marker on the map. `category` is the country name, which is what the
/// country bar chart selects on.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub position: GeoPoint,
    pub category: String,
    pub payload: GeoEvent,
}

impl MarkerEntry {
    fn from_event(event: GeoEvent) -> Self {
        Self {
            position: GeoPoint::new(event.lat, event.lon),
            category: event.country_name.clone(),
            payload: event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Empty,
    Populated,
}

/// Markers sharing one screen cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCluster {
    pub center: GeoPoint,
    pub members: usize,
    pub events: u64,
    pub label: String,
}

/// Owns the marker collection, the viewport and the marker detail panel.
#[derive(Debug, Clone)]
pub struct MapController {
    markers: Vec<MarkerEntry>,
    viewport: Bounds,
    empty_indicator: bool,
    detail: Option<GeoEvent>,
    cursor: usize,
}

impl Default for MapController {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            viewport: Bounds::WORLD,
            empty_indicator: false,
            detail: None,
            cursor: 0,
        }
    }
}

impl MapController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MarkerState {
        if self.markers.is_empty() {
            MarkerState::Empty
        } else {
            MarkerState::Populated
        }
    }

    pub fn markers(&self) -> &[MarkerEntry] {
        &self.markers
    }

    pub const fn viewport(&self) -> Bounds {
        self.viewport
    }

    /// Raised when the last geolocation load returned no records.
    pub const fn shows_empty_indicator(&self) -> bool {
        self.empty_indicator
    }

    /// Replaces the marker collection with one marker per plottable record and
    /// fits the viewport to them. Records outside the lat/lon range are skipped.
    pub fn load_markers(&mut self, records: Vec<GeoEvent>) -> MarkerState {
        self.remove_all_markers();

        let total = records.len();
        let markers: Vec<MarkerEntry> = records
            .into_iter()
            .map(MarkerEntry::from_event)
            .filter(|marker| marker.position.is_valid())
            .collect();

        if markers.len() < total {
            tracing::warn!(
                skipped = total - markers.len(),
                "geolocation records with invalid coordinates"
            );
        }

        if markers.is_empty() {
            self.empty_indicator = true;
            tracing::debug!("no geolocation records, map left empty");
            return MarkerState::Empty;
        }

        self.markers = markers;
        self.empty_indicator = false;
        self.cursor = 0;
        self.fit_all();
        tracing::debug!(markers = self.markers.len(), "map markers loaded");
        MarkerState::Populated
    }

    /// Clears every marker, closes the detail panel and shows the whole world.
    /// Idempotent.
    pub fn remove_all_markers(&mut self) {
        self.markers.clear();
        self.viewport = Bounds::WORLD;
        self.cursor = 0;
        self.detail = None;
        self.empty_indicator = false;
    }

    /// Fits the viewport to every marker, or the whole world when there are none.
    pub fn fit_all(&mut self) {
        self.viewport = Bounds::around(self.markers.iter().map(|marker| marker.position))
            .map_or(Bounds::WORLD, Bounds::fitted);
    }

    /// Fits the viewport to the markers in `category`. Returns `false` and
    /// leaves the viewport untouched when nothing matches.
    pub fn recenter_on_category(&mut self, category: &str) -> bool {
        let matching = self
            .markers
            .iter()
            .filter(|marker| marker.category == category)
            .map(|marker| marker.position);

        let Some(bounds) = Bounds::around(matching) else {
            tracing::debug!(category, "no markers for category, viewport unchanged");
            return false;
        };

        self.viewport = bounds.fitted();
        if let Some(index) = self
            .markers
            .iter()
            .position(|marker| marker.category == category)
        {
            self.cursor = index;
        }
        true
    }

    pub fn on_marker_activated(&mut self, record: &GeoEvent) {
        self.detail = Some(record.clone());
    }

    pub fn activate_selected(&mut self) -> bool {
        match self.markers.get(self.cursor) {
            Some(marker) => {
                self.detail = Some(marker.payload.clone());
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub const fn detail(&self) -> Option<&GeoEvent> {
        self.detail.as_ref()
    }

    pub fn selected_marker(&self) -> Option<&MarkerEntry> {
        self.markers.get(self.cursor)
    }

    pub fn select_next_marker(&mut self) {
        if !self.markers.is_empty() {
            self.cursor = (self.cursor + 1) % self.markers.len();
        }
    }

    pub fn select_previous_marker(&mut self) {
        if !self.markers.is_empty() {
            self.cursor = self
                .cursor
                .checked_sub(1)
                .unwrap_or(self.markers.len() - 1);
        }
    }

    /// Groups the markers inside the viewport into a `columns` x `rows` grid.
    /// Clusters come back in row-major cell order.
    pub fn clusters(&self, columns: u16, rows: u16) -> Vec<MarkerCluster> {
        if columns == 0 || rows == 0 {
            return Vec::new();
        }

        let view = self.viewport;
        let mut cells: BTreeMap<(u16, u16), Vec<&MarkerEntry>> = BTreeMap::new();

        for marker in &self.markers {
            if !marker.position.is_valid() || !view.contains(marker.position) {
                continue;
            }
            let column = grid_cell(marker.position.lon - view.west, view.width(), columns);
            let row = grid_cell(view.north - marker.position.lat, view.height(), rows);
            cells.entry((row, column)).or_default().push(marker);
        }

        cells
            .into_values()
            .map(|members| {
                #[allow(clippy::cast_precision_loss)]
                let count = members.len() as f64;
                let lat = members.iter().map(|m| m.position.lat).sum::<f64>() / count;
                let lon = members.iter().map(|m| m.position.lon).sum::<f64>() / count;
                MarkerCluster {
                    center: GeoPoint::new(lat, lon),
                    members: members.len(),
                    events: members.iter().map(|m| m.payload.count).sum(),
                    label: members
                        .first()
                        .map(|m| m.category.clone())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn grid_cell(offset: f64, span: f64, cells: u16) -> u16 {
    if span <= 0.0 {
        return 0;
    }
    let index = (offset / span * f64::from(cells)).floor();
    (index.max(0.0) as u16).min(cells - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(country: &str, lat: f64, lon: f64) -> GeoEvent {
        GeoEvent {
            lat,
            lon,
            country_name: country.to_string(),
            city_name: None,
            count: 1,
            remote_ip_v4: Some("203.0.113.7".to_string()),
            remote_org: None,
            remote_org_asn: None,
            remote_org_asn_org: None,
            remote_org_isp: None,
            local_port: Some(22.0),
            local_port_name: Some("SSH".to_string()),
            severity: None,
            first_seen: None,
            last_seen: None,
            description: None,
        }
    }

    #[test]
    fn loading_empty_records_shows_indicator() {
        let mut map = MapController::new();
        assert_eq!(map.load_markers(Vec::new()), MarkerState::Empty);
        assert!(map.markers().is_empty());
        assert!(map.shows_empty_indicator());
        assert_eq!(map.viewport(), Bounds::WORLD);
    }

    #[test]
    fn reload_replaces_previous_markers() {
        let mut map = MapController::new();
        map.load_markers(vec![event("China", 39.9, 116.4), event("Russia", 55.7, 37.6)]);
        map.load_markers(vec![event("Brazil", -23.5, -46.6)]);

        assert_eq!(map.state(), MarkerState::Populated);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].category, "Brazil");
        assert!(!map.shows_empty_indicator());
    }

    #[test]
    fn remove_all_markers_is_idempotent() {
        let mut map = MapController::new();
        map.load_markers(vec![event("China", 39.9, 116.4)]);
        map.activate_selected();

        map.remove_all_markers();
        let once = (map.markers().len(), map.state(), map.viewport(), map.detail().cloned());
        map.remove_all_markers();
        let twice = (map.markers().len(), map.state(), map.viewport(), map.detail().cloned());

        assert_eq!(once, twice);
        assert_eq!(map.viewport(), Bounds::WORLD);
        assert_eq!(map.state(), MarkerState::Empty);
        assert!(map.detail().is_none());
    }

    #[test]
    fn out_of_range_records_reset_previous_view() {
        let mut map = MapController::new();
        map.load_markers(vec![event("China", 39.9, 116.4)]);
        assert_ne!(map.viewport(), Bounds::WORLD);

        assert_eq!(map.load_markers(vec![event("Nowhere", 200.0, 500.0)]), MarkerState::Empty);
        assert!(map.markers().is_empty());
        assert!(map.shows_empty_indicator());
        assert_eq!(map.viewport(), Bounds::WORLD);
    }

    #[test]
    fn invalid_records_are_skipped_among_valid_ones() {
        let mut map = MapController::new();
        map.load_markers(vec![event("Nowhere", f64::NAN, 10.0), event("Chile", -33.4, -70.6)]);

        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].category, "Chile");
        assert!(map.viewport().contains(GeoPoint::new(-33.4, -70.6)));
    }

    #[test]
    fn recenter_without_match_keeps_viewport() {
        let mut map = MapController::new();
        map.load_markers(vec![event("China", 39.9, 116.4), event("Russia", 55.7, 37.6)]);
        let before = map.viewport();

        assert!(!map.recenter_on_category("France"));
        assert_eq!(map.viewport(), before);
    }

    #[test]
    fn recenter_fits_matching_markers_only() {
        let mut map = MapController::new();
        map.load_markers(vec![
            event("China", 39.9, 116.4),
            event("Russia", 55.7, 37.6),
            event("China", 31.2, 121.5),
        ]);

        assert!(map.recenter_on_category("China"));
        let view = map.viewport();
        assert!(view.contains(GeoPoint::new(39.9, 116.4)));
        assert!(view.contains(GeoPoint::new(31.2, 121.5)));
        assert!(!view.contains(GeoPoint::new(55.7, 37.6)));
        assert_eq!(map.selected_marker().map(|m| m.category.as_str()), Some("China"));
    }

    #[test]
    fn single_marker_gets_minimum_span() {
        let mut map = MapController::new();
        map.load_markers(vec![event("Iceland", 64.1, -21.9)]);
        let view = map.viewport();
        assert!(view.width() >= MIN_SPAN_DEGREES - 1e-9);
        assert!(view.height() >= MIN_SPAN_DEGREES - 1e-9);
        assert!(view.contains(GeoPoint::new(64.1, -21.9)));
    }

    #[test]
    fn fitted_bounds_stay_inside_world() {
        let fitted = Bounds {
            south: -89.0,
            west: -179.0,
            north: 89.0,
            east: 179.0,
        }
        .fitted();
        assert_eq!(fitted, Bounds::WORLD);
    }

    #[test]
    fn detail_close_is_idempotent() {
        let mut map = MapController::new();
        let record = event("Germany", 52.5, 13.4);

        map.close_detail();
        assert!(map.detail().is_none());

        map.on_marker_activated(&record);
        assert_eq!(map.detail(), Some(&record));
        map.close_detail();
        map.close_detail();
        assert!(map.detail().is_none());
    }

    #[test]
    fn nearby_markers_share_a_cluster() {
        let mut map = MapController::new();
        map.load_markers(vec![
            event("China", 39.9, 116.4),
            event("China", 39.8, 116.3),
            event("Brazil", -23.5, -46.6),
        ]);
        map.viewport = Bounds::WORLD;

        let clusters = map.clusters(4, 2);

        assert_eq!(clusters.len(), 2);
        let china = clusters.iter().find(|c| c.label == "China");
        assert_eq!(china.map(|c| (c.members, c.events)), Some((2, 2)));
    }

    #[test]
    fn markers_outside_viewport_are_not_clustered() {
        let mut map = MapController::new();
        map.load_markers(vec![event("China", 39.9, 116.4), event("Brazil", -23.5, -46.6)]);
        map.recenter_on_category("Brazil");

        let clusters = map.clusters(10, 10);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].label, "Brazil");
    }
}
