// Shared dashboard core for the terminal and browser front ends.
// Everything in here is platform free: I/O goes through `DataFetcher`.

pub mod dashboard;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod map;
pub mod metric;
pub mod widget;

pub use dashboard::{Applied, Dashboard};
pub use fetch::{DataFetcher, FetchError};
pub use filter::{FilterController, FilterScope, FilterState, ReloadPlan, Severity};
pub use loader::{Dataset, LoadError, LoadOutcome, LoadRequest};
pub use map::{Bounds, GeoPoint, MapController, MarkerCluster, MarkerEntry, MarkerState};
pub use metric::{
    CountryCount, GeoEvent, LabeledValue, Metric, MonthCount, SeverityCounts, TechnologyShare,
};
pub use widget::{PanelView, WidgetId, WidgetPanel, WidgetSlot, WidgetState};
