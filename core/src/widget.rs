use crate::filter::FilterScope;
use crate::loader::LoadError;
use crate::metric::Metric;

/// One visual panel of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    SeveritySummary,
    CountryBar,
    Map,
    TechnologyPie,
    TimeBar,
}

impl WidgetId {
    pub const ALL: [Self; 5] = [
        Self::SeveritySummary,
        Self::CountryBar,
        Self::Map,
        Self::TechnologyPie,
        Self::TimeBar,
    ];

    pub const fn metric(self) -> Metric {
        match self {
            Self::SeveritySummary => Metric::VulnBySeverity,
            Self::CountryBar => Metric::TopCountries,
            Self::Map => Metric::WorldMap,
            Self::TechnologyPie => Metric::VulnByTech,
            Self::TimeBar => Metric::IssuesByMonth,
        }
    }

    pub const fn scope(self) -> FilterScope {
        match self {
            Self::SeveritySummary | Self::CountryBar | Self::Map => FilterScope::Account,
            Self::TechnologyPie | Self::TimeBar => FilterScope::Full,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SeveritySummary => "Open Issues by Severity",
            Self::CountryBar => "Top Countries (GuardDuty)",
            Self::Map => "World Map",
            Self::TechnologyPie => "Vulnerabilities by Technology",
            Self::TimeBar => "Issues by Month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetState {
    Loading,
    Empty,
    Populated,
    Error(String),
}

impl WidgetState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Request bookkeeping for one widget: its visual state and the sequence
/// number of the most recent load issued for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSlot {
    state: WidgetState,
    latest_seq: Option<u64>,
}

impl Default for WidgetSlot {
    fn default() -> Self {
        Self {
            state: WidgetState::Loading,
            latest_seq: None,
        }
    }
}

impl WidgetSlot {
    pub const fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn begin(&mut self, seq: u64) {
        self.state = WidgetState::Loading;
        self.latest_seq = Some(seq);
    }

    /// Only the most recently issued request may update the widget.
    pub fn accepts(&self, seq: u64) -> bool {
        self.latest_seq == Some(seq)
    }

    pub fn set(&mut self, state: WidgetState) {
        self.state = state;
    }
}

/// What a renderer should draw for a panel right now.
#[derive(Debug, PartialEq)]
pub enum PanelView<'a, T> {
    Loading,
    Empty,
    Error(&'a str),
    Populated(&'a [T]),
}

/// A chart widget: request slot, the records of the last accepted load, and
/// a selection cursor used to emit category clicks.
#[derive(Debug, Clone)]
pub struct WidgetPanel<T> {
    slot: WidgetSlot,
    records: Vec<T>,
    cursor: usize,
}

impl<T> Default for WidgetPanel<T> {
    fn default() -> Self {
        Self {
            slot: WidgetSlot::default(),
            records: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> WidgetPanel<T> {
    pub const fn state(&self) -> &WidgetState {
        self.slot.state()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Hides the current content until the load with `seq` completes.
    pub fn begin(&mut self, seq: u64) {
        self.slot.begin(seq);
        self.records.clear();
        self.cursor = 0;
    }

    pub fn accepts(&self, seq: u64) -> bool {
        self.slot.accepts(seq)
    }

    pub fn finish(&mut self, result: Result<Vec<T>, LoadError>) {
        self.cursor = 0;
        match result {
            Ok(records) if records.is_empty() => {
                self.records.clear();
                self.slot.set(WidgetState::Empty);
            }
            Ok(records) => {
                self.records = records;
                self.slot.set(WidgetState::Populated);
            }
            Err(error) => {
                self.records.clear();
                self.slot.set(WidgetState::Error(error.to_string()));
            }
        }
    }

    pub fn view(&self) -> PanelView<'_, T> {
        match self.slot.state() {
            WidgetState::Loading => PanelView::Loading,
            WidgetState::Empty => PanelView::Empty,
            WidgetState::Error(message) => PanelView::Error(message),
            WidgetState::Populated => PanelView::Populated(&self.records),
        }
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&T> {
        self.records.get(self.cursor)
    }

    pub fn select_next(&mut self) {
        if !self.records.is_empty() {
            self.cursor = (self.cursor + 1) % self.records.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.records.is_empty() {
            self.cursor = if self.cursor == 0 {
                self.records.len() - 1
            } else {
                self.cursor - 1
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    #[test]
    fn begin_hides_previous_records() {
        let mut panel = WidgetPanel::default();
        panel.begin(1);
        panel.finish(Ok(vec![1, 2, 3]));
        assert_eq!(panel.view(), PanelView::Populated(&[1, 2, 3][..]));

        panel.begin(2);
        assert_eq!(panel.view(), PanelView::Loading);
        assert!(panel.records().is_empty());
    }

    #[test]
    fn error_drops_records_and_keeps_message() {
        let mut panel = WidgetPanel::<u32>::default();
        panel.begin(1);
        panel.finish(Err(LoadError::Fetch(FetchError::Timeout)));

        assert!(matches!(panel.view(), PanelView::Error(message) if message.contains("timed out")));
        assert!(panel.records().is_empty());
    }

    #[test]
    fn only_latest_sequence_is_accepted() {
        let mut slot = WidgetSlot::default();
        assert!(!slot.accepts(1));
        slot.begin(4);
        slot.begin(7);
        assert!(!slot.accepts(4));
        assert!(slot.accepts(7));
    }

    #[test]
    fn cursor_wraps_in_both_directions() {
        let mut panel = WidgetPanel::default();
        panel.begin(1);
        panel.finish(Ok(vec!["a", "b", "c"]));

        panel.select_previous();
        assert_eq!(panel.selected(), Some(&"c"));
        panel.select_next();
        assert_eq!(panel.selected(), Some(&"a"));
    }
}
