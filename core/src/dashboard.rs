use crate::filter::{FilterController, FilterState, ReloadPlan, Severity};
use crate::loader::{Dataset, LoadError, LoadOutcome};
use crate::map::{MapController, MarkerState};
use crate::metric::{CountryCount, MonthCount, SeverityCounts, TechnologyShare};
use crate::widget::{WidgetId, WidgetPanel, WidgetSlot, WidgetState};

/// Result of feeding a completed load back into the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    /// A newer request for the same widget has been issued since.
    Stale,
}

/// All dashboard state behind one owner.
///
/// Front ends call the filter operations, execute the returned plan with their
/// own `DataFetcher`, and hand each outcome to [`Dashboard::apply`] as it
/// arrives. Outcomes may arrive in any order; only the latest request per
/// widget is shown.
#[derive(Debug, Default)]
pub struct Dashboard {
    filters: FilterController,
    severity: WidgetPanel<SeverityCounts>,
    countries: WidgetPanel<CountryCount>,
    technologies: WidgetPanel<TechnologyShare>,
    months: WidgetPanel<MonthCount>,
    map_slot: WidgetSlot,
    map: MapController,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: &str) -> Self {
        Self {
            filters: FilterController::with_account(account),
            ..Self::default()
        }
    }

    pub const fn filters(&self) -> &FilterState {
        self.filters.state()
    }

    pub const fn severity(&self) -> &WidgetPanel<SeverityCounts> {
        &self.severity
    }

    pub const fn countries(&self) -> &WidgetPanel<CountryCount> {
        &self.countries
    }

    pub const fn technologies(&self) -> &WidgetPanel<TechnologyShare> {
        &self.technologies
    }

    pub const fn months(&self) -> &WidgetPanel<MonthCount> {
        &self.months
    }

    pub const fn map(&self) -> &MapController {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapController {
        &mut self.map
    }

    pub fn countries_mut(&mut self) -> &mut WidgetPanel<CountryCount> {
        &mut self.countries
    }

    pub fn technologies_mut(&mut self) -> &mut WidgetPanel<TechnologyShare> {
        &mut self.technologies
    }

    pub fn months_mut(&mut self) -> &mut WidgetPanel<MonthCount> {
        &mut self.months
    }

    pub const fn state_of(&self, widget: WidgetId) -> &WidgetState {
        match widget {
            WidgetId::SeveritySummary => self.severity.state(),
            WidgetId::CountryBar => self.countries.state(),
            WidgetId::Map => self.map_slot.state(),
            WidgetId::TechnologyPie => self.technologies.state(),
            WidgetId::TimeBar => self.months.state(),
        }
    }

    pub fn is_loading(&self) -> bool {
        WidgetId::ALL
            .iter()
            .any(|&widget| self.state_of(widget).is_loading())
    }

    pub fn initial_load(&mut self) -> ReloadPlan {
        let plan = self.filters.initial_load();
        self.begin(plan)
    }

    pub fn refresh(&mut self) -> ReloadPlan {
        let plan = self.filters.refresh();
        self.begin(plan)
    }

    pub fn select_account(&mut self, id: &str) -> ReloadPlan {
        let plan = self.filters.select_account(id);
        self.begin(plan)
    }

    pub fn select_severity(&mut self, severity: Severity) -> ReloadPlan {
        let plan = self.filters.select_severity(severity);
        self.begin(plan)
    }

    pub fn select_technology(&mut self, technology: &str) -> ReloadPlan {
        let plan = self.filters.select_technology(technology);
        self.begin(plan)
    }

    pub fn clear_filters(&mut self) -> ReloadPlan {
        let plan = self.filters.clear_filters();
        self.begin(plan)
    }

    /// Category click on the country bar chart.
    pub fn select_country(&mut self, country: &str) -> bool {
        self.map.recenter_on_category(country)
    }

    /// Puts every widget in `plan` into the loading state. A reloading map
    /// drops its markers so nothing can select or fit them.
    fn begin(&mut self, plan: ReloadPlan) -> ReloadPlan {
        for request in plan.requests() {
            match request.widget {
                WidgetId::SeveritySummary => self.severity.begin(request.seq),
                WidgetId::CountryBar => self.countries.begin(request.seq),
                WidgetId::Map => {
                    self.map.remove_all_markers();
                    self.map_slot.begin(request.seq);
                }
                WidgetId::TechnologyPie => self.technologies.begin(request.seq),
                WidgetId::TimeBar => self.months.begin(request.seq),
            }
        }
        plan
    }

    fn accepts(&self, widget: WidgetId, seq: u64) -> bool {
        match widget {
            WidgetId::SeveritySummary => self.severity.accepts(seq),
            WidgetId::CountryBar => self.countries.accepts(seq),
            WidgetId::Map => self.map_slot.accepts(seq),
            WidgetId::TechnologyPie => self.technologies.accepts(seq),
            WidgetId::TimeBar => self.months.accepts(seq),
        }
    }

    pub fn apply(&mut self, outcome: LoadOutcome) -> Applied {
        let LoadOutcome {
            widget,
            seq,
            result,
        } = outcome;

        if !self.accepts(widget, seq) {
            tracing::debug!(?widget, seq, "discarding superseded response");
            return Applied::Stale;
        }

        match (widget, result) {
            (WidgetId::SeveritySummary, Ok(Dataset::Severity(items))) => {
                self.severity.finish(Ok(items));
            }
            (WidgetId::CountryBar, Ok(Dataset::Countries(items))) => {
                self.countries.finish(Ok(items));
            }
            (WidgetId::TechnologyPie, Ok(Dataset::Technologies(items))) => {
                self.technologies.finish(Ok(items));
            }
            (WidgetId::TimeBar, Ok(Dataset::Months(items))) => {
                self.months.finish(Ok(items));
            }
            (WidgetId::Map, Ok(Dataset::Events(items))) => {
                let state = match self.map.load_markers(items) {
                    MarkerState::Empty => WidgetState::Empty,
                    MarkerState::Populated => WidgetState::Populated,
                };
                self.map_slot.set(state);
            }
            (widget, Ok(dataset)) => {
                tracing::warn!(?widget, items = dataset.len(), "dataset does not match widget");
                self.fail_with(widget, LoadError::Mismatch(widget));
            }
            (widget, Err(error)) => self.fail_with(widget, error),
        }

        Applied::Accepted
    }

    fn fail_with(&mut self, widget: WidgetId, error: LoadError) {
        match widget {
            WidgetId::SeveritySummary => self.severity.finish(Err(error)),
            WidgetId::CountryBar => self.countries.finish(Err(error)),
            WidgetId::TechnologyPie => self.technologies.finish(Err(error)),
            WidgetId::TimeBar => self.months.finish(Err(error)),
            WidgetId::Map => {
                self.map.remove_all_markers();
                self.map_slot.set(WidgetState::Error(error.to_string()));
            }
        }
    }
}
