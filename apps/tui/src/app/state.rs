use chrono::{DateTime, Local};
use guardwatch_core::{Applied, Dashboard, LoadOutcome, ReloadPlan, Severity};
use throbber_widgets_tui::ThrobberState;

/// Dashboard panels in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Severity,
    Countries,
    Map,
    Technologies,
    Months,
}

impl Panel {
    pub const ALL: [Self; 5] = [
        Self::Severity,
        Self::Countries,
        Self::Map,
        Self::Technologies,
        Self::Months,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Severity => 0,
            Self::Countries => 1,
            Self::Map => 2,
            Self::Technologies => 3,
            Self::Months => 4,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Severity),
            1 => Some(Self::Countries),
            2 => Some(Self::Map),
            3 => Some(Self::Technologies),
            4 => Some(Self::Months),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Severity => "Severity",
            Self::Countries => "Countries",
            Self::Map => "Map",
            Self::Technologies => "Technologies",
            Self::Months => "Months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingAccount,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub dashboard: Dashboard,
    pub focus: Panel,
    pub input_mode: InputMode,
    pub current_input: String,
    pub show_help: bool,
    pub status_message: String,
    pub severity_index: usize,
    pub throbber: ThrobberState,
    pub last_refresh: Option<DateTime<Local>>,
    pending: Vec<ReloadPlan>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            running: true,
            dashboard,
            focus: Panel::Severity,
            input_mode: InputMode::Normal,
            current_input: String::new(),
            show_help: false,
            status_message: String::new(),
            severity_index: 0,
            throbber: ThrobberState::default(),
            last_refresh: None,
            pending: Vec::new(),
        }
    }

    pub fn with_account(account: &str) -> Self {
        Self::new(Dashboard::with_account(account))
    }

    /// Advances the loading spinner; called once per frame.
    pub fn update(&mut self) {
        if self.dashboard.is_loading() {
            self.throbber.calc_next();
        }
    }

    /// Plans produced since the last call, oldest first.
    pub fn take_pending(&mut self) -> Vec<ReloadPlan> {
        std::mem::take(&mut self.pending)
    }

    fn queue(&mut self, plan: ReloadPlan) {
        if !plan.is_empty() {
            self.last_refresh = Some(Local::now());
            self.pending.push(plan);
        }
    }

    pub fn initial_load(&mut self) {
        let plan = self.dashboard.initial_load();
        self.status_message = "Loading dashboard...".to_string();
        self.queue(plan);
    }

    pub fn refresh(&mut self) {
        let plan = self.dashboard.refresh();
        self.status_message = "Refreshing all panels".to_string();
        self.queue(plan);
    }

    pub fn select_account(&mut self, account: &str) {
        let plan = self.dashboard.select_account(account);
        self.status_message = if account.trim().is_empty() {
            "Showing all accounts".to_string()
        } else {
            format!("Account: {}", account.trim())
        };
        self.queue(plan);
    }

    pub fn select_severity(&mut self, severity: Severity) {
        let plan = self.dashboard.select_severity(severity);
        self.status_message = format!("Severity: {}", severity.label());
        self.queue(plan);
    }

    pub fn select_technology(&mut self, technology: &str) {
        let plan = self.dashboard.select_technology(technology);
        self.status_message = format!("Technology: {technology}");
        self.queue(plan);
    }

    pub fn clear_filters(&mut self) {
        let plan = self.dashboard.clear_filters();
        self.severity_index = 0;
        self.status_message = "Filters cleared".to_string();
        self.queue(plan);
    }

    pub fn select_country(&mut self, country: &str) {
        self.status_message = if self.dashboard.select_country(country) {
            format!("Map centred on {country}")
        } else {
            format!("No markers for {country}")
        };
    }

    pub fn fit_map(&mut self) {
        self.dashboard.map_mut().fit_all();
        self.status_message = "Map fitted to all markers".to_string();
    }

    pub fn apply(&mut self, outcome: LoadOutcome) -> Applied {
        self.dashboard.apply(outcome)
    }

    pub fn start_account_input(&mut self) {
        self.current_input = self.dashboard.filters().account().to_string();
        self.input_mode = InputMode::EditingAccount;
    }

    pub fn submit_account_input(&mut self) {
        let account = std::mem::take(&mut self.current_input);
        self.input_mode = InputMode::Normal;
        self.select_account(&account);
    }

    pub fn cancel_account_input(&mut self) {
        self.current_input.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn selected_severity(&self) -> Option<Severity> {
        Severity::from_index(self.severity_index)
    }

    /// Short description of the active filters for the title bar.
    pub fn filter_summary(&self) -> String {
        let filters = self.dashboard.filters();
        if filters.is_empty() {
            return "no filters".to_string();
        }

        let mut parts = Vec::new();
        if !filters.account().is_empty() {
            parts.push(format!("account={}", filters.account()));
        }
        if let Some(severity) = filters.severity() {
            parts.push(format!("severity={}", severity.as_str()));
        }
        if !filters.technology().is_empty() {
            parts.push(format!("tech={}", filters.technology()));
        }
        parts.join("  ")
    }
}
