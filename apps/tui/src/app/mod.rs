// App module for guardwatch
// Holds dashboard state, key handling and load dispatch

pub mod actions;
pub mod input;
pub mod state;

pub use actions::AppActions;
pub use input::handle_input;
pub use state::{App, InputMode, Panel};
