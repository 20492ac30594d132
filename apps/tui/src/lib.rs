// Shared pieces of the terminal dashboard, exported for the binary and tests
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
