//! Catalog harvest CLI — Chromium-backed page sessions, commands, and the summary report.

pub mod chromium;
pub mod commands;
pub mod config;
pub mod report;

pub use chromium::{find_chromium, ChromiumSession, LaunchOptions};
pub use config::{load_harvest_config, load_taxonomy, resolve_output_path};
pub use report::HarvestReport;
