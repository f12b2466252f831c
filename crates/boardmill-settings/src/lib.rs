//! Configuration management for Boardmill.
//!
//! Provides the [`Settings`] aggregate (machining tolerances, tool stock,
//! feeds and speeds tables, resident rack definition, G-code options),
//! TOML persistence under the platform configuration directory, and
//! validation.

pub mod config;
pub mod error;
pub mod persistence;
pub mod tables;

pub use config::{
    GcodeSettings, MachiningSettings, RackSettings, RackToolEntry, Settings, SlotPeckDrilling,
    StockSettings,
};
pub use error::{SettingsError, SettingsResult};
pub use persistence::default_config_path;
pub use tables::{FeedsRow, FeedsTable, FeedsTables, ToolFeeds};
