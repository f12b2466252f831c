//! Configuration for the machining pipeline.
//!
//! Settings are organized into logical sections:
//! - Machining tolerances and geometry limits (tool matching, peck drilling,
//!   backing board clearances)
//! - Tool stock catalogs (available drill and router diameters)
//! - Feeds and speeds tables (see [`crate::tables`])
//! - Resident rack definition (magazine size and tool assignments)
//! - G-code output options
//!
//! All dimensioned values are [`Length`] quantities and serialize as
//! millimetre floats.

use boardmill_core::units::{mm, Length};
use serde::{Deserialize, Serialize};

use crate::tables::FeedsTables;

/// Slot (oblong hole) peck drilling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPeckDrilling {
    /// A slot longer than `diameter * this ratio` is routed instead of
    /// peck-drilled.
    pub max_length_to_bit_diameter: f64,
    /// Number of pecks per bit diameter along the slot.
    pub pecks_per_hole: f64,
}

impl Default for SlotPeckDrilling {
    fn default() -> Self {
        Self {
            max_length_to_bit_diameter: 4.0,
            pecks_per_hole: 3.0,
        }
    }
}

/// Machining tolerances and geometry limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachiningSettings {
    /// How much larger than requested a matched tool may be, in percent.
    pub oversizing_allowance_percent: f64,
    /// How much smaller than requested a matched tool may be, in percent.
    pub downsizing_allowance_percent: f64,
    /// Drill bit point angle in degrees.
    pub drillbit_point_angle: f64,
    /// Thickness of the sacrificial backing (martyr) board.
    pub backboard_thickness: Length,
    /// Backing board material that must remain below the deepest cut.
    pub safe_distance: Length,
    /// Minimum depth the cutting lips must exit below the board.
    pub exit_depth_min: Length,
    /// Default router bit used for the contour and to rescue oversized holes.
    pub router_diameter_for_contour: Length,
    /// Slot peck drilling parameters.
    pub slot_peck_drilling: SlotPeckDrilling,
    /// Z height for rapid travel between features.
    pub z_safe_height: Length,
    /// Z retract height between drill strokes inside a canned cycle.
    pub z_drill_retract_height: Length,
}

impl Default for MachiningSettings {
    fn default() -> Self {
        Self {
            oversizing_allowance_percent: 10.0,
            downsizing_allowance_percent: 10.0,
            drillbit_point_angle: 135.0,
            backboard_thickness: mm(2.5),
            safe_distance: mm(0.5),
            exit_depth_min: mm(0.5),
            router_diameter_for_contour: mm(2.0),
            slot_peck_drilling: SlotPeckDrilling::default(),
            z_safe_height: mm(10.0),
            z_drill_retract_height: mm(2.0),
        }
    }
}

/// Available cutter diameters, per tool kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    /// Drill bit diameters on hand.
    pub drillbits: Vec<Length>,
    /// Router bit diameters on hand.
    pub routerbits: Vec<Length>,
}

impl Default for StockSettings {
    fn default() -> Self {
        let drills = [
            0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95, 1.0,
            1.05, 1.1, 1.15, 1.2, 1.3, 1.4, 1.5, 1.6, 1.8, 2.0, 2.2, 2.5, 3.0, 3.175,
        ];
        let routers = [0.8, 1.0, 1.2, 1.5, 1.6, 2.0, 2.4, 3.175];

        Self {
            drillbits: drills.iter().copied().map(mm).collect(),
            routerbits: routers.iter().copied().map(mm).collect(),
        }
    }
}

/// One tool assignment in the resident rack definition.
///
/// `slot` pins the tool to an explicit position; without it, tools fill
/// slots sequentially. `use = false` marks a slot as unusable (damaged
/// collet, reserved position).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RackToolEntry {
    /// Explicit slot number (1-indexed).
    #[serde(default)]
    pub slot: Option<usize>,
    /// Drill bit diameter held in this slot.
    #[serde(default)]
    pub drill: Option<Length>,
    /// Router bit diameter held in this slot.
    #[serde(default)]
    pub router: Option<Length>,
    /// Whether the slot may be used at all.
    #[serde(rename = "use", default = "default_true")]
    pub in_use: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RackToolEntry {
    fn default() -> Self {
        Self {
            slot: None,
            drill: None,
            router: None,
            in_use: true,
        }
    }
}

/// Resident rack definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RackSettings {
    /// Magazine size; 0 means a manual, unbounded rack.
    pub size: usize,
    /// Tool assignments in declaration order.
    pub tools: Vec<RackToolEntry>,
}

/// G-code output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeSettings {
    /// Line number increment; 0 disables `N` numbering.
    pub line_numbers_increment: u32,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        Self {
            line_numbers_increment: 10,
        }
    }
}

/// Complete Boardmill configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Machining tolerances and geometry limits.
    pub machining: MachiningSettings,
    /// Tool stock catalogs.
    pub stock: StockSettings,
    /// Feeds and speeds tables.
    pub feeds: FeedsTables,
    /// Resident rack definition.
    pub rack: RackSettings,
    /// G-code output options.
    pub gcode: GcodeSettings,
}

impl Settings {
    /// Validate the configuration; returns the first problem found.
    pub fn validate(&self) -> Result<(), crate::error::SettingsError> {
        use crate::error::SettingsError::Invalid;

        let m = &self.machining;
        if m.oversizing_allowance_percent < 0.0 || m.downsizing_allowance_percent < 0.0 {
            return Err(Invalid("tolerance allowances must not be negative".into()));
        }
        if m.drillbit_point_angle <= 0.0 || m.drillbit_point_angle >= 180.0 {
            return Err(Invalid(format!(
                "drillbit point angle must be within (0, 180), got {}",
                m.drillbit_point_angle
            )));
        }
        if m.backboard_thickness <= m.safe_distance + m.exit_depth_min {
            return Err(Invalid(
                "backing board too thin for the configured safe distance and exit depth".into(),
            ));
        }
        if m.slot_peck_drilling.pecks_per_hole <= 0.0 {
            return Err(Invalid("pecks_per_hole must be positive".into()));
        }
        if self.stock.drillbits.is_empty() || self.stock.routerbits.is_empty() {
            return Err(Invalid("stock catalogs must not be empty".into()));
        }
        if self.feeds.drillbits.is_empty() || self.feeds.routerbits.is_empty() {
            return Err(Invalid("feeds tables must not be empty".into()));
        }
        if let Some(bad) = self
            .stock
            .drillbits
            .iter()
            .chain(self.stock.routerbits.iter())
            .find(|d| !d.is_positive())
        {
            return Err(Invalid(format!("stock diameter {bad} is not positive")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.machining.drillbit_point_angle = 200.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.stock.drillbits.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.machining.backboard_thickness = mm(0.5);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.feeds.drillbits = crate::tables::FeedsTable::new(Vec::new());
        assert!(settings.validate().is_err());
    }
}
