//! # Boardmill
//!
//! A toolpath compiler for PCB drilling and routing. Boardmill takes the
//! hole and outline inventory of a board, resolves each feature against the
//! tool stock, plans the rack of an automatic tool changer, optimizes the
//! travel between features and emits the G-code program along with the
//! rack setup instructions for the operator.
//!
//! The facade re-exports the public surface of the member crates:
//! - `boardmill-core`: units, coordinates and the board inventory
//! - `boardmill-settings`: configuration, stock catalogs, feeds tables
//! - `boardmill-camtools`: tool resolution, rack planning, travel
//!   optimization and G-code emission
//!
//! # Example
//!
//! ```no_run
//! use boardmill::{compile_job, mm, Coordinate, Inventory, Operations, PadRecord, Settings};
//!
//! let settings = Settings::default();
//! let mut inventory = Inventory::new();
//! inventory.add_hole(&PadRecord {
//!     coord: Coordinate::new(mm(10.0), mm(20.0)),
//!     size_x: mm(0.8),
//!     size_y: None,
//!     angle: 0.0,
//!     plated: true,
//! });
//! let job = compile_job(&settings, &inventory, Operations::ALL, "board")?;
//! println!("{}", job.gcode);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use boardmill_core::{
    inches, mm, um, Coordinate, CoreError, Feature, Inventory, Length, Operations, PadRecord,
};

pub use boardmill_settings::{
    default_config_path, FeedsTable, FeedsTables, GcodeSettings, MachiningSettings, RackSettings,
    RackToolEntry, Settings, SettingsError, SlotPeckDrilling, StockSettings, ToolFeeds,
};

pub use boardmill_camtools::{
    CamError, CodeEmitter, CutDirection, CuttingTool, Machining, MachiningOperation, MassoG3,
    OperationKind, Profile, Rack, RackManager, SetupInstruction, ToolKind, ToolResolver,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Everything a compiled job produces.
#[derive(Debug)]
pub struct CompiledJob {
    /// The complete G-code program.
    pub gcode: String,
    /// Rack setup steps for the operator, in slot order.
    pub setup: Vec<SetupInstruction>,
    /// The rack the program expects to be loaded.
    pub rack: Rack,
}

/// Run the whole pipeline: compile the inventory, plan the rack, optimize
/// travel and emit the program.
pub fn compile_job(
    settings: &Settings,
    inventory: &Inventory,
    operations: Operations,
    source: &str,
) -> anyhow::Result<CompiledJob> {
    settings.validate()?;

    let mut machining = Machining::new(settings.clone());
    let needed = machining.process(inventory, operations);

    let mut rack = RackManager::from_settings(settings).rack();
    let setup = rack.merge(&needed);

    machining.use_rack(rack.clone());
    machining.optimize();

    let gcode = CodeEmitter::new(MassoG3, settings).generate(&machining, source);

    Ok(CompiledJob { gcode, setup, rack })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_job_round_trip() {
        let mut inventory = Inventory::new();
        inventory.add_hole(&PadRecord {
            coord: Coordinate::new(mm(1.0), mm(1.0)),
            size_x: mm(0.8),
            size_y: None,
            angle: 0.0,
            plated: true,
        });

        let job = compile_job(&Settings::default(), &inventory, Operations::ALL, "test").unwrap();

        assert_eq!(job.setup.len(), 1);
        assert!(job.gcode.contains("G81"));
        assert!(job.rack.is_manual());
    }

    #[test]
    fn test_compile_job_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.stock.drillbits.clear();
        assert!(compile_job(&settings, &Inventory::new(), Operations::ALL, "test").is_err());
    }
}
