//! Error types for the CAM pipeline.

use boardmill_core::units::Length;
use thiserror::Error;

use crate::cutting_tools::ToolKind;

/// Errors raised while resolving tools, managing racks or compiling
/// machining operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CamError {
    /// No stocked tool satisfies the request within the configured
    /// tolerance window.
    #[error("No suitable {kind} found for diameter {diameter}")]
    ToolNotFound {
        /// Kind of tool requested.
        kind: ToolKind,
        /// Requested diameter.
        diameter: Length,
    },

    /// The rack has no free slot for a tool that must be loaded.
    #[error("Rack is full, cannot load {tool}")]
    RackFull {
        /// Description of the tool that could not be placed.
        tool: String,
    },

    /// A slot number outside the rack was referenced.
    #[error("Invalid rack slot {slot}")]
    InvalidSlot {
        /// The offending slot number.
        slot: usize,
    },

    /// A non-positive diameter was requested.
    #[error("Invalid tool diameter {diameter}")]
    InvalidDiameter {
        /// The offending diameter.
        diameter: Length,
    },
}

/// Result type alias for CAM operations.
pub type CamResult<T> = Result<T, CamError>;
