//! CAM pipeline for Boardmill.
//!
//! Turns a board [`Inventory`](boardmill_core::Inventory) into a G-code
//! program:
//!
//! 1. [`Machining::process`] compiles features into operations and builds
//!    the requirement [`Rack`].
//! 2. [`Rack::merge`] folds the requirements into the machine's resident
//!    rack and produces the operator setup report.
//! 3. [`Machining::use_rack`] binds operations to the final slots and
//!    [`Machining::optimize`] minimizes rapid travel per tool.
//! 4. [`CodeEmitter::generate`] renders the program through a machine
//!    [`Profile`].

pub mod cutting_tools;
pub mod emitter;
pub mod error;
pub mod machining;
pub mod profile;
pub mod rack;
pub mod travel;

pub use cutting_tools::{CutDirection, CuttingTool, ToolKind, ToolResolver};
pub use emitter::CodeEmitter;
pub use error::{CamError, CamResult};
pub use machining::{Machining, MachiningOperation, OperationKind};
pub use profile::{MassoG3, Profile};
pub use rack::{Rack, RackManager, SetupInstruction};
