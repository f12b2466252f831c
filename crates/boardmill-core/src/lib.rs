//! # Boardmill Core
//!
//! Core types for the Boardmill toolpath compiler: length quantities kept as
//! integer micrometres, planar coordinates, and the board feature inventory
//! consumed by the machining compiler.

pub mod error;
pub mod geometry;
pub mod inventory;
pub mod units;

pub use error::CoreError;
pub use geometry::Coordinate;
pub use inventory::{Feature, Inventory, Operations, PadRecord};
pub use units::{inches, mm, um, Length};
