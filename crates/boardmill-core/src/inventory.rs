//! Board feature inventory
//!
//! The inventory collects every feature of the board that requires machining,
//! grouped by diameter within the plated and non-plated classes. It records
//! the geometry only; how a feature is machined (drilled, peck-drilled or
//! routed) is decided later by the machining compiler.
//!
//! Machining happens in passes:
//! - PTH holes are drilled on the bare board, before plating.
//! - NPTH holes are drilled after plating and etching.
//! - The OUTLINE is routed last, once the board reaches its final size.

use crate::geometry::Coordinate;
use crate::units::Length;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{BitOr, BitOrAssign};

/// Mask of machining passes to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operations(u8);

impl Operations {
    /// Nothing selected.
    pub const NONE: Operations = Operations(0);
    /// Plated through holes, including plated oblongs.
    pub const PTH: Operations = Operations(0b0001);
    /// Non-plated holes, including non-plated oblongs.
    pub const NPTH: Operations = Operations(0b0010);
    /// Routing of the board outline.
    pub const OUTLINE: Operations = Operations(0b0100);
    /// First machining pass of a plated board.
    pub const FIRST: Operations = Operations(0b0001);
    /// Final pass: non-plated holes and the contour.
    pub const FINAL: Operations = Operations(0b0110);
    /// Everything, typically for single-sided boards done in one pass.
    pub const ALL: Operations = Operations(0b0111);

    /// True when every pass in `other` is selected in `self`.
    pub fn contains(self, other: Operations) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Operations {
    type Output = Operations;
    fn bitor(self, rhs: Operations) -> Operations {
        Operations(self.0 | rhs.0)
    }
}

impl BitOrAssign for Operations {
    fn bitor_assign(&mut self, rhs: Operations) {
        self.0 |= rhs.0;
    }
}

/// A single board feature requiring machining.
///
/// The variants form a closed set matched exhaustively by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// A round hole.
    Hole {
        diameter: Length,
        coord: Coordinate,
        plated: bool,
    },
    /// An elongated hole with two focal points. `distance` is the focal
    /// separation, fixed at construction.
    Oblong {
        diameter: Length,
        start: Coordinate,
        end: Coordinate,
        distance: Length,
        plated: bool,
    },
    /// An outline segment routed with a bit of the given diameter.
    Route { diameter: Length },
}

impl Feature {
    /// Create an oblong feature; the focal distance is derived here and
    /// never changes afterwards.
    pub fn oblong(diameter: Length, start: Coordinate, end: Coordinate, plated: bool) -> Self {
        Feature::Oblong {
            diameter,
            start,
            end,
            distance: start.distance_to(&end),
            plated,
        }
    }

    /// The feature diameter (for a route, the bit diameter).
    pub fn diameter(&self) -> Length {
        match self {
            Feature::Hole { diameter, .. }
            | Feature::Oblong { diameter, .. }
            | Feature::Route { diameter } => *diameter,
        }
    }
}

/// A KiCad-style pad record, as handed over by the board source.
///
/// Oblong pads carry two sizes and an orientation; the inventory derives the
/// slot focal points from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadRecord {
    /// Pad centre.
    pub coord: Coordinate,
    /// Hole size along the pad X axis.
    pub size_x: Length,
    /// Hole size along the pad Y axis; equal to `size_x` (or absent) for a
    /// round hole.
    #[serde(default)]
    pub size_y: Option<Length>,
    /// Pad orientation in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Plated through hole.
    #[serde(default = "default_plated")]
    pub plated: bool,
}

fn default_plated() -> bool {
    true
}

/// Every feature of the board requiring machining, keyed by diameter within
/// the plated / non-plated classes.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pth: BTreeMap<Length, Vec<Feature>>,
    npth: BTreeMap<Length, Vec<Feature>>,
    outline: BTreeMap<Length, Vec<Feature>>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hole from pad data.
    ///
    /// Square (equal-sized) pad holes become plain holes; unequal sizes
    /// become oblongs whose focal points are derived from the pad sizes and
    /// orientation. KiCad uses screen coordinates, so the angle is inverted.
    pub fn add_hole(&mut self, pad: &PadRecord) {
        let feature = match pad.size_y {
            None => Feature::Hole {
                diameter: pad.size_x,
                coord: pad.coord,
                plated: pad.plated,
            },
            Some(size_y) if size_y == pad.size_x => Feature::Hole {
                diameter: pad.size_x,
                coord: pad.coord,
                plated: pad.plated,
            },
            Some(size_y) => {
                let width = pad.size_x.min(size_y);
                let radius = (pad.size_x.max(size_y) - width) / 2.0;
                let upright = if pad.size_x < size_y { 90.0 } else { 0.0 };
                let angle = (upright - pad.angle).to_radians();
                let dx = radius * angle.cos();
                let dy = radius * angle.sin();
                let start = Coordinate::new(pad.coord.x + dx, pad.coord.y + dy);
                let end = Coordinate::new(pad.coord.x - dx, pad.coord.y - dy);
                Feature::oblong(width, start, end, pad.plated)
            }
        };

        self.push(feature);
    }

    /// Register an outline routing requirement for the given bit diameter.
    pub fn add_route(&mut self, diameter: Length) {
        self.push(Feature::Route { diameter });
    }

    fn push(&mut self, feature: Feature) {
        let diameter = feature.diameter();
        let group = match &feature {
            Feature::Hole { plated: true, .. } | Feature::Oblong { plated: true, .. } => {
                &mut self.pth
            }
            Feature::Hole { .. } | Feature::Oblong { .. } => &mut self.npth,
            Feature::Route { .. } => &mut self.outline,
        };
        group.entry(diameter).or_default().push(feature);
    }

    /// All features selected by the given pass mask, keyed by diameter.
    pub fn features(&self, ops: Operations) -> BTreeMap<Length, Vec<Feature>> {
        let mut retval: BTreeMap<Length, Vec<Feature>> = BTreeMap::new();

        let mut extend = |source: &BTreeMap<Length, Vec<Feature>>| {
            for (diameter, features) in source {
                retval
                    .entry(*diameter)
                    .or_default()
                    .extend(features.iter().cloned());
            }
        };

        if ops.contains(Operations::PTH) {
            extend(&self.pth);
        }
        if ops.contains(Operations::NPTH) {
            extend(&self.npth);
        }
        if ops.contains(Operations::OUTLINE) {
            extend(&self.outline);
        }

        retval
    }

    /// Total number of features in the inventory.
    pub fn len(&self) -> usize {
        self.pth
            .values()
            .chain(self.npth.values())
            .chain(self.outline.values())
            .map(Vec::len)
            .sum()
    }

    /// True when no features have been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
