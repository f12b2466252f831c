//! Machining compilation.
//!
//! The [`Machining`] compiler walks the board inventory, decides how each
//! feature is cut (drilled, peck-drilled or routed), resolves the tools it
//! needs into a requirement rack, binds operations to rack slots and
//! optimizes the travel within each slot group.
//!
//! Dimensions stay as [`Length`] values throughout; rendering to text is
//! the emitter's business.

use std::collections::{BTreeMap, HashMap, HashSet};

use boardmill_core::geometry::Coordinate;
use boardmill_core::inventory::{Feature, Inventory, Operations};
use boardmill_core::units::{um, Length};
use boardmill_settings::Settings;
use tracing::{debug, error, info};

use crate::cutting_tools::{CuttingTool, ToolKind, ToolResolver};
use crate::error::{CamError, CamResult};
use crate::rack::Rack;
use crate::travel;

/// What a single machining operation does at its origin.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Drill one hole (or a peck chain, when the operation carries extra
    /// points).
    DrillHole,
    /// Route a hole larger than the bit: plunge at the centre, then a full
    /// circle.
    RouteHole { hole_diameter: Length },
    /// Route a straight stroke from the origin to `end`.
    RouteVector { end: Coordinate },
}

/// A single machining operation, possibly expanding to many code lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MachiningOperation {
    /// Where the operation starts.
    pub origin: Coordinate,
    /// The resolved tool that performs it.
    pub tool: CuttingTool,
    /// What happens at the origin.
    pub kind: OperationKind,
    /// Additional points machined in the same cycle, in order. The travel
    /// optimizer never splits an operation apart.
    chain: Vec<Coordinate>,
}

impl MachiningOperation {
    fn drill(origin: Coordinate, tool: CuttingTool) -> Self {
        Self {
            origin,
            tool,
            kind: OperationKind::DrillHole,
            chain: Vec::new(),
        }
    }

    fn route_hole(origin: Coordinate, tool: CuttingTool, hole_diameter: Length) -> Self {
        Self {
            origin,
            tool,
            kind: OperationKind::RouteHole { hole_diameter },
            chain: Vec::new(),
        }
    }

    fn route_vector(origin: Coordinate, end: Coordinate, tool: CuttingTool) -> Self {
        Self {
            origin,
            tool,
            kind: OperationKind::RouteVector { end },
            chain: Vec::new(),
        }
    }

    /// Chain another point into this operation's cycle.
    pub fn then(&mut self, coord: Coordinate) {
        self.chain.push(coord);
    }

    /// Where the machine ends up after this operation, when that differs
    /// from the origin.
    pub fn end_coordinate(&self) -> Option<Coordinate> {
        if let Some(last) = self.chain.last() {
            return Some(*last);
        }
        match self.kind {
            OperationKind::RouteVector { end } => Some(end),
            _ => None,
        }
    }

    /// Every point machined by this operation, origin first.
    pub fn points(&self) -> impl Iterator<Item = Coordinate> + '_ {
        std::iter::once(self.origin).chain(self.chain.iter().copied())
    }
}

/// Compiles an [`Inventory`] into slot-bound, travel-optimized machining
/// operations.
pub struct Machining {
    settings: Settings,
    resolver: ToolResolver,
    ops: Vec<MachiningOperation>,
    slot_ops: BTreeMap<usize, Vec<MachiningOperation>>,
    rack: Option<Rack>,
    /// One resolution (and one log line) per requested tool.
    resolutions: HashMap<(ToolKind, Length), CamResult<CuttingTool>>,
}

impl Machining {
    pub fn new(settings: Settings) -> Self {
        let resolver = ToolResolver::new(&settings);
        Self {
            settings,
            resolver,
            ops: Vec::new(),
            slot_ops: BTreeMap::new(),
            rack: None,
            resolutions: HashMap::new(),
        }
    }

    /// Compile all machining operations for the selected passes.
    ///
    /// Operations are bound to an unbounded rack to start with; call
    /// [`Machining::use_rack`] with the final rack before emitting.
    ///
    /// Returns the requirement rack, sorted and ready to merge into the
    /// resident rack. A feature whose tool cannot be resolved is logged
    /// and dropped; the rest of the board still machines.
    pub fn process(&mut self, inventory: &Inventory, ops: Operations) -> Rack {
        let mut rack = Rack::manual();
        let features = inventory.features(ops);

        for by_diameter in features.values() {
            for feature in by_diameter {
                if let Err(err) = self.process_feature(feature, &mut rack) {
                    error!("No solution exists for a tool request: {err}");
                }
            }
        }

        rack.sort();
        self.use_rack(rack.clone());
        rack
    }

    fn process_feature(&mut self, feature: &Feature, rack: &mut Rack) -> CamResult<()> {
        match feature {
            Feature::Oblong {
                diameter,
                start,
                end,
                distance,
                ..
            } => {
                let limit =
                    *diameter * self.settings.machining.slot_peck_drilling.max_length_to_bit_diameter;

                if *distance > limit {
                    // Too long to peck; route in a single stroke.
                    let tool = self.request(rack, ToolKind::Router, *diameter)?;
                    self.ops
                        .push(MachiningOperation::route_vector(*start, *end, tool));
                } else {
                    let tool = self.request(rack, ToolKind::Drill, *diameter)?;

                    if tool.kind == ToolKind::Router {
                        // The drill request escalated; stroke it instead.
                        self.ops
                            .push(MachiningOperation::route_vector(*start, *end, tool));
                        return Ok(());
                    }

                    // Drill both ends first so the intermediate pecks
                    // cannot wander.
                    let mut op = MachiningOperation::drill(*start, tool);
                    op.then(*end);

                    // The pitch never drops below the length resolution,
                    // whatever the configured peck density.
                    let pitch = (*diameter
                        / self.settings.machining.slot_peck_drilling.pecks_per_hole)
                        .max(um(1));
                    let total_points = (*distance / pitch) as usize;

                    for i in 1..=total_points {
                        let ratio = i as f64 / total_points as f64;
                        op.then(start.lerp(end, ratio));
                    }

                    debug!(
                        "Oblong at {} pecked with {} points",
                        start,
                        2 + total_points
                    );
                    self.ops.push(op);
                }
            }
            Feature::Hole {
                diameter, coord, ..
            } => {
                let tool = self.request(rack, ToolKind::Drill, *diameter)?;

                if tool.kind == ToolKind::Router {
                    self.ops
                        .push(MachiningOperation::route_hole(*coord, tool, *diameter));
                } else {
                    self.ops.push(MachiningOperation::drill(*coord, tool));
                }
            }
            Feature::Route { diameter } => {
                // Outline passes only reserve the bit; the contour path
                // comes from the board profile, not the inventory.
                self.request(rack, ToolKind::Router, *diameter)?;
            }
        }

        Ok(())
    }

    /// Resolve a tool once and keep it in the rack.
    fn request(
        &mut self,
        rack: &mut Rack,
        kind: ToolKind,
        diameter: Length,
    ) -> CamResult<CuttingTool> {
        let resolver = &self.resolver;
        let resolution = self
            .resolutions
            .entry((kind, diameter))
            .or_insert_with(|| resolver.resolve(kind, diameter))
            .clone()?;

        if !rack.contains(&resolution) {
            rack.add_bit(resolution.clone(), None, true)?;
        }
        Ok(resolution)
    }

    /// Bind every operation to a slot of the given rack.
    ///
    /// Operations are ordered drills first, smallest diameter first, then
    /// routers, and grouped by slot. An operation whose tool did not make
    /// it into the rack is dropped with an error.
    pub fn use_rack(&mut self, rack: Rack) {
        self.slot_ops.clear();

        let mut ordered: Vec<&MachiningOperation> = self.ops.iter().collect();
        ordered.sort_by(|a, b| a.tool.cmp(&b.tool));

        for op in ordered {
            match rack.slot_of(&op.tool) {
                Some(slot) => {
                    self.slot_ops.entry(slot).or_default().push(op.clone());
                }
                None => {
                    error!("Tool {} is not in the rack, dropping its operations", op.tool);
                }
            }
        }

        self.rack = Some(rack);
    }

    /// Minimize rapid travel within each slot group.
    ///
    /// Routed strokes enter at one end and leave at the other; they join
    /// the tour as a zero cost edge so a single solver covers everything.
    pub fn optimize(&mut self) {
        for (slot, group) in &mut self.slot_ops {
            let mut coordinates = Vec::new();
            let mut zero_edges = HashSet::new();
            // Node index to operation; exit nodes map to None.
            let mut nodes: Vec<Option<MachiningOperation>> = Vec::new();

            for op in group.drain(..) {
                let origin_index = coordinates.len();
                coordinates.push(op.origin);
                let end = op.end_coordinate();
                nodes.push(Some(op));

                if let Some(end) = end {
                    zero_edges.insert(origin_index);
                    coordinates.push(end);
                    nodes.push(None);
                }
            }

            let order = travel::optimize(&coordinates, &zero_edges);
            for index in order {
                if let Some(op) = nodes[index].take() {
                    group.push(op);
                }
            }

            debug!("Optimized travel for slot {} over {} operations", slot, group.len());
        }

        info!(
            "Travel optimized for {} tool group(s)",
            self.slot_ops.len()
        );
    }

    /// Operations grouped by rack slot, in ascending slot order.
    pub fn operations_by_slot(&self) -> &BTreeMap<usize, Vec<MachiningOperation>> {
        &self.slot_ops
    }

    /// The rack the operations are bound to.
    pub fn rack(&self) -> Option<&Rack> {
        self.rack.as_ref()
    }

    /// The configuration this compiler runs with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
