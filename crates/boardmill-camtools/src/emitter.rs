//! G-code emission.
//!
//! The [`CodeEmitter`] walks the slot-bound operations of a compiled
//! [`Machining`] job and renders them through a [`Profile`]. Consecutive
//! drilling operations of a tool group share one canned cycle; a route in
//! between closes the cycle and a later drill reopens it.

use boardmill_settings::Settings;

use crate::machining::{Machining, OperationKind};
use crate::profile::Profile;

/// Collects output lines, trimming indentation and applying `N` line
/// numbers. Comment lines are never numbered.
struct LineWriter {
    out: String,
    numbering: u32,
    increment: u32,
}

impl LineWriter {
    fn new(increment: u32) -> Self {
        Self {
            out: String::new(),
            numbering: increment,
            increment,
        }
    }

    fn write(&mut self, chunk: &str) {
        for line in chunk.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if self.increment > 0 && !line.starts_with('(') {
                self.out.push_str(&format!("N{:04} ", self.numbering));
                self.numbering += self.increment;
            }

            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Renders a compiled machining job as a G-code program.
pub struct CodeEmitter<P: Profile> {
    profile: P,
    settings: Settings,
}

impl<P: Profile> CodeEmitter<P> {
    pub fn new(profile: P, settings: &Settings) -> Self {
        Self {
            profile,
            settings: settings.clone(),
        }
    }

    /// Generate the complete program for the given job.
    ///
    /// `source` names the board the program was made from and only appears
    /// in the header comment.
    pub fn generate(&self, machining: &Machining, source: &str) -> String {
        let m = &self.settings.machining;
        let z_safe = m.z_safe_height;
        let z_retract = m.z_drill_retract_height;

        let mut writer = LineWriter::new(self.settings.gcode.line_numbers_increment);
        writer.write(&self.profile.header(source, z_safe));

        let manual = machining.rack().map_or(true, |rack| rack.is_manual());

        for (slot, ops) in machining.operations_by_slot() {
            let tool = &ops[0].tool;
            writer.write(&self.profile.change_tool(*slot, tool, manual));

            let mut index = 0;
            while index < ops.len() {
                match &ops[index].kind {
                    OperationKind::DrillHole => {
                        // Flatten the run of consecutive drills into one
                        // canned cycle.
                        let mut points = Vec::new();
                        while index < ops.len()
                            && matches!(ops[index].kind, OperationKind::DrillHole)
                        {
                            points.extend(ops[index].points());
                            index += 1;
                        }

                        let single = points.len() == 1;
                        writer.write(&self.profile.drill_open(
                            points[0], tool, z_retract, z_safe, single,
                        ));
                        for (i, point) in points.iter().enumerate().skip(1) {
                            let last = i == points.len() - 1;
                            writer.write(&self.profile.drill_next(*point, last));
                        }
                        writer.write(&self.profile.drill_close());
                    }
                    OperationKind::RouteHole { hole_diameter } => {
                        writer.write(&self.profile.route_hole(
                            ops[index].origin,
                            *hole_diameter,
                            tool,
                            z_safe,
                        ));
                        index += 1;
                    }
                    OperationKind::RouteVector { end } => {
                        writer.write(&self.profile.route_vector(
                            ops[index].origin,
                            *end,
                            tool,
                            z_safe,
                        ));
                        index += 1;
                    }
                }
            }
        }

        writer.write(&self.profile.footer());
        writer.finish()
    }
}
