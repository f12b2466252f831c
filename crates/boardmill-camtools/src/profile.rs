//! Machine post-processor profiles.
//!
//! A [`Profile`] renders each machining primitive as G-code text for one
//! controller family. The emitter handles line numbering, trimming and
//! ordering; profiles only produce the words.
//!
//! Z0 is the machine bed, the bottom of the backing board. Zeroing on the
//! bed means no per-job Z setup and no dependence on the board thickness.

use boardmill_core::geometry::Coordinate;
use boardmill_core::units::Length;
use chrono::Local;

use crate::cutting_tools::{CutDirection, CuttingTool};

/// Format a length as a millimetre scalar for a G-code word.
pub(crate) fn scalar(value: Length) -> String {
    let mut text = format!("{:.3}", value.as_mm());
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Renders machining primitives for one controller family.
pub trait Profile {
    /// Preamble of the program.
    fn header(&self, source: &str, z_safe: Length) -> String;

    /// Trailer of the program.
    fn footer(&self) -> String;

    /// Spindle stop, tool change, spindle speed. On a manual machine the
    /// operator is prompted to load the bit.
    fn change_tool(&self, slot: usize, tool: &CuttingTool, manual: bool) -> String;

    /// Open a drilling canned cycle at the first hole.
    ///
    /// `single` is true when the cycle covers exactly one hole; retraction
    /// then goes straight back to the initial Z.
    fn drill_open(
        &self,
        at: Coordinate,
        tool: &CuttingTool,
        z_retract: Length,
        z_safe: Length,
        single: bool,
    ) -> String;

    /// The next hole of an open cycle. `last` marks the final hole, which
    /// retracts to the initial Z instead of the R plane.
    fn drill_next(&self, at: Coordinate, last: bool) -> String;

    /// Cancel the canned cycle.
    fn drill_close(&self) -> String;

    /// Cut a hole wider than the bit: plunge at the centre, then a full
    /// circle of the interpolation diameter.
    fn route_hole(
        &self,
        at: Coordinate,
        hole_diameter: Length,
        tool: &CuttingTool,
        z_safe: Length,
    ) -> String;

    /// Cut a straight stroke from `from` to `to` at full depth.
    fn route_vector(
        &self,
        from: Coordinate,
        to: Coordinate,
        tool: &CuttingTool,
        z_safe: Length,
    ) -> String;
}

/// Profile for the Masso G3 controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassoG3;

impl Profile for MassoG3 {
    fn header(&self, source: &str, z_safe: Length) -> String {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        format!(
            "(Created by boardmill from '{source}' - {stamp})\n\
             (Reset all back to safe defaults)\n\
             G17 G54 G40 G49 G80 G90\n\
             G21\n\
             G10 P0\n\
             (Establish the Z-Safe)\n\
             G0 Z{}\n",
            scalar(z_safe)
        )
    }

    fn footer(&self) -> String {
        "(end of file)\n".to_string()
    }

    fn change_tool(&self, slot: usize, tool: &CuttingTool, manual: bool) -> String {
        let prompt = if manual {
            format!("MSG Load {tool}\nM01\n")
        } else {
            String::new()
        };

        format!("M05\n{prompt}T{slot} M06\nS{:.0}\n", tool.rpm)
    }

    fn drill_open(
        &self,
        at: Coordinate,
        tool: &CuttingTool,
        z_retract: Length,
        z_safe: Length,
        single: bool,
    ) -> String {
        // Move Z up first to avoid collisions, then over the first hole.
        // The spindle is already turning; a wildly wrong position can
        // still be caught at the optional stop of the tool change.
        let retract_mode = if single { "G98" } else { "G99" };
        format!(
            "G0 X{} Y{} Z{}\n{retract_mode}\nG81 Z{} R{} F{:.0}\n",
            scalar(at.x),
            scalar(at.y),
            scalar(z_safe),
            scalar(tool.z_bottom),
            scalar(z_retract),
            tool.z_feedrate,
        )
    }

    fn drill_next(&self, at: Coordinate, last: bool) -> String {
        if last {
            format!("G98 X{} Y{}\n", scalar(at.x), scalar(at.y))
        } else {
            format!("X{} Y{}\n", scalar(at.x), scalar(at.y))
        }
    }

    fn drill_close(&self) -> String {
        "G80\n".to_string()
    }

    fn route_hole(
        &self,
        at: Coordinate,
        hole_diameter: Length,
        tool: &CuttingTool,
        z_safe: Length,
    ) -> String {
        // Radius of the circle the bit centre follows.
        let id = (hole_diameter - tool.diameter) / 2.0;

        // Clockwise with an upcut bit pulls the chips up and out; the
        // bottom surface is the backing board's problem.
        let arc = match tool.cut_direction {
            CutDirection::Up | CutDirection::UpDown => "G2",
            CutDirection::Down => "G3",
        };

        format!(
            "G90 G0 X{} Y{}\n\
             G1 Z{} F{:.0}\n\
             G1 Y{} F{:.0}\n\
             {arc} I0 J-{}\n\
             G0 Z{}\n",
            scalar(at.x),
            scalar(at.y),
            scalar(tool.z_bottom),
            tool.z_feedrate,
            scalar(at.y + id),
            tool.table_feedrate,
            scalar(id),
            scalar(z_safe),
        )
    }

    fn route_vector(
        &self,
        from: Coordinate,
        to: Coordinate,
        tool: &CuttingTool,
        z_safe: Length,
    ) -> String {
        format!(
            "G0 X{} Y{} Z{}\n\
             G1 Z{} F{:.0}\n\
             G1 X{} Y{} F{:.0}\n\
             G0 Z{}\n",
            scalar(from.x),
            scalar(from.y),
            scalar(z_safe),
            scalar(tool.z_bottom),
            tool.z_feedrate,
            scalar(to.x),
            scalar(to.y),
            tool.table_feedrate,
            scalar(z_safe),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutting_tools::ToolKind;
    use boardmill_core::units::mm;
    use boardmill_settings::Settings;

    fn at(x: f64, y: f64) -> Coordinate {
        Coordinate::new(mm(x), mm(y))
    }

    #[test]
    fn test_scalar_formatting() {
        assert_eq!(scalar(mm(10.0)), "10");
        assert_eq!(scalar(mm(0.65)), "0.65");
        assert_eq!(scalar(mm(1.2345)), "1.234");
        assert_eq!(scalar(mm(-2.5)), "-2.5");
    }

    #[test]
    fn test_header_resets_modal_state() {
        let header = MassoG3.header("board.json", mm(10.0));
        assert!(header.contains("G17 G54 G40 G49 G80 G90"));
        assert!(header.contains("G21"));
        assert!(header.contains("G0 Z10"));
        assert!(header.contains("'board.json'"));
    }

    #[test]
    fn test_manual_tool_change_prompts_the_operator() {
        let settings = Settings::default();
        let tool = CuttingTool::new(ToolKind::Drill, mm(0.8), &settings);

        let manual = MassoG3.change_tool(2, &tool, true);
        assert!(manual.contains("MSG Load drillbit 0.8mm"));
        assert!(manual.contains("M01"));
        assert!(manual.contains("T2 M06"));

        let automatic = MassoG3.change_tool(2, &tool, false);
        assert!(!automatic.contains("MSG"));
        assert!(automatic.contains("T2 M06"));
    }

    #[test]
    fn test_drill_cycle_words() {
        let settings = Settings::default();
        let tool = CuttingTool::new(ToolKind::Drill, mm(1.0), &settings);

        let open = MassoG3.drill_open(at(1.0, 2.0), &tool, mm(2.0), mm(10.0), false);
        assert!(open.contains("G0 X1 Y2 Z10"));
        assert!(open.contains("G99"));
        assert!(open.contains("R2"));
        assert!(open.starts_with("G0"));

        let single = MassoG3.drill_open(at(1.0, 2.0), &tool, mm(2.0), mm(10.0), true);
        assert!(single.contains("G98"));

        assert_eq!(MassoG3.drill_next(at(3.0, 4.0), false), "X3 Y4\n");
        assert_eq!(MassoG3.drill_next(at(3.0, 4.0), true), "G98 X3 Y4\n");
        assert_eq!(MassoG3.drill_close(), "G80\n");
    }

    #[test]
    fn test_route_hole_arc() {
        let settings = Settings::default();
        let tool = CuttingTool::new(ToolKind::Router, mm(2.0), &settings);

        let code = MassoG3.route_hole(at(0.0, 0.0), mm(6.0), &tool, mm(10.0));
        // Interpolation radius is (6 - 2) / 2 = 2mm.
        assert!(code.contains("G1 Y2"));
        assert!(code.contains("G2 I0 J-2"));
        assert!(code.ends_with("G0 Z10\n"));
    }
}
