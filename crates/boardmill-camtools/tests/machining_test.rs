//! End to end pipeline tests: inventory in, G-code out.

use boardmill_camtools::{
    CodeEmitter, Machining, MassoG3, OperationKind, Rack, RackManager, ToolKind,
};
use boardmill_core::geometry::Coordinate;
use boardmill_core::inventory::{Inventory, Operations, PadRecord};
use boardmill_core::units::mm;
use boardmill_settings::Settings;

fn pad(x: f64, y: f64, size_x: f64, size_y: Option<f64>, plated: bool) -> PadRecord {
    PadRecord {
        coord: Coordinate::new(mm(x), mm(y)),
        size_x: mm(size_x),
        size_y: size_y.map(mm),
        angle: 0.0,
        plated,
    }
}

fn demo_board() -> Inventory {
    let mut inventory = Inventory::new();
    // A row of component holes.
    for x in [10.0, 12.54, 15.08, 17.62] {
        inventory.add_hole(&pad(x, 20.0, 0.8, None, true));
    }
    // Two via sizes.
    inventory.add_hole(&pad(5.0, 5.0, 0.3, None, true));
    inventory.add_hole(&pad(30.0, 5.0, 0.3, None, true));
    // A mounting hole, not plated.
    inventory.add_hole(&pad(2.0, 2.0, 3.0, None, false));
    // An oblong connector slot, 1.0 x 4.0.
    inventory.add_hole(&pad(25.0, 20.0, 1.0, Some(4.0), true));
    // The outline.
    inventory.add_route(mm(2.0));
    inventory
}

fn compile(inventory: &Inventory, settings: &Settings, ops: Operations) -> (Machining, Rack) {
    let mut machining = Machining::new(settings.clone());
    let needed = machining.process(inventory, ops);

    let mut rack = RackManager::from_settings(settings).rack();
    rack.merge(&needed);
    machining.use_rack(rack.clone());
    machining.optimize();
    (machining, rack)
}

#[test]
fn test_requirement_rack_covers_the_board() {
    let settings = Settings::default();
    let mut machining = Machining::new(settings);
    let rack = machining.process(&demo_board(), Operations::ALL);

    // 0.3 and 0.8 drills, the 1.0 drill for the slot, the 3.0 drill for
    // the mounting hole and the 2.0 contour router.
    assert_eq!(rack.len(), 5);
    assert_eq!(rack.tool_at(1).unwrap().diameter, mm(0.3));
    assert_eq!(rack.tool_at(2).unwrap().diameter, mm(0.8));
    assert_eq!(rack.tool_at(3).unwrap().diameter, mm(1.0));
    assert_eq!(rack.tool_at(4).unwrap().diameter, mm(3.0));
    let router = rack.tool_at(5).unwrap();
    assert_eq!(router.kind, ToolKind::Router);
    assert_eq!(router.diameter, mm(2.0));
}

#[test]
fn test_pass_split_matches_plating() {
    let settings = Settings::default();
    let mut machining = Machining::new(settings.clone());
    let first = machining.process(&demo_board(), Operations::FIRST);
    // Plated holes only: 0.3, 0.8 and the 1.0 slot drill.
    assert_eq!(first.len(), 3);
    assert!(first.occupied().all(|(_, t)| t.kind == ToolKind::Drill));

    let mut machining = Machining::new(settings);
    let last = machining.process(&demo_board(), Operations::FINAL);
    // The mounting hole drill and the contour router.
    assert_eq!(last.len(), 2);
    assert_eq!(last.tool_at(1).unwrap().diameter, mm(3.0));
    assert_eq!(last.tool_at(2).unwrap().kind, ToolKind::Router);
}

#[test]
fn test_connector_slot_is_peck_drilled() {
    let settings = Settings::default();
    let (machining, rack) = compile(&demo_board(), &settings, Operations::ALL);

    let slot = rack
        .slot_of(&boardmill_camtools::CuttingTool::new(
            ToolKind::Drill,
            mm(1.0),
            &settings,
        ))
        .unwrap();

    let ops = &machining.operations_by_slot()[&slot];
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationKind::DrillHole);
    // Focal distance 3.0mm, pitch 1/3mm: both ends plus 9 pecks.
    assert_eq!(ops[0].points().count(), 11);
}

#[test]
fn test_operations_bind_to_merged_slots() {
    let mut settings = Settings::default();
    settings.rack.size = 10;
    settings.rack.tools = vec![boardmill_settings::RackToolEntry {
        slot: Some(7),
        drill: Some(mm(0.8)),
        ..Default::default()
    }];

    let (machining, rack) = compile(&demo_board(), &settings, Operations::ALL);

    // The resident 0.8 drill keeps its slot and its operations follow.
    assert_eq!(rack.tool_at(7).unwrap().diameter, mm(0.8));
    let ops = &machining.operations_by_slot()[&7];
    assert_eq!(ops.len(), 4);
    assert!(ops.iter().all(|op| op.tool.diameter == mm(0.8)));
}

#[test]
fn test_travel_stays_optimized_per_tool() {
    let settings = Settings::default();
    let (machining, _) = compile(&demo_board(), &settings, Operations::ALL);

    // The 0.8mm row was inserted in order; after optimization it is
    // visited as a monotonic sweep whichever slot it landed in.
    let row: Vec<f64> = machining
        .operations_by_slot()
        .values()
        .find(|ops| ops.len() == 4)
        .expect("the component row shares one tool")
        .iter()
        .map(|op| op.origin.x.as_mm())
        .collect();

    let mut sorted = row.clone();
    sorted.sort_by(f64::total_cmp);
    let mut reversed = sorted.clone();
    reversed.reverse();
    assert!(row == sorted || row == reversed, "row order was {row:?}");
}

#[test]
fn test_generated_program_is_complete() {
    let settings = Settings::default();
    let (machining, _) = compile(&demo_board(), &settings, Operations::ALL);

    let gcode = CodeEmitter::new(MassoG3, &settings).generate(&machining, "demo_board");

    assert!(gcode.starts_with("(Created by boardmill from 'demo_board'"));
    assert!(gcode.contains("G21"));

    // One tool change per slot in ascending order.
    let changes: Vec<&str> = gcode
        .lines()
        .filter(|line| line.contains(" M06"))
        .collect();
    assert_eq!(changes.len(), machining.operations_by_slot().len());

    // Drilling uses canned cycles, the slot is pecked in the same cycle.
    assert!(gcode.contains("G81"));
    assert!(gcode.contains("G80"));
    assert!(gcode.trim_end().ends_with("(end of file)"));
}

#[test]
fn test_manual_rack_prompts_for_every_tool() {
    let settings = Settings::default();
    let (machining, rack) = compile(&demo_board(), &settings, Operations::ALL);
    assert!(rack.is_manual());

    let gcode = CodeEmitter::new(MassoG3, &settings).generate(&machining, "demo_board");
    let prompts = gcode.lines().filter(|l| l.contains("MSG Load")).count();
    assert_eq!(prompts, machining.operations_by_slot().len());
}

#[test]
fn test_three_drill_board_setup_report() {
    let mut settings = Settings::default();
    settings.stock.drillbits = vec![mm(0.5), mm(0.8), mm(1.2)];

    let mut inventory = Inventory::new();
    for diameter in [0.5, 0.8, 1.2] {
        for i in 0..4 {
            inventory.add_hole(&pad(i as f64, diameter * 10.0, diameter, None, true));
        }
    }

    let mut machining = Machining::new(settings);
    let needed = machining.process(&inventory, Operations::PTH);

    let mut resident = Rack::manual();
    let setup: Vec<String> = resident
        .merge(&needed)
        .iter()
        .map(ToString::to_string)
        .collect();

    assert_eq!(
        setup,
        vec![
            "T01: ADD drillbit 0.5mm",
            "T02: ADD drillbit 0.8mm",
            "T03: ADD drillbit 1.2mm",
        ]
    );
}

#[test]
fn test_empty_inventory_produces_header_and_footer_only() {
    let settings = Settings::default();
    let (machining, _) = compile(&Inventory::new(), &settings, Operations::ALL);

    let gcode = CodeEmitter::new(MassoG3, &settings).generate(&machining, "empty");
    assert!(!gcode.contains("M06"));
    assert!(gcode.contains("(end of file)"));
}
