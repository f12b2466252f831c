//! Rack merge and setup report scenarios, as the operator sees them.

use boardmill_camtools::{CuttingTool, Rack, RackManager, SetupInstruction, ToolKind};
use boardmill_core::units::mm;
use boardmill_settings::{RackToolEntry, Settings};

fn drill(diameter: f64) -> CuttingTool {
    CuttingTool::new(ToolKind::Drill, mm(diameter), &Settings::default())
}

fn router(diameter: f64) -> CuttingTool {
    CuttingTool::new(ToolKind::Router, mm(diameter), &Settings::default())
}

fn required(tools: &[CuttingTool]) -> Rack {
    let mut rack = Rack::manual();
    for tool in tools {
        rack.add_bit(tool.clone(), None, false).unwrap();
    }
    rack.sort();
    rack
}

#[test]
fn test_fresh_rack_setup_report() {
    let needed = required(&[drill(0.8), drill(0.5), router(1.2)]);

    let mut resident = Rack::new(8);
    let setup = resident.merge(&needed);

    let report: Vec<String> = setup.iter().map(ToString::to_string).collect();
    assert_eq!(
        report,
        vec![
            "T01: ADD drillbit 0.5mm",
            "T02: ADD drillbit 0.8mm",
            "T03: ADD routerbit 1.2mm",
        ]
    );
}

#[test]
fn test_resident_tools_are_reused_without_instructions() {
    let needed = required(&[drill(0.5), drill(0.8)]);

    let mut resident = Rack::new(8);
    resident.add_bit(drill(0.8), Some(5), false).unwrap();
    resident.add_bit(drill(0.5), Some(6), false).unwrap();

    let setup = resident.merge(&needed);
    assert!(setup.is_empty());
    assert_eq!(resident.slot_of(&drill(0.8)), Some(5));
}

#[test]
fn test_full_rack_replaces_from_the_back() {
    let needed = required(&[drill(1.0), drill(1.2)]);

    let mut resident = Rack::new(3);
    resident.add_bit(drill(0.5), Some(1), false).unwrap();
    resident.add_bit(drill(1.0), Some(2), false).unwrap();
    resident.add_bit(drill(0.7), Some(3), false).unwrap();

    let setup = resident.merge(&needed);
    assert_eq!(setup.len(), 1);
    assert_eq!(
        setup[0],
        SetupInstruction::Replace {
            slot: 3,
            removed: drill(0.7),
            tool: drill(1.2),
        }
    );
    // The slot at the front keeps its bit.
    assert_eq!(resident.slot_of(&drill(0.5)), Some(1));
}

#[test]
fn test_manual_rack_accepts_everything() {
    let needed = required(&[drill(0.5), drill(0.8), drill(1.0), router(2.0)]);

    let mut resident = Rack::manual();
    let setup = resident.merge(&needed);

    assert_eq!(setup.len(), 4);
    assert_eq!(resident.len(), 4);
    assert!(setup
        .iter()
        .all(|op| matches!(op, SetupInstruction::Add { .. })));
}

#[test]
fn test_setup_then_binding_round_trip() {
    // The slots named in the report must be the slots the tools end up in.
    let needed = required(&[drill(0.6), drill(0.9)]);

    let mut resident = Rack::new(4);
    resident.add_bit(router(2.0), Some(1), false).unwrap();

    for instruction in resident.merge(&needed) {
        match instruction {
            SetupInstruction::Add { slot, tool }
            | SetupInstruction::Replace { slot, tool, .. } => {
                assert_eq!(resident.slot_of(&tool), Some(slot));
            }
        }
    }
}

#[test]
fn test_manager_builds_the_configured_rack() {
    let mut settings = Settings::default();
    settings.rack.size = 6;
    settings.rack.tools = vec![
        RackToolEntry {
            drill: Some(mm(0.8)),
            ..Default::default()
        },
        RackToolEntry {
            drill: Some(mm(1.0)),
            ..Default::default()
        },
        RackToolEntry {
            slot: Some(6),
            router: Some(mm(2.0)),
            ..Default::default()
        },
        RackToolEntry {
            slot: Some(4),
            in_use: false,
            ..Default::default()
        },
    ];

    let rack = RackManager::from_settings(&settings).rack();
    assert!(!rack.is_manual());
    assert_eq!(rack.tool_at(1).unwrap().diameter, mm(0.8));
    assert_eq!(rack.tool_at(2).unwrap().diameter, mm(1.0));
    assert_eq!(rack.tool_at(6).unwrap().kind, ToolKind::Router);

    // Slot 4 is out of service; a merge never fills it.
    let needed = required(&[drill(0.3), drill(0.4), drill(0.5)]);
    let mut resident = rack;
    resident.merge(&needed);
    assert!(resident.tool_at(4).is_none());
}

#[test]
fn test_manager_with_no_definition_is_manual() {
    let settings = Settings::default();
    let rack = RackManager::from_settings(&settings).rack();
    assert!(rack.is_manual());
    assert_eq!(rack.len(), 0);
}
