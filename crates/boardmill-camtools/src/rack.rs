//! Tool rack management.
//!
//! A machine with an automatic tool changer has a fixed size magazine; the
//! operator wants most jobs to reuse the same tool positions. A manual
//! machine has no magazine at all and is modelled as a rack of size 0 which
//! grows without limit.
//!
//! Slots are numbered from 1, matching the `T` words in the emitted code.

use std::collections::BTreeSet;
use std::fmt;

use boardmill_core::units::Length;
use boardmill_settings::Settings;
use tracing::{error, warn};

use crate::cutting_tools::{CuttingTool, ToolKind, ToolResolver};
use crate::error::{CamError, CamResult};

/// One step of the rack setup report shown to the operator before a job.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupInstruction {
    /// Load a tool into a vacant slot.
    Add { slot: usize, tool: CuttingTool },
    /// Swap out a resident tool the job does not need.
    Replace {
        slot: usize,
        removed: CuttingTool,
        tool: CuttingTool,
    },
}

impl fmt::Display for SetupInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupInstruction::Add { slot, tool } => write!(f, "T{slot:02}: ADD {tool}"),
            SetupInstruction::Replace {
                slot,
                removed,
                tool,
            } => write!(f, "T{slot:02}: REPLACE {removed} WITH {tool}"),
        }
    }
}

/// A tool magazine.
#[derive(Debug, Clone, Default)]
pub struct Rack {
    slots: Vec<Option<CuttingTool>>,
    size: usize,
    unusable: BTreeSet<usize>,
}

impl Rack {
    /// Create a rack of the given size. Size 0 means a manual, unbounded
    /// rack.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            size,
            unusable: BTreeSet::new(),
        }
    }

    /// Create a manual, unbounded rack.
    pub fn manual() -> Self {
        Self::new(0)
    }

    pub fn is_manual(&self) -> bool {
        self.size == 0
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// The tool in the given slot, if any. Slots are numbered from 1.
    pub fn tool_at(&self, slot: usize) -> Option<&CuttingTool> {
        if slot < 1 || slot > self.slots.len() {
            return None;
        }
        self.slots[slot - 1].as_ref()
    }

    /// Mark a slot as not usable (damaged collet, reserved position).
    pub fn mark_unusable(&mut self, slot: usize) {
        self.unusable.insert(slot);
    }

    /// Occupied slots in ascending order.
    pub fn occupied(&self) -> impl DoubleEndedIterator<Item = (usize, &CuttingTool)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|tool| (i + 1, tool)))
    }

    pub fn contains(&self, tool: &CuttingTool) -> bool {
        self.slot_of(tool).is_some()
    }

    /// The slot holding the given tool, if loaded.
    pub fn slot_of(&self, tool: &CuttingTool) -> Option<usize> {
        self.occupied()
            .find(|(_, loaded)| *loaded == tool)
            .map(|(slot, _)| slot)
    }

    fn is_free(&self, slot: usize) -> bool {
        self.slots[slot - 1].is_none() && !self.unusable.contains(&slot)
    }

    /// Find a free slot, preferring the run of free slots nearest the end.
    ///
    /// A gap left at the start of the rack usually serves a purpose, so
    /// filling begins from the back. Manual racks grow a new slot instead.
    pub fn find_free_position(&mut self) -> Option<usize> {
        let mut found = None;

        for slot in (1..=self.slots.len()).rev() {
            if self.is_free(slot) {
                found = Some(slot);
            } else if found.is_some() {
                break;
            }
        }

        if found.is_none() && self.is_manual() {
            self.slots.push(None);
            found = Some(self.slots.len());
        }

        found
    }

    /// Load a tool, either into an explicit slot or the next free one.
    ///
    /// Returns the slot the tool landed in.
    pub fn add_bit(
        &mut self,
        tool: CuttingTool,
        position: Option<usize>,
        no_warn: bool,
    ) -> CamResult<usize> {
        for (slot, loaded) in self.occupied() {
            if *loaded == tool {
                warn!(
                    "Bit {} is already present in the rack at T{:02}, it will be reused",
                    tool, slot
                );
                return Ok(slot);
            }
        }

        if self.is_manual() {
            // Explicit positions are meaningless without a magazine.
            self.slots.push(Some(tool));
            return Ok(self.slots.len());
        }

        let position = match position {
            Some(position) => {
                if position < 1 || position > self.size {
                    return Err(CamError::InvalidSlot { slot: position });
                }
                if self.unusable.contains(&position) {
                    warn!("Slot {} is not usable", position);
                    return Err(CamError::InvalidSlot { slot: position });
                }
                position
            }
            None => self
                .find_free_position()
                .ok_or_else(|| CamError::RackFull {
                    tool: tool.to_string(),
                })?,
        };

        if let Some(occupant) = &self.slots[position - 1] {
            if !no_warn {
                warn!("Slot {} already occupied with {}", position, occupant);
            }
        }

        self.slots[position - 1] = Some(tool);
        Ok(position)
    }

    /// Bring every tool of `required` into this rack, preferring free slots
    /// and falling back to replacing resident tools the job does not use.
    ///
    /// Returns the setup instructions for the operator. A full rack is
    /// reported and the remaining tools are skipped; the job loses the
    /// features cut by those tools but the rest still machines.
    pub fn merge(&mut self, required: &Rack) -> Vec<SetupInstruction> {
        let mut instructions = Vec::new();

        let wanted: Vec<CuttingTool> = required.occupied().map(|(_, t)| t.clone()).collect();

        for tool in wanted {
            if self.contains(&tool) {
                continue;
            }

            if let Some(slot) = self.find_free_position() {
                self.slots[slot - 1] = Some(tool.clone());
                instructions.push(SetupInstruction::Add { slot, tool });
                continue;
            }

            // Replace from the back so the front of the rack stays stable.
            let candidate = self
                .occupied()
                .rev()
                .find(|(_, resident)| !required.contains(resident))
                .map(|(slot, resident)| (slot, resident.clone()));

            match candidate {
                Some((slot, removed)) => {
                    self.slots[slot - 1] = Some(tool.clone());
                    instructions.push(SetupInstruction::Replace {
                        slot,
                        removed,
                        tool,
                    });
                }
                None => {
                    error!("Rack is full, cannot add tool {}", tool);
                }
            }
        }

        instructions
    }

    /// Reorganize the rack by tool kind and diameter, compacting to the
    /// front and skipping unusable slots.
    pub fn sort(&mut self) {
        let mut tools: Vec<CuttingTool> = self.slots.iter().flatten().cloned().collect();
        tools.sort();

        if self.is_manual() {
            self.slots = tools.into_iter().map(Some).collect();
            return;
        }

        self.slots = vec![None; self.size];
        let mut slot = 1;
        for tool in tools {
            while self.unusable.contains(&slot) {
                slot += 1;
            }
            if slot > self.size {
                error!("Rack has fewer usable slots than tools, dropping {}", tool);
                break;
            }
            self.slots[slot - 1] = Some(tool);
            slot += 1;
        }
    }

    /// Resolve a tool request and make sure the rack holds the result.
    ///
    /// Returns the resolved tool and its slot.
    pub fn request(
        &mut self,
        resolver: &ToolResolver,
        kind: ToolKind,
        diameter: Length,
    ) -> CamResult<(CuttingTool, usize)> {
        let tool = resolver.resolve(kind, diameter)?;

        if let Some(slot) = self.slot_of(&tool) {
            return Ok((tool, slot));
        }

        let slot = self.add_bit(tool.clone(), None, false)?;
        Ok((tool, slot))
    }
}

impl fmt::Display for Rack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match slot {
                None => write!(f, "T{:02}:x", i + 1)?,
                Some(tool) => {
                    let marker = if tool.kind == ToolKind::Router { "R" } else { "" };
                    write!(f, "T{:02}:{}{}", i + 1, marker, tool.diameter)?;
                }
            }
        }
        Ok(())
    }
}

/// Builds the resident rack from the configuration.
///
/// Tools fill slots in declaration order unless an entry pins an explicit
/// slot; `use = false` entries mark their slot unusable.
#[derive(Debug, Clone)]
pub struct RackManager {
    rack: Rack,
}

impl RackManager {
    pub fn from_settings(settings: &Settings) -> Self {
        let definition = &settings.rack;
        let mut rack = Rack::new(definition.size);
        let mut current_slot = 0usize;

        for entry in &definition.tools {
            current_slot = entry.slot.unwrap_or(current_slot + 1);

            if !entry.in_use {
                rack.mark_unusable(current_slot);
                continue;
            }

            let requested = match (entry.drill, entry.router) {
                (Some(diameter), None) => Some((ToolKind::Drill, diameter)),
                (None, Some(diameter)) => Some((ToolKind::Router, diameter)),
                (None, None) => None,
                (Some(_), Some(_)) => {
                    warn!(
                        "Rack entry for slot {} names both a drill and a router, skipping",
                        current_slot
                    );
                    None
                }
            };

            let Some((kind, diameter)) = requested else {
                continue;
            };

            if !diameter.is_positive() {
                warn!("Rack entry for slot {} has diameter {}, skipping", current_slot, diameter);
                continue;
            }

            let tool = CuttingTool::new(kind, diameter, settings);
            let position = (!rack.is_manual()).then_some(current_slot);

            if let Err(err) = rack.add_bit(tool, position, false) {
                error!("Rack definition is unusable ({err}), falling back to a manual rack");
                return Self {
                    rack: Rack::manual(),
                };
            }
        }

        Self { rack }
    }

    /// A copy of the resident rack for this job to merge into.
    pub fn rack(&self) -> Rack {
        self.rack.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardmill_core::units::mm;

    fn drill(diameter: f64) -> CuttingTool {
        CuttingTool::new(ToolKind::Drill, mm(diameter), &Settings::default())
    }

    fn router(diameter: f64) -> CuttingTool {
        CuttingTool::new(ToolKind::Router, mm(diameter), &Settings::default())
    }

    #[test]
    fn test_manual_rack_grows() {
        let mut rack = Rack::manual();
        assert_eq!(rack.add_bit(drill(0.5), None, false).unwrap(), 1);
        assert_eq!(rack.add_bit(drill(0.8), None, false).unwrap(), 2);
        assert_eq!(rack.len(), 2);
    }

    #[test]
    fn test_duplicate_tool_reuses_slot() {
        let mut rack = Rack::manual();
        let first = rack.add_bit(drill(0.5), None, false).unwrap();
        let second = rack.add_bit(drill(0.5), None, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(rack.len(), 1);
    }

    #[test]
    fn test_fill_starts_from_the_back() {
        let mut rack = Rack::new(6);
        // The free run is the whole rack; its lowest slot is 1.
        assert_eq!(rack.add_bit(drill(0.5), None, false).unwrap(), 1);
        // Occupy slot 3, leaving free runs 2 and 4..6.
        rack.add_bit(drill(0.8), Some(3), false).unwrap();
        // The run nearest the end starts at 4.
        assert_eq!(rack.add_bit(drill(1.0), None, false).unwrap(), 4);
    }

    #[test]
    fn test_unusable_slot_is_skipped() {
        let mut rack = Rack::new(2);
        rack.mark_unusable(2);
        assert_eq!(rack.add_bit(drill(0.5), None, false).unwrap(), 1);
        let err = rack.add_bit(drill(0.8), None, false).unwrap_err();
        assert!(matches!(err, CamError::RackFull { .. }));
    }

    #[test]
    fn test_invalid_position_is_rejected() {
        let mut rack = Rack::new(2);
        let err = rack.add_bit(drill(0.5), Some(3), false).unwrap_err();
        assert_eq!(err, CamError::InvalidSlot { slot: 3 });
    }

    #[test]
    fn test_merge_into_empty_rack() {
        let mut required = Rack::manual();
        required.add_bit(drill(0.5), None, false).unwrap();
        required.add_bit(drill(0.8), None, false).unwrap();
        required.add_bit(router(1.2), None, false).unwrap();

        let mut resident = Rack::new(8);
        let setup = resident.merge(&required);

        assert_eq!(setup.len(), 3);
        assert!(matches!(&setup[0], SetupInstruction::Add { slot: 1, tool } if tool.diameter == mm(0.5)));
        assert_eq!(resident.tool_at(2).unwrap().diameter, mm(0.8));
        assert_eq!(resident.tool_at(3).unwrap().kind, ToolKind::Router);
    }

    #[test]
    fn test_merge_keeps_resident_tools_in_place() {
        let mut required = Rack::manual();
        required.add_bit(drill(0.8), None, false).unwrap();
        required.add_bit(drill(1.0), None, false).unwrap();

        let mut resident = Rack::new(4);
        resident.add_bit(drill(0.8), Some(3), false).unwrap();

        let setup = resident.merge(&required);
        assert_eq!(setup.len(), 1);
        assert_eq!(resident.slot_of(&drill(0.8)), Some(3));
        assert!(resident.contains(&drill(1.0)));
    }

    #[test]
    fn test_merge_replaces_unneeded_tool_when_full() {
        let mut required = Rack::manual();
        required.add_bit(drill(1.0), None, false).unwrap();

        let mut resident = Rack::new(2);
        resident.add_bit(drill(0.5), Some(1), false).unwrap();
        resident.add_bit(drill(0.6), Some(2), false).unwrap();

        let setup = resident.merge(&required);
        assert_eq!(setup.len(), 1);
        match &setup[0] {
            SetupInstruction::Replace {
                slot,
                removed,
                tool,
            } => {
                // Replacement comes from the back.
                assert_eq!(*slot, 2);
                assert_eq!(removed.diameter, mm(0.6));
                assert_eq!(tool.diameter, mm(1.0));
            }
            other => panic!("expected a replace, got {other}"),
        }
    }

    #[test]
    fn test_merge_full_rack_is_not_fatal() {
        let mut required = Rack::manual();
        required.add_bit(drill(0.5), None, false).unwrap();
        required.add_bit(drill(0.8), None, false).unwrap();

        let mut resident = Rack::new(1);
        let setup = resident.merge(&required);

        // Only one tool fits; the other is reported and dropped.
        assert_eq!(setup.len(), 1);
        assert!(resident.contains(&drill(0.5)));
        assert!(!resident.contains(&drill(0.8)));
    }

    #[test]
    fn test_sort_orders_by_kind_then_diameter() {
        let mut rack = Rack::manual();
        rack.add_bit(router(1.0), None, false).unwrap();
        rack.add_bit(drill(2.0), None, false).unwrap();
        rack.add_bit(drill(0.5), None, false).unwrap();

        rack.sort();
        assert_eq!(rack.tool_at(1).unwrap().diameter, mm(0.5));
        assert_eq!(rack.tool_at(2).unwrap().diameter, mm(2.0));
        assert_eq!(rack.tool_at(3).unwrap().kind, ToolKind::Router);
    }

    #[test]
    fn test_sort_skips_unusable_slots() {
        let mut rack = Rack::new(4);
        rack.mark_unusable(1);
        rack.add_bit(drill(0.8), None, false).unwrap();
        rack.add_bit(drill(0.5), None, false).unwrap();

        rack.sort();
        assert!(rack.tool_at(1).is_none());
        assert_eq!(rack.tool_at(2).unwrap().diameter, mm(0.5));
        assert_eq!(rack.tool_at(3).unwrap().diameter, mm(0.8));
    }

    #[test]
    fn test_manager_honors_explicit_slots() {
        let mut settings = Settings::default();
        settings.rack.size = 6;
        settings.rack.tools = vec![
            boardmill_settings::RackToolEntry {
                slot: Some(3),
                drill: Some(mm(0.8)),
                ..Default::default()
            },
            boardmill_settings::RackToolEntry {
                drill: Some(mm(1.0)),
                ..Default::default()
            },
        ];

        let rack = RackManager::from_settings(&settings).rack();
        assert_eq!(rack.tool_at(3).unwrap().diameter, mm(0.8));
        // The next entry follows the previous slot.
        assert_eq!(rack.tool_at(4).unwrap().diameter, mm(1.0));
    }

    #[test]
    fn test_manager_bad_definition_falls_back_to_manual() {
        let mut settings = Settings::default();
        settings.rack.size = 2;
        settings.rack.tools = vec![boardmill_settings::RackToolEntry {
            slot: Some(9),
            drill: Some(mm(0.8)),
            ..Default::default()
        }];

        let rack = RackManager::from_settings(&settings).rack();
        assert!(rack.is_manual());
    }
}
