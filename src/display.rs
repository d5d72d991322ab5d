//! Text display of the last dispatched action
//!
//! Three slots: action name, priority, group. Writes are no-ops while the
//! display is disabled.

use crate::api::ActionRecord;

/// Text shown after a failed fetch
const ERROR_TEXT: &str = "ERR";

/// Slot indices
const NAME: usize = 0;
const PRIORITY: usize = 1;
const GROUP: usize = 2;

/// Three text slots describing the current action
#[derive(Debug, Clone, Default)]
pub struct DisplayPanel {
    enabled: bool,
    slots: [String; 3],
}

impl DisplayPanel {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: Default::default(),
        }
    }

    /// Show an action's name, priority and group
    pub fn update(&mut self, record: &ActionRecord) {
        if !self.enabled {
            return;
        }

        self.slots[NAME].clone_from(&record.action_name);
        self.slots[PRIORITY] = format!("P{}", record.priority);
        self.slots[GROUP] = format!("Group {}", record.group_id);
        tracing::debug!(slots = ?self.slots, "display updated");
    }

    /// Blank every slot
    pub fn clear(&mut self) {
        if !self.enabled {
            return;
        }

        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Mark every slot as failed
    pub fn show_error(&mut self) {
        if !self.enabled {
            return;
        }

        for slot in &mut self.slots {
            ERROR_TEXT.clone_into(slot);
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn slots(&self) -> &[String; 3] {
        &self.slots
    }
}
