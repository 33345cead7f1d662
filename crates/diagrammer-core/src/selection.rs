//! Selection and hover state with synchronous change notifications.

use crate::model::{DiagramModel, ElementId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Snapshot handed to selection listeners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    pub selected: HashSet<ElementId>,
    pub hovered: Option<ElementId>,
    /// Most recently added id, used as the primary element for property panels.
    pub last_selected: Option<ElementId>,
}

impl SelectionState {
    /// Selected ids in sorted order.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }
}

pub type SelectionListener = Box<dyn FnMut(&SelectionState)>;

/// Manages selected and hovered elements.
///
/// Listeners run synchronously after each change, one call per change.
#[derive(Default)]
pub struct SelectionManager {
    state: SelectionState,
    listeners: Vec<SelectionListener>,
}

impl fmt::Debug for SelectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionManager")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> &HashSet<ElementId> {
        &self.state.selected
    }

    pub fn hovered(&self) -> Option<&str> {
        self.state.hovered.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state.selected.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.state.selected_ids()
    }

    /// Register a change listener.
    pub fn on_change(&mut self, listener: impl FnMut(&SelectionState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        let state = &self.state;
        for listener in &mut self.listeners {
            listener(state);
        }
    }

    /// Select an element. Additive selection toggles membership; otherwise
    /// the selection is replaced. Returns true if anything changed.
    pub fn select(&mut self, id: &str, additive: bool) -> bool {
        if additive {
            if !self.state.selected.remove(id) {
                self.state.selected.insert(id.to_string());
                self.state.last_selected = Some(id.to_string());
            } else if self.state.last_selected.as_deref() == Some(id) {
                self.state.last_selected = None;
            }
        } else {
            if self.state.selected.len() == 1 && self.state.selected.contains(id) {
                return false;
            }
            self.state.selected.clear();
            self.state.selected.insert(id.to_string());
            self.state.last_selected = Some(id.to_string());
        }
        self.notify();
        true
    }

    /// Select several elements at once, with a single notification.
    pub fn select_multiple<I, S>(&mut self, ids: I, additive: bool) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<ElementId>,
    {
        let before = self.state.selected.clone();
        if !additive {
            self.state.selected.clear();
            self.state.last_selected = None;
        }
        for id in ids {
            let id = id.into();
            self.state.last_selected = Some(id.clone());
            self.state.selected.insert(id);
        }
        let changed = self.state.selected != before;
        if changed {
            self.notify();
        }
        changed
    }

    /// Select every element in the model.
    pub fn select_all(&mut self, model: &DiagramModel) -> bool {
        self.select_multiple(model.ids().cloned(), false)
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        if !self.state.selected.remove(id) {
            return false;
        }
        if self.state.last_selected.as_deref() == Some(id) {
            self.state.last_selected = None;
        }
        self.notify();
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.state.selected.is_empty() {
            return false;
        }
        self.state.selected.clear();
        self.state.last_selected = None;
        self.notify();
        true
    }

    /// Update the hovered element. No-op (and no notification) when unchanged.
    pub fn set_hover(&mut self, id: Option<&str>) -> bool {
        if self.state.hovered.as_deref() == id {
            return false;
        }
        self.state.hovered = id.map(str::to_string);
        self.notify();
        true
    }

    /// Drop ids that no longer exist in the model.
    pub fn retain_existing(&mut self, model: &DiagramModel) -> bool {
        let before = self.state.selected.len();
        self.state.selected.retain(|id| model.contains(id));
        let mut changed = self.state.selected.len() != before;
        if let Some(hovered) = &self.state.hovered {
            if !model.contains(hovered) {
                self.state.hovered = None;
                changed = true;
            }
        }
        if let Some(last) = &self.state.last_selected {
            if !self.state.selected.contains(last) {
                self.state.last_selected = None;
            }
        }
        if changed {
            self.notify();
        }
        changed
    }

    /// Clear selection and hover together.
    pub fn reset(&mut self) {
        if self.state == SelectionState::default() {
            return;
        }
        self.state = SelectionState::default();
        self.notify();
    }
}
