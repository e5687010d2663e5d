//! Ordered, numbered list of tabs with an optional gap mode.
//!
//! A tab's number is its index. Index 0 is permanent and never a gap. With
//! gap mode on, closing or moving a tab leaves a [`GapTab`] behind so other
//! tabs keep their numbers; without it, the list stays dense and numbers
//! shift. Trailing gaps are always trimmed.
//!
//! The list owns the focus cursor. Structural changes keep focus on the
//! same tab (tracked by [`TabId`]) even when its index changes.

use crate::model::error::InvalidMove;
use crate::tabs::{FocusState, GapTab, Tab};
use std::collections::BTreeMap;
use tracing::debug;

#[cfg(test)]
#[path = "tab_list_tests.rs"]
mod tests;

/// Stable identity of a slot across renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

/// Direction of a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher numbers, wrapping to 0.
    Next,
    /// Towards lower numbers, wrapping to the last tab.
    Previous,
}

struct Slot {
    id: TabId,
    tab: Box<dyn Tab>,
}

/// Ordered tabs where a tab's index is its number.
pub struct TabSlotList {
    slots: Vec<Slot>,
    current: usize,
    previous: usize,
    gap_mode: bool,
    next_id: u64,
}

impl std::fmt::Debug for TabSlotList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .slots
            .iter()
            .map(|s| if s.tab.is_placeholder() { "<gap>" } else { s.tab.name() })
            .collect();
        f.debug_struct("TabSlotList")
            .field("tabs", &names)
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("gap_mode", &self.gap_mode)
            .finish()
    }
}

impl TabSlotList {
    /// Create a list holding only the permanent tab `first`, focused.
    pub fn new(first: Box<dyn Tab>, gap_mode: bool) -> Self {
        let mut list = Self {
            slots: Vec::new(),
            current: 0,
            previous: 0,
            gap_mode,
            next_id: 0,
        };
        let slot = list.slot(first);
        list.slots.push(slot);
        list.renumber();
        list.slots[0].tab.on_gain_focus();
        list
    }

    /// Number of slots, gaps included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Never true: index 0 always exists.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether closing a tab leaves a gap.
    pub fn gap_mode(&self) -> bool {
        self.gap_mode
    }

    /// Switch gap mode. Turning it off drops every gap and renumbers.
    pub fn set_gap_mode(&mut self, gap_mode: bool) {
        self.gap_mode = gap_mode;
        if gap_mode {
            return;
        }
        let (current, previous) = self.focus_ids();
        self.slots.retain(|s| !s.tab.is_placeholder());
        self.restore_focus(current, previous);
    }

    /// Index of the focused tab.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Index of the tab focused before the current one.
    pub fn previous_index(&self) -> usize {
        self.previous
    }

    /// The focused tab.
    pub fn current(&self) -> &dyn Tab {
        self.slots[self.current].tab.as_ref()
    }

    /// The focused tab, mutably.
    pub fn current_mut(&mut self) -> &mut dyn Tab {
        self.slots[self.current].tab.as_mut()
    }

    /// Tab at `index`, gaps included.
    pub fn get(&self, index: usize) -> Option<&dyn Tab> {
        self.slots.get(index).map(|s| s.tab.as_ref())
    }

    /// Tab at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut dyn Tab> {
        match self.slots.get_mut(index) {
            Some(slot) => Some(slot.tab.as_mut()),
            None => None,
        }
    }

    /// Identity of the slot at `index`.
    pub fn id_at(&self, index: usize) -> Option<TabId> {
        self.slots.get(index).map(|s| s.id)
    }

    /// Current index of the slot `id`.
    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Tabs in number order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Tab> {
        self.slots.iter().map(|s| s.tab.as_ref())
    }

    /// Tabs in number order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Tab>> {
        self.slots.iter_mut().map(|s| &mut s.tab)
    }

    /// Index of the first non-gap tab whose name is exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| !s.tab.is_placeholder() && s.tab.name() == name)
    }

    /// Best tab for a partial `name`: the lowest match rank wins, then the
    /// lowest index.
    pub fn find_matching(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.tab
                    .matching_names()
                    .into_iter()
                    .filter(|(_, candidate)| candidate.to_lowercase().contains(&needle))
                    .map(|(rank, _)| rank)
                    .min()
                    .map(|rank| (rank, i))
            })
            .min()
            .map(|(_, i)| i)
    }

    /// Append a tab at the end (after any gap). Focuses it if `focus`.
    pub fn push(&mut self, tab: Box<dyn Tab>, focus: bool) -> usize {
        let slot = self.slot(tab);
        self.slots.push(slot);
        let index = self.slots.len() - 1;
        self.slots[index].tab.set_number(index);
        debug!(index, name = self.slots[index].tab.name(), "Tab added");
        if focus {
            // a fresh non-gap index is always focusable
            let _ = self.focus(index);
        }
        index
    }

    /// Move focus to `index`, remembering the previous tab.
    ///
    /// Returns `Ok(false)` when `index` is already current.
    pub fn focus(&mut self, index: usize) -> Result<bool, InvalidMove> {
        self.check_real(index)?;
        if index == self.current {
            return Ok(false);
        }
        self.slots[self.current].tab.on_lose_focus();
        self.previous = self.current;
        self.current = index;
        self.slots[index].tab.on_gain_focus();
        Ok(true)
    }

    /// Jump back to the previously focused tab.
    pub fn focus_previous(&mut self) -> Result<bool, InvalidMove> {
        self.focus(self.previous)
    }

    /// Move focus to the next (or previous) non-gap tab, wrapping around.
    ///
    /// Does nothing and returns `false` when there is no tab besides 0.
    pub fn rotate(&mut self, direction: Direction) -> bool {
        let real = self.slots.iter().filter(|s| !s.tab.is_placeholder()).count();
        if real <= 1 {
            return false;
        }
        let len = self.slots.len();
        let mut index = self.current;
        loop {
            index = match direction {
                Direction::Next => (index + 1) % len,
                Direction::Previous => (index + len - 1) % len,
            };
            if !self.slots[index].tab.is_placeholder() {
                break;
            }
        }
        self.slots[self.current].tab.on_lose_focus();
        self.current = index;
        self.slots[index].tab.on_gain_focus();
        true
    }

    /// Move the tab at `old` so it sits at `new`.
    ///
    /// Both indices must be in `1..len`, `old` must not be a gap and must
    /// differ from `new`. On error nothing changes.
    ///
    /// Without gaps this is a plain list move: tabs in between shift by one.
    /// With gaps, moving onto a gap swaps with it; moving onto a tab leaves a
    /// gap at `old` and absorbs the first gap after `new`, so tabs further
    /// right keep their numbers where possible.
    pub fn insert_at(&mut self, old: usize, new: usize) -> Result<(), InvalidMove> {
        let len = self.slots.len();
        if old == 0 || new == 0 {
            return Err(InvalidMove::PermanentTab);
        }
        for index in [old, new] {
            if index >= len {
                return Err(InvalidMove::OutOfRange { index, len });
            }
        }
        if old == new {
            return Err(InvalidMove::NoOp);
        }
        if self.slots[old].tab.is_placeholder() {
            return Err(InvalidMove::Placeholder(old));
        }

        let (current, previous) = self.focus_ids();
        if !self.gap_mode {
            let moved = self.slots.remove(old);
            self.slots.insert(new, moved);
        } else if self.slots[new].tab.is_placeholder() {
            self.slots.swap(old, new);
        } else {
            let gap = self.gap_slot();
            let moved = std::mem::replace(&mut self.slots[old], gap);
            self.slots.insert(new, moved);
            if let Some(offset) = self.slots[new + 1..]
                .iter()
                .position(|s| s.tab.is_placeholder())
            {
                self.slots.remove(new + 1 + offset);
            }
        }
        self.trim_trailing_gaps();
        debug!(old, new, gap_mode = self.gap_mode, "Tab moved");
        self.restore_focus(current, previous);
        Ok(())
    }

    /// Close the tab at `index` and hand it back.
    ///
    /// In gap mode a gap takes its place unless it was last. If it was
    /// focused, focus goes to the nearest non-gap tab at or below its index.
    pub fn close(&mut self, index: usize) -> Result<Box<dyn Tab>, InvalidMove> {
        if index == 0 {
            return Err(InvalidMove::PermanentTab);
        }
        self.check_real(index)?;

        let was_current = index == self.current;
        let (current, previous) = self.focus_ids();
        self.slots[index].tab.on_close();

        let removed = if self.gap_mode && index + 1 < self.slots.len() {
            let gap = self.gap_slot();
            std::mem::replace(&mut self.slots[index], gap)
        } else {
            let removed = self.slots.remove(index);
            self.trim_trailing_gaps();
            removed
        };
        debug!(index, name = removed.tab.name(), "Tab closed");

        self.renumber();
        if was_current {
            let mut target = index.min(self.slots.len() - 1);
            while self.slots[target].tab.is_placeholder() {
                target -= 1;
            }
            self.current = target;
            self.previous = previous
                .and_then(|id| self.index_of(id))
                .unwrap_or(0);
        } else {
            self.restore_focus(current, previous);
        }
        self.slots[self.current].tab.on_gain_focus();
        Ok(removed.tab)
    }

    /// Index of the tab most in need of attention.
    ///
    /// Picks the highest-priority attention state present; among tabs in
    /// that state, the first one after the current index, wrapping to the
    /// first one overall.
    pub fn important_tab(&self) -> Option<usize> {
        let mut buckets: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.tab.is_placeholder() {
                continue;
            }
            let priority = slot.tab.focus_state().priority();
            if priority >= 0 {
                buckets.entry(priority).or_default().push(index);
            }
        }
        let (_, best) = buckets.into_iter().next_back()?;
        best.iter()
            .copied()
            .find(|&i| i > self.current)
            .or_else(|| best.first().copied())
    }

    /// Raise the attention state of the tab at `index`, unless focused.
    pub fn notify(&mut self, index: usize, state: FocusState) {
        if index == self.current {
            return;
        }
        if let Some(slot) = self.slots.get_mut(index) {
            let upgraded = slot.tab.focus_state().upgrade(state);
            slot.tab.set_focus_state(upgraded);
        }
    }

    fn slot(&mut self, tab: Box<dyn Tab>) -> Slot {
        let id = TabId(self.next_id);
        self.next_id += 1;
        Slot { id, tab }
    }

    fn gap_slot(&mut self) -> Slot {
        self.slot(Box::new(GapTab::new()))
    }

    fn check_real(&self, index: usize) -> Result<(), InvalidMove> {
        let len = self.slots.len();
        match self.slots.get(index) {
            None => Err(InvalidMove::OutOfRange { index, len }),
            Some(slot) if slot.tab.is_placeholder() => Err(InvalidMove::Placeholder(index)),
            Some(_) => Ok(()),
        }
    }

    fn trim_trailing_gaps(&mut self) {
        while self.slots.len() > 1
            && self
                .slots
                .last()
                .is_some_and(|s| s.tab.is_placeholder())
        {
            self.slots.pop();
        }
    }

    fn renumber(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.tab.set_number(index);
        }
    }

    fn focus_ids(&self) -> (Option<TabId>, Option<TabId>) {
        (self.id_at(self.current), self.id_at(self.previous))
    }

    fn restore_focus(&mut self, current: Option<TabId>, previous: Option<TabId>) {
        self.renumber();
        self.current = current.and_then(|id| self.index_of(id)).unwrap_or(0);
        self.previous = previous.and_then(|id| self.index_of(id)).unwrap_or(0);
    }
}
