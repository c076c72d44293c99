//! Purpose: Listing/interaction layer over `PopService`.
//! Exports: `PopsView`, `LoadState`.
//! Role: Owns the local record list; loads, adds, and deletes in response to user actions.
//! Invariants: A load replaces the whole list, even with an empty result.
//! Invariants: Delete removes by position first; a failed remote delete triggers a refetch
//! that replaces the list only on success.
//! Invariants: Blank names never reach the service.
use super::service::PopService;
use crate::core::pop::Pop;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

pub struct PopsView {
    service: PopService,
    pops: Vec<Pop>,
    state: LoadState,
}

impl PopsView {
    pub fn new(service: PopService) -> Self {
        Self {
            service,
            pops: Vec::new(),
            state: LoadState::Unloaded,
        }
    }

    pub fn activate(&mut self) {
        self.refresh();
    }

    /// A failed fetch and an empty collection both leave the list empty.
    pub fn refresh(&mut self) {
        self.state = LoadState::Loading;
        self.pops = self.service.get_pops();
        self.state = LoadState::Loaded;
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    pub fn len(&self) -> usize {
        self.pops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pops.is_empty()
    }

    pub fn service(&self) -> &PopService {
        &self.service
    }

    /// Creates the record remotely and appends the server's copy.
    ///
    /// Returns `None` without a request when the trimmed name is empty, and `None`
    /// with the list unchanged when the create fails.
    pub fn add(&mut self, pop: Pop) -> Option<&Pop> {
        if pop.has_blank_name() {
            return None;
        }
        let draft = Pop {
            name: pop.name.trim().to_string(),
            ..pop
        };
        let created = self.service.add_pop(&draft)?;
        self.pops.push(created);
        self.pops.last()
    }

    /// Removes the entry at `position`, then deletes it remotely.
    ///
    /// A failed remote delete reconciles with the server's list. The list is only
    /// replaced when that refetch succeeds; otherwise the local list stands.
    pub fn delete(&mut self, position: usize) -> Option<Pop> {
        if position >= self.pops.len() {
            return None;
        }
        let removed = self.pops.remove(position);
        let Some(id) = removed.id else {
            return Some(removed);
        };
        if self.service.delete_pop(id).is_some() {
            return Some(removed);
        }
        tracing::info!(target: "popcol::view", id, "delete failed; refetching list");
        self.state = LoadState::Loading;
        if let Some(pops) = self.service.fetch_pops() {
            self.pops = pops;
        }
        self.state = LoadState::Loaded;
        Some(removed)
    }
}
