// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use spool_core::LoadReport;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use tokio::sync::watch;

/// Where a group stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Never requested, or its load was cancelled.
    NotRequested,
    /// A load is running.
    Loading,
    /// A load settled. Some assets may have failed.
    Loaded,
}

#[derive(Debug)]
enum Entry {
    Loading(watch::Receiver<bool>),
    Loaded(LoadReport),
}

/// What a caller should do about a group.
pub(crate) enum Admission<'a> {
    /// Nobody is loading the group: the caller loads it.
    Load(PendingGroup<'a>),
    /// Another caller is loading it: wait on the receiver.
    Wait(watch::Receiver<bool>),
    /// The group is already loaded.
    Done,
}

/// The per-group state table.
#[derive(Debug)]
pub(crate) struct GroupTable {
    entries: Mutex<HashMap<String, Entry>>,
    changes: watch::Sender<()>,
}

impl Default for GroupTable {
    fn default() -> Self {
        let (changes, _) = watch::channel(());
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }
}

impl GroupTable {
    /// A receiver notified whenever a load settles or is rolled back.
    pub(crate) fn subscribe(&self) -> watch::Receiver<()> {
        self.changes.subscribe()
    }

    pub(crate) fn admit(&self, name: &str) -> Admission<'_> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(name) {
            Some(Entry::Loaded(_)) => Admission::Done,
            Some(Entry::Loading(receiver)) => Admission::Wait(receiver.clone()),
            None => {
                let (sender, receiver) = watch::channel(false);
                entries.insert(name.to_owned(), Entry::Loading(receiver));
                Admission::Load(PendingGroup {
                    table: self,
                    name: name.to_owned(),
                    sender,
                    settled: false,
                })
            }
        }
    }

    /// Forgets a loaded group so the next request loads it again.
    ///
    /// A loading group is left alone.
    pub(crate) fn forget_loaded(&self, name: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(entries.get(name), Some(Entry::Loaded(_))) {
            entries.remove(name);
            true
        } else {
            false
        }
    }

    pub(crate) fn state(&self, name: &str) -> GroupState {
        match self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            None => GroupState::NotRequested,
            Some(Entry::Loading(_)) => GroupState::Loading,
            Some(Entry::Loaded(_)) => GroupState::Loaded,
        }
    }

    pub(crate) fn report(&self, name: &str) -> Option<LoadReport> {
        match self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            Some(Entry::Loaded(report)) => Some(*report),
            _ => None,
        }
    }

    pub(crate) fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Loaded(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

/// The exclusive right to load one group.
///
/// Waiters are woken when it is settled or dropped. Dropping it unsettled
/// (the load was cancelled or its future dropped) returns the group to
/// [`GroupState::NotRequested`].
pub(crate) struct PendingGroup<'a> {
    table: &'a GroupTable,
    name: String,
    sender: watch::Sender<bool>,
    settled: bool,
}

impl PendingGroup<'_> {
    pub(crate) fn complete(mut self, report: LoadReport) {
        self.table
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.name.clone(), Entry::Loaded(report));
        self.settled = true;
        self.sender.send_replace(true);
        self.table.changes.send_replace(());
    }
}

impl Drop for PendingGroup<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.table
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.name);
            self.sender.send_replace(true);
            self.table.changes.send_replace(());
        }
    }
}
