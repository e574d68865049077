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

use spool_core::{AssetId, LoadError};

/// A cached handle and the bookkeeping that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<H> {
    /// The asset's id.
    pub id: AssetId,
    /// The loaded handle.
    pub handle: H,
    /// The insertion sequence number. Later insertions have larger numbers.
    pub loaded_at: u64,
}

/// What the cache knows about an id.
#[derive(Debug, Clone)]
pub enum AssetStatus<H> {
    /// Never requested, or released since.
    Absent,
    /// A batch is fetching it right now.
    Loading,
    /// Loaded and cached.
    Ready(H),
    /// The last load attempt failed. A later batch will try again.
    Failed(LoadError),
}

impl<H> AssetStatus<H> {
    /// Returns `true` if a handle is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetStatus::Ready(_))
    }

    /// Returns `true` if the last attempt failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, AssetStatus::Failed(_))
    }

    /// The handle, if one is available.
    pub fn handle(self) -> Option<H> {
        match self {
            AssetStatus::Ready(handle) => Some(handle),
            _ => None,
        }
    }
}
