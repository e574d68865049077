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

//! Progress snapshots and batch summaries.

/// A snapshot of one batch's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    /// Assets settled so far (loaded, failed, or already cached).
    pub completed: usize,
    /// Assets in the batch.
    pub total: usize,
}

impl LoadProgress {
    /// Creates a snapshot. `completed` is clamped to `total`.
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed: completed.min(total),
            total,
        }
    }

    /// A finished snapshot of an empty batch.
    pub fn done() -> Self {
        Self::new(0, 0)
    }

    /// The completion ratio as a percentage in `[0, 100]`.
    ///
    /// An empty batch is complete.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f32 / self.total as f32 * 100.0).clamp(0.0, 100.0)
        }
    }

    /// Returns `true` once every asset has settled.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// The summary returned by every batch.
///
/// A batch never fails as a whole; callers that need to know whether every
/// asset made it compare [`ready`](Self::ready) against
/// [`requested`](Self::requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Distinct ids in the batch.
    pub requested: usize,
    /// Ids already cached when the batch looked at them.
    pub cache_hits: usize,
    /// Ids fetched and cached by this batch.
    pub loaded: usize,
    /// Ids whose fetch or decode failed in this batch.
    pub failed: usize,
    /// Ids fetched by an overlapping batch that this one waited on and found cached.
    pub joined: usize,
    /// Ids left unsettled because the batch was cancelled, or whose owning batch was.
    pub cancelled: usize,
}

impl LoadReport {
    /// Ids that are cached once the batch returned.
    pub fn ready(&self) -> usize {
        self.cache_hits + self.loaded + self.joined
    }

    /// Returns `true` if every requested id is cached.
    pub fn is_complete(&self) -> bool {
        self.ready() == self.requested
    }
}
