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

//! Events emitted while assets load.
//!
//! The loader publishes a [`PreloadEvent`] whenever an asset settles and
//! whenever the batch progress changes. Consumers that want push-style
//! notifications (a progress bar, a log sink) subscribe through the
//! [`EventBus`] owned by the group coordinator.

mod bus;

pub use self::bus::EventBus;

use crate::{
    asset::AssetId,
    error::LoadError,
    progress::{LoadProgress, LoadReport},
};

/// Something observable that happened while loading.
#[derive(Debug, Clone)]
pub enum PreloadEvent {
    /// An asset was fetched, decoded, and cached.
    AssetLoaded {
        /// The asset's id.
        id: AssetId,
    },
    /// An asset failed to load and was recorded as failed.
    AssetFailed {
        /// The asset's id.
        id: AssetId,
        /// Why it failed.
        error: LoadError,
    },
    /// A batch's progress changed.
    Progress(LoadProgress),
    /// Every asset of a group settled.
    GroupSettled {
        /// The group's name.
        group: String,
        /// The batch summary.
        report: LoadReport,
    },
}
