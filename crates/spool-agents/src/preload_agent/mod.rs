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

//! Acts as the **[A]gent** for asset preloading.
//!
//! The agent is the consumer-facing side of the preloader: it answers
//! `get_image` reads straight from the cache and turns `preload_group`
//! requests into batches for the [`PreloadLane`](spool_lanes::PreloadLane).
//! Each group moves through `NotRequested -> Loading -> Loaded` once; callers
//! that ask for a group while it is loading wait for the running load instead
//! of starting another one.

mod agent;
mod group;
mod task;

pub use self::agent::PreloadAgent;
pub use self::group::GroupState;
