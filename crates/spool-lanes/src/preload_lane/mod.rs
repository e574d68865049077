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

//! Lanes that load batches of assets into the cache.
//!
//! A batch goes through three steps:
//!
//! 1. **Plan**: ids are deduplicated, cache hits are settled straight away,
//!    and ids another batch is already loading are set aside to be awaited.
//! 2. **Fetch**: the remaining descriptors are stably sorted by priority and
//!    cut into chunks of `concurrency_limit`. Chunks run one after the
//!    other; the loads of a chunk run together and the chunk ends once all of
//!    them settled.
//! 3. **Join**: the ids set aside in step 1 are awaited.
//!
//! Per-asset failures are recorded and reported, never propagated: every
//! batch returns a [`LoadReport`](spool_core::LoadReport).

mod fetch_lane;
mod metrics;
mod preload_lane;
mod progress;
mod schedule;

pub use self::fetch_lane::FetchLane;
pub use self::metrics::LoaderMetrics;
pub use self::preload_lane::PreloadLane;
pub use self::progress::{BatchObserver, ProgressTracker};
pub use self::schedule::{dedupe, priority_order};
