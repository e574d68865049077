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

//! # Spool Lanes
//!
//! The data plane of the preloader. A [`FetchLane`] turns a descriptor into
//! bytes (variant resolution, transport call, timeout); a [`PreloadLane`]
//! drives whole batches through it with bounded concurrency, priority order,
//! progress reporting, and cancellation.

#![warn(missing_docs)]

pub mod preload_lane;

pub use preload_lane::{BatchObserver, FetchLane, LoaderMetrics, PreloadLane, ProgressTracker};
