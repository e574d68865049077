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

//! # Spool Data
//!
//! The storage layer of the preloader: the [`AssetCache`] that owns every
//! loaded handle, and the in-flight table that keeps overlapping batches from
//! fetching the same asset twice.

#![warn(missing_docs)]

pub mod cache;

pub use cache::{AssetCache, AssetStatus, CacheEntry, Claim, FlightGuard, FlightOutcome, FlightWaiter, Lookup};
