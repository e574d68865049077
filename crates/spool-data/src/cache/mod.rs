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

//! The asset cache.
//!
//! [`AssetCache`] maps asset ids to loaded handles and releases every handle
//! it drops through the owning [`HandleFactory`](spool_core::HandleFactory).
//! Besides plain `get`/`insert`, the cache arbitrates ownership of loads: a
//! batch that wants to fetch an id first [`claim`](AssetCache::claim)s it,
//! and concurrent claimants of the same id are told to wait on the owner
//! instead of fetching it again.

mod entry;
mod flight;
mod storage;

pub use self::entry::{AssetStatus, CacheEntry};
pub use self::flight::{Claim, FlightGuard, FlightOutcome, FlightWaiter, Lookup};
pub use self::storage::AssetCache;
