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

//! # Spool Agents
//!
//! The control plane of the preloader. The [`PreloadAgent`] turns group names
//! into batches for the preload lane, remembers which groups are loaded, runs
//! the startup and background loads as tracked tasks, and releases every
//! handle on disposal.

#![warn(missing_docs)]

pub mod preload_agent;

pub use preload_agent::{GroupState, PreloadAgent};
