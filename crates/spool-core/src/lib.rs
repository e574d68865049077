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

//! # Spool Core
//!
//! Foundational crate containing the descriptors, registries, contracts, and
//! error taxonomy shared by every layer of the asset preloader.
//!
//! Nothing in here performs I/O. Concrete transports and handle factories live
//! in `spool-infra`, the cache in `spool-data`, the scheduler in `spool-lanes`
//! and the group coordinator in `spool-agents`.

#![warn(missing_docs)]

pub mod asset;
pub mod cancel;
pub mod config;
pub mod error;
pub mod event;
pub mod progress;
pub mod registry;
pub mod telemetry;
pub mod transport;

pub use asset::{AssetDescriptor, AssetId, FetchedAsset, HandleFactory, Priority};
pub use cancel::CancellationToken;
pub use config::{ConfigError, PreloadConfig};
pub use error::{DecodeError, FetchError, GroupError, LoadError};
pub use event::{EventBus, PreloadEvent};
pub use progress::{LoadProgress, LoadReport};
pub use registry::{AssetGroup, AssetRegistry, RegistryError};
pub use transport::Transport;
