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

//! Provides the primitive types that describe a loadable asset.
//!
//! This module is the "common language" of the preloader: every other crate
//! talks about assets through the types defined here.
//!
//! The key components are:
//! - [`AssetDescriptor`]: the immutable declaration of one asset (id, source, priority).
//! - [`FrameSequence`]: an enumerable run of animation frames expanded into descriptors.
//! - [`HandleFactory`]: the abstract pair that turns fetched bytes into a releasable handle.
//! - [`VariantPolicy`]: host-declared format and size preferences applied to locators.

mod descriptor;
mod handle;
mod sequence;
mod variant;

pub use descriptor::*;
pub use handle::*;
pub use sequence::*;
pub use variant::*;
