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

use super::AssetId;
use crate::error::DecodeError;

/// The raw payload returned by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// The fetched bytes.
    pub bytes: Vec<u8>,
    /// The content type reported by the transport, when it knows one.
    pub content_type: Option<String>,
}

impl FetchedAsset {
    /// Creates a payload from its bytes and optional content type.
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }
}

/// Turns fetched bytes into a loaded-resource handle, and frees it again.
///
/// Handles are opaque to the preloader. They may be object URLs, decoded
/// images, GPU textures... The only requirement is that every handle produced
/// by [`create_handle`](HandleFactory::create_handle) is eventually passed to
/// [`release_handle`](HandleFactory::release_handle) exactly once. The cache
/// guarantees this for every handle it stores.
pub trait HandleFactory: Send + Sync + 'static {
    /// The handle type handed out to consumers. Cloning must be cheap.
    type Handle: Clone + Send + Sync + 'static;

    /// Creates a handle from a fetched payload.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] if the bytes cannot be turned into a usable
    /// resource. The loader records the failure and continues with the batch.
    fn create_handle(&self, id: &AssetId, asset: FetchedAsset)
        -> Result<Self::Handle, DecodeError>;

    /// Frees the resource behind a handle.
    fn release_handle(&self, handle: Self::Handle);
}
