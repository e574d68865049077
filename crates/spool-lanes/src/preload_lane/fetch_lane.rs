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

use spool_core::{
    asset::VariantPolicy, AssetDescriptor, FetchError, FetchedAsset, PreloadConfig, Transport,
};
use std::time::Duration;

/// A lane that fetches the bytes behind a descriptor.
///
/// The locator is rewritten by the [`VariantPolicy`] right before the
/// transport call, and the call is abandoned (its future dropped) once the
/// timeout expires.
#[derive(Debug)]
pub struct FetchLane<T: Transport> {
    transport: T,
    timeout: Duration,
    variants: VariantPolicy,
}

impl<T: Transport> FetchLane<T> {
    /// Creates a lane with the given per-fetch timeout and no variant rewriting.
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            variants: VariantPolicy::default(),
        }
    }

    /// Creates a lane configured from a [`PreloadConfig`].
    pub fn from_config(transport: T, config: &PreloadConfig) -> Self {
        Self::new(transport, config.fetch_timeout()).with_variants(config.variants)
    }

    /// Sets the variant policy.
    pub fn with_variants(mut self, variants: VariantPolicy) -> Self {
        self.variants = variants;
        self
    }

    /// The transport used by this lane.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The per-fetch timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The locator actually requested for a descriptor.
    pub fn resolve_locator(&self, descriptor: &AssetDescriptor) -> String {
        self.variants.resolve(&descriptor.source)
    }

    /// Fetches a descriptor's bytes.
    ///
    /// # Errors
    /// Returns the transport's [`FetchError`], or [`FetchError::Timeout`] if
    /// the transport did not answer in time.
    pub async fn fetch(&self, descriptor: &AssetDescriptor) -> Result<FetchedAsset, FetchError> {
        let locator = self.resolve_locator(descriptor);
        log::debug!("Fetching '{}' from '{}'", descriptor.id, locator);

        match tokio::time::timeout(self.timeout, self.transport.fetch_bytes(&locator)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                locator,
                after: self.timeout,
            }),
        }
    }
}
