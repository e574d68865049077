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

use crate::{asset::FetchedAsset, error::FetchError};
use async_trait::async_trait;
use std::sync::Arc;

/// A capability that fetches the raw bytes behind a locator.
///
/// In a browser-like host this is an HTTP GET; elsewhere it may be a
/// filesystem read. A concrete implementation lives in `spool-infra`.
///
/// Cancellation is expressed by dropping the returned future: the loader
/// drops an in-flight fetch when its batch is cancelled or when the per-fetch
/// timeout expires, so implementations must release their resources on drop.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the bytes behind `locator`.
    ///
    /// # Errors
    /// Returns a [`FetchError`] for any network, status, or I/O failure.
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError> {
        (**self).fetch_bytes(locator).await
    }
}
