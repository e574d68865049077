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

//! Defines the error taxonomy of the preloader.
//!
//! Per-asset errors ([`FetchError`], [`DecodeError`], wrapped in [`LoadError`])
//! never fail a batch: they are logged, counted as settled, and recorded in
//! the cache. [`GroupError`] is likewise swallowed by the group coordinator.

use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// A transport-level failure while fetching the bytes of an asset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote answered with a non-success status.
    #[error("'{locator}' answered with status {status}")]
    Status {
        /// The locator that was requested.
        locator: String,
        /// The status code received.
        status: u16,
    },
    /// The transport itself failed (connection refused, DNS...).
    #[error("transport failure for '{locator}': {message}")]
    Transport {
        /// The locator that was requested.
        locator: String,
        /// The transport's description of the failure.
        message: String,
    },
    /// The fetch did not settle within the configured timeout.
    #[error("fetching '{locator}' timed out after {after:?}")]
    Timeout {
        /// The locator that was requested.
        locator: String,
        /// The timeout that expired.
        after: Duration,
    },
    /// A local read failed.
    #[error("failed to read '{locator}'")]
    Io {
        /// The locator that was requested.
        locator: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A failure to turn fetched bytes into a usable resource handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload was empty.
    #[error("payload is empty")]
    Empty,
    /// The payload's content type cannot be turned into a handle.
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
    /// The payload claimed a supported type but could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// The per-asset outcome of a failed load.
///
/// Cloning is cheap: the fetch error is shared, so the same failure can be
/// recorded in the cache and reported to every caller waiting on the asset.
#[derive(Debug, Error, Clone)]
pub enum LoadError {
    /// The transport failed.
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Arc<FetchError>),
    /// The handle factory rejected the bytes.
    #[error("decode failed: {0}")]
    DecodeFailed(#[from] DecodeError),
}

impl From<FetchError> for LoadError {
    fn from(error: FetchError) -> Self {
        LoadError::FetchFailed(Arc::new(error))
    }
}

/// A failure while resolving a group by name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// No group with that name is declared in the registry.
    #[error("asset group '{0}' is not declared in the registry")]
    UnknownGroup(String),
}
