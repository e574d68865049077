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

//! # Spool Infra
//!
//! Concrete implementations of the preloader's external contracts.
//!
//! - [`FsTransport`] reads assets from a directory with `tokio::fs`.
//! - [`HttpTransport`] fetches them over HTTP with `reqwest` (feature `http`).
//! - [`ObjectUrlStore`] hands out `blob:` style URLs backed by the fetched bytes.
//! - [`DecodedImageFactory`] decodes images to RGBA8 up front (feature `decode`).

#![warn(missing_docs)]

pub mod handle;
pub mod transport;

mod error;

pub use error::InfraError;
#[cfg(feature = "decode")]
pub use handle::{DecodedImage, DecodedImageFactory};
pub use handle::{ObjectUrl, ObjectUrlStore, StoredBlob};
pub use transport::FsTransport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
