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

use super::{content_type_for, strip_query};
use async_trait::async_trait;
use spool_core::{FetchError, FetchedAsset, Transport};
use std::{
    io,
    path::{Component, Path, PathBuf},
};

/// Reads assets from a directory.
///
/// Locators are resolved relative to the root, so `/ko/rsp/f0.png` and
/// `ko/rsp/f0.png` name the same file. Query strings and fragments are
/// ignored, and locators that would leave the root are refused.
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    /// Creates a transport serving files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory locators are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a locator to a path under the root.
    pub fn resolve(&self, locator: &str) -> io::Result<PathBuf> {
        let relative = Path::new(strip_query(locator).trim_start_matches('/'));
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "locator escapes the asset root",
                    ))
                }
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl Transport for FsTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError> {
        let io_error = |source| FetchError::Io {
            locator: locator.to_owned(),
            source,
        };

        let path = self.resolve(locator).map_err(io_error)?;
        log::trace!("Reading '{}'", path.display());
        let bytes = tokio::fs::read(&path).await.map_err(io_error)?;

        Ok(FetchedAsset::new(
            bytes,
            content_type_for(locator).map(str::to_owned),
        ))
    }
}
