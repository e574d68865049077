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

use spool_core::{AssetId, DecodeError, FetchedAsset, HandleFactory};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use uuid::Uuid;

/// A URL naming bytes held by an [`ObjectUrlStore`], e.g. `blob:spool/1b4e...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(Arc<str>);

impl ObjectUrl {
    /// The URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The bytes behind an object URL.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// The asset the bytes were fetched for.
    pub id: AssetId,
    /// The payload.
    pub bytes: Arc<[u8]>,
    /// The payload's content type.
    pub content_type: String,
}

/// Keeps fetched images in memory and names each one with an object URL.
///
/// Creating a handle registers the bytes; releasing it revokes the URL and
/// frees them. Renderers resolve URLs back to bytes with
/// [`resolve`](Self::resolve).
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    blobs: RwLock<HashMap<ObjectUrl, StoredBlob>>,
}

impl ObjectUrlStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes behind a URL, unless it was revoked.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<StoredBlob> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Revokes a URL. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .is_some()
    }

    /// The number of URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// The total size of the stored payloads, in bytes.
    pub fn stored_bytes(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|blob| blob.bytes.len())
            .sum()
    }
}

/// Works out the content type of a payload.
///
/// A declared `image/*` type is trusted. Anything else (no type, or a generic
/// one such as `application/octet-stream`) is replaced by the type sniffed
/// from the payload's magic bytes, and rejected only if sniffing fails too.
fn image_content_type(asset: &FetchedAsset) -> Result<String, DecodeError> {
    if let Some(declared) = &asset.content_type {
        if declared.starts_with("image/") {
            return Ok(declared.clone());
        }
    }

    sniff(&asset.bytes).ok_or_else(|| {
        DecodeError::UnsupportedContentType(
            asset
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_owned()),
        )
    })
}

#[cfg(feature = "decode")]
fn sniff(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_owned())
}

#[cfg(not(feature = "decode"))]
fn sniff(_bytes: &[u8]) -> Option<String> {
    None
}

impl HandleFactory for ObjectUrlStore {
    type Handle = ObjectUrl;

    fn create_handle(&self, id: &AssetId, asset: FetchedAsset) -> Result<ObjectUrl, DecodeError> {
        if asset.bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let content_type = image_content_type(&asset)?;

        let url = ObjectUrl(format!("blob:spool/{}", Uuid::new_v4()).into());
        let blob = StoredBlob {
            id: id.clone(),
            bytes: asset.bytes.into(),
            content_type,
        };
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), blob);
        log::trace!("Created {url} for '{id}'");
        Ok(url)
    }

    fn release_handle(&self, handle: ObjectUrl) {
        if !self.revoke(&handle) {
            log::warn!("Object URL {handle} was already revoked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(bytes: &[u8]) -> FetchedAsset {
        FetchedAsset::new(bytes.to_vec(), Some("image/png".into()))
    }

    #[test]
    fn handles_resolve_until_released() {
        let store = ObjectUrlStore::new();
        let url = store.create_handle(&"f0".into(), png(b"frame")).unwrap();

        assert!(url.as_str().starts_with("blob:spool/"));
        let blob = store.resolve(&url).unwrap();
        assert_eq!(&*blob.bytes, b"frame");
        assert_eq!(blob.id.as_str(), "f0");
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.stored_bytes(), 5);

        store.release_handle(url.clone());
        assert!(store.resolve(&url).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn every_handle_is_distinct() {
        let store = ObjectUrlStore::new();
        let first = store.create_handle(&"f0".into(), png(b"a")).unwrap();
        let second = store.create_handle(&"f0".into(), png(b"a")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let store = ObjectUrlStore::new();
        assert_eq!(
            store.create_handle(&"f0".into(), png(b"")),
            Err(DecodeError::Empty)
        );
    }

    #[test]
    fn non_image_payload_is_rejected() {
        let store = ObjectUrlStore::new();
        let html = FetchedAsset::new(b"<html>".to_vec(), Some("text/html".into()));
        assert_eq!(
            store.create_handle(&"f0".into(), html),
            Err(DecodeError::UnsupportedContentType("text/html".into()))
        );
        assert_eq!(store.live_count(), 0);
    }

    #[cfg(feature = "decode")]
    #[test]
    fn generic_content_type_is_sniffed() {
        let store = ObjectUrlStore::new();
        let bytes = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let asset = FetchedAsset::new(bytes, Some("application/octet-stream".into()));

        let url = store.create_handle(&"f0".into(), asset).unwrap();

        assert_eq!(store.resolve(&url).unwrap().content_type, "image/png");
    }

    #[cfg(feature = "decode")]
    #[test]
    fn missing_content_type_is_sniffed() {
        let store = ObjectUrlStore::new();
        let bytes = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let url = store
            .create_handle(&"f0".into(), FetchedAsset::new(bytes, None))
            .unwrap();
        assert_eq!(store.resolve(&url).unwrap().content_type, "image/png");
    }
}
