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
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// An image decoded to tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// The asset the image was fetched for.
    pub id: AssetId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row by row.
    pub pixels: Vec<u8>,
}

/// Decodes every fetched image on arrival.
///
/// Decoding happens when the handle is created, so a corrupt frame is
/// reported as a failed asset instead of surfacing when it is first drawn.
#[derive(Debug, Default)]
pub struct DecodedImageFactory {
    live: AtomicUsize,
}

impl DecodedImageFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of decoded images handed out and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl HandleFactory for DecodedImageFactory {
    type Handle = Arc<DecodedImage>;

    fn create_handle(
        &self,
        id: &AssetId,
        asset: FetchedAsset,
    ) -> Result<Arc<DecodedImage>, DecodeError> {
        if asset.bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        // Generic types like `application/octet-stream` are decoded if the bytes look like an image.
        if let Some(content_type) = &asset.content_type {
            if !content_type.starts_with("image/") && image::guess_format(&asset.bytes).is_err() {
                return Err(DecodeError::UnsupportedContentType(content_type.clone()));
            }
        }

        let image = image::load_from_memory(&asset.bytes)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(DecodedImage {
            id: id.clone(),
            width,
            height,
            pixels: rgba.into_raw(),
        }))
    }

    fn release_handle(&self, handle: Arc<DecodedImage>) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        drop(handle);
    }
}
