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

//! Format and size variant selection for image locators.

use serde::{Deserialize, Serialize};

/// The image encodings a host can prefer over the PNG masters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// AV1 image file format.
    Avif,
    /// WebP.
    WebP,
    /// The original PNG.
    Png,
}

impl ImageFormat {
    /// The file extension of the format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Avif => "avif",
            ImageFormat::WebP => "webp",
            ImageFormat::Png => "png",
        }
    }
}

/// The responsive size buckets, keyed by the rendered width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    /// Up to 150px.
    Small,
    /// Up to 300px.
    Medium,
    /// Up to 600px.
    Large,
    /// Anything wider uses the master file.
    Full,
}

impl SizeBucket {
    /// Picks the bucket for a rendered width.
    pub fn for_width(width: u32) -> Self {
        match width {
            0..=150 => SizeBucket::Small,
            151..=300 => SizeBucket::Medium,
            301..=600 => SizeBucket::Large,
            _ => SizeBucket::Full,
        }
    }

    /// The file-stem suffix of the bucket.
    pub fn suffix(self) -> &'static str {
        match self {
            SizeBucket::Small => "_sm",
            SizeBucket::Medium => "_md",
            SizeBucket::Large => "_lg",
            SizeBucket::Full => "",
        }
    }
}

/// Host-declared preferences used to rewrite locators right before a fetch.
///
/// Only `.png` locators are rewritten; anything else passes through untouched.
/// The default policy leaves every locator unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantPolicy {
    /// The host can decode AVIF.
    pub avif: bool,
    /// The host can decode WebP.
    pub webp: bool,
    /// The width the frames are rendered at, if known.
    pub target_width: Option<u32>,
}

impl VariantPolicy {
    /// The best format the host supports.
    pub fn preferred_format(&self) -> ImageFormat {
        if self.avif {
            ImageFormat::Avif
        } else if self.webp {
            ImageFormat::WebP
        } else {
            ImageFormat::Png
        }
    }

    /// Rewrites a locator to the preferred format and size variant.
    pub fn resolve(&self, locator: &str) -> String {
        let split = locator.find(['?', '#']).unwrap_or(locator.len());
        let (path, tail) = locator.split_at(split);

        let Some(stem) = path.strip_suffix(".png") else {
            return locator.to_owned();
        };

        let suffix = self
            .target_width
            .map(SizeBucket::for_width)
            .map_or("", SizeBucket::suffix);

        format!(
            "{stem}{suffix}.{}{tail}",
            self.preferred_format().extension()
        )
    }

    /// Returns `true` if [`resolve`](Self::resolve) never changes a locator.
    pub fn is_identity(&self) -> bool {
        !self.avif && !self.webp && self.target_width.is_none()
    }
}
