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

use super::{AssetDescriptor, AssetId, Priority};
use serde::{Deserialize, Serialize};

fn default_pad() -> usize {
    4
}

/// A numbered run of animation frames sharing a prefix and a locator template.
///
/// The sequence is expanded exactly once, when the registry is built, into
/// one [`AssetDescriptor`] per frame. Frame ids are the prefix followed by the
/// zero-padded index (`1_mainloop0007`).
///
/// The `source` template may contain `{id}` (the full frame id) and
/// `{index}` (the zero-padded index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSequence {
    /// The common id prefix of every frame.
    pub prefix: String,
    /// The number of frames.
    pub count: usize,
    /// The index of the first frame.
    #[serde(default)]
    pub start: usize,
    /// The zero-padding width of the index.
    #[serde(default = "default_pad")]
    pub pad: usize,
    /// The locator template.
    pub source: String,
    /// The tier shared by every frame.
    #[serde(default)]
    pub priority: Priority,
}

impl FrameSequence {
    /// Creates a sequence starting at index 0 with a padding width of 4.
    pub fn new(
        prefix: impl Into<String>,
        count: usize,
        source: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            count,
            start: 0,
            pad: default_pad(),
            source: source.into(),
            priority,
        }
    }

    /// The most frames a single sequence may declare.
    pub const MAX_FRAMES: usize = 100_000;

    /// The widest zero-padding a sequence may ask for.
    pub const MAX_PAD: usize = 20;

    /// The frame indices, in playback order. Saturates instead of overflowing.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start.saturating_add(self.count)
    }

    /// Checks that the sequence can be expanded.
    ///
    /// # Errors
    /// Returns a description of the problem if the prefix is empty, the
    /// index range overflows, or the count or padding exceed
    /// [`MAX_FRAMES`](Self::MAX_FRAMES) or [`MAX_PAD`](Self::MAX_PAD).
    pub fn check(&self) -> Result<(), String> {
        if self.prefix.is_empty() {
            return Err("the prefix is empty".to_owned());
        }
        if self.start.checked_add(self.count).is_none() {
            return Err(format!(
                "frames {}..{}+{} overflow",
                self.start, self.start, self.count
            ));
        }
        if self.count > Self::MAX_FRAMES {
            return Err(format!(
                "{} frames exceed the limit of {}",
                self.count,
                Self::MAX_FRAMES
            ));
        }
        if self.pad > Self::MAX_PAD {
            return Err(format!(
                "padding {} exceeds the limit of {}",
                self.pad,
                Self::MAX_PAD
            ));
        }
        Ok(())
    }

    /// Returns the id of the frame at `index`.
    pub fn frame_id(&self, index: usize) -> AssetId {
        AssetId::new(format!("{}{:0width$}", self.prefix, index, width = self.pad))
    }

    /// Returns the frame ids in playback order.
    pub fn frame_ids(&self) -> Vec<AssetId> {
        self.indices()
            .map(|index| self.frame_id(index))
            .collect()
    }

    /// Expands the sequence into descriptors in playback order.
    pub fn descriptors(&self) -> Vec<AssetDescriptor> {
        self.indices()
            .map(|index| {
                let id = self.frame_id(index);
                let padded = format!("{:0width$}", index, width = self.pad);
                let source = self
                    .source
                    .replace("{id}", id.as_str())
                    .replace("{index}", &padded);
                AssetDescriptor {
                    id,
                    source,
                    priority: self.priority,
                }
            })
            .collect()
    }
}
