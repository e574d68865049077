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

use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// The identifier of an asset, unique within a registry and used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Creates a new identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The loading tier of an asset.
///
/// The ordering is the scheduling order: `High < Medium < Low`, so sorting
/// ascending puts the most urgent assets first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Needed for the very first frame.
    #[serde(alias = "high")]
    High,
    /// Needed soon after startup.
    #[default]
    #[serde(alias = "medium")]
    Medium,
    /// Loaded whenever there is nothing more urgent.
    #[serde(alias = "low")]
    Low,
}

/// The immutable declaration of one loadable asset.
///
/// Descriptors are created once when a registry is built and are never
/// mutated afterwards. The runtime state of an asset (loading, loaded,
/// failed) lives exclusively in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// The unique identifier, used as the cache key.
    pub id: AssetId,
    /// The opaque locator handed to the transport (a URL, a relative path...).
    pub source: String,
    /// The scheduling tier.
    #[serde(default)]
    pub priority: Priority,
}

impl AssetDescriptor {
    /// Creates a new descriptor.
    pub fn new(id: impl Into<AssetId>, source: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_high_first() {
        let mut tiers = vec![Priority::Low, Priority::High, Priority::Medium];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn asset_id_borrows_as_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(AssetId::new("f0"), 1);
        assert_eq!(map.get("f0"), Some(&1));
    }

    #[test]
    fn descriptor_deserializes_with_default_priority() {
        let descriptor: AssetDescriptor =
            ron::from_str(r#"(id: "logo", source: "/img/logo.png")"#).unwrap();
        assert_eq!(descriptor.id.as_str(), "logo");
        assert_eq!(descriptor.priority, Priority::Medium);
    }

    #[test]
    fn priority_accepts_lowercase_names() {
        let priority: Priority = ron::from_str("high").unwrap();
        assert_eq!(priority, Priority::High);
    }
}
