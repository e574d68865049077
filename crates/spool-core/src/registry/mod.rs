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

//! The static declaration of every named asset group.
//!
//! The [`AssetRegistry`] is the source of truth the group coordinator consults
//! when asked for a group by name. It is built once (from code with
//! [`AssetRegistryBuilder`], or from a RON file) and never mutated afterwards.
//! Frame sequences are expanded into descriptors while building, so lookups
//! never recompute ids.

use crate::asset::{AssetDescriptor, AssetId, FrameSequence};
use crate::error::GroupError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, sync::Arc};
use thiserror::Error;

/// An error raised while building or loading a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read registry file")]
    Io(#[from] std::io::Error),
    /// The registry text is not valid RON.
    #[error("failed to parse registry: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Two groups share the same name.
    #[error("asset group '{0}' is declared twice")]
    DuplicateGroup(String),
    /// The same id is declared with two different sources or priorities.
    #[error("asset '{id}' is declared with conflicting definitions in groups '{first}' and '{second}'")]
    ConflictingId {
        /// The conflicting id.
        id: AssetId,
        /// The group of the first declaration.
        first: String,
        /// The group of the conflicting declaration.
        second: String,
    },
    /// A frame sequence has no prefix, so its ids would collide with other sequences.
    #[error("a frame sequence in group '{0}' has an empty prefix")]
    EmptySequencePrefix(String),
    /// A frame sequence's range overflows or is too large to expand.
    #[error("frame sequence '{prefix}' in group '{group}' is invalid: {reason}")]
    InvalidSequence {
        /// The group declaring the sequence.
        group: String,
        /// The sequence prefix.
        prefix: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// One entry of a group in a registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEntry {
    /// A single asset.
    Asset(AssetDescriptor),
    /// A run of numbered frames.
    Sequence(FrameSequence),
}

/// The on-disk shape of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFile {
    /// The group name.
    pub name: String,
    /// The group's entries, in declaration order.
    #[serde(default)]
    pub entries: Vec<GroupEntry>,
}

/// The on-disk shape of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    /// The groups, in declaration order.
    #[serde(default)]
    pub groups: Vec<GroupFile>,
}

/// A named, ordered sequence of descriptors loaded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    name: String,
    descriptors: Arc<[AssetDescriptor]>,
}

impl AssetGroup {
    /// The group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptors, in declaration order.
    pub fn descriptors(&self) -> &[AssetDescriptor] {
        &self.descriptors
    }

    /// A cheap shared copy of the descriptors, suitable for handing to a task.
    pub fn shared_descriptors(&self) -> Arc<[AssetDescriptor]> {
        self.descriptors.clone()
    }

    /// The number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the group declares no asset.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The immutable mapping from group name to descriptor sequence.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    groups: Vec<AssetGroup>,
    index: HashMap<String, usize>,
}

impl AssetRegistry {
    /// Starts building a registry.
    pub fn builder() -> AssetRegistryBuilder {
        AssetRegistryBuilder::default()
    }

    /// Builds a registry from its on-disk shape.
    pub fn from_file_data(file: RegistryFile) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        for group in file.groups {
            builder = builder.entries(group.name, group.entries);
        }
        builder.build()
    }

    /// Parses a registry from RON text.
    pub fn from_ron(text: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = ron::from_str(text)?;
        Self::from_file_data(file)
    }

    /// Reads and parses a registry file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Looks a group up by name.
    pub fn group(&self, name: &str) -> Result<&AssetGroup, GroupError> {
        self.index
            .get(name)
            .map(|&slot| &self.groups[slot])
            .ok_or_else(|| GroupError::UnknownGroup(name.to_owned()))
    }

    /// Returns `true` if a group with that name is declared.
    pub fn contains_group(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over the groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = &AssetGroup> {
        self.groups.iter()
    }

    /// Finds the descriptor of an id in any group.
    pub fn descriptor(&self, id: &str) -> Option<&AssetDescriptor> {
        self.groups
            .iter()
            .flat_map(|group| group.descriptors().iter())
            .find(|descriptor| descriptor.id.as_str() == id)
    }
}

/// Collects groups and validates them into an [`AssetRegistry`].
#[derive(Debug, Default)]
pub struct AssetRegistryBuilder {
    pending: Vec<(String, Vec<GroupEntry>)>,
}

impl AssetRegistryBuilder {
    /// Declares a group made of plain descriptors.
    pub fn group(
        self,
        name: impl Into<String>,
        descriptors: impl IntoIterator<Item = AssetDescriptor>,
    ) -> Self {
        self.entries(name, descriptors.into_iter().map(GroupEntry::Asset))
    }

    /// Declares a group made of a single frame sequence.
    pub fn sequence(self, name: impl Into<String>, sequence: FrameSequence) -> Self {
        self.entries(name, [GroupEntry::Sequence(sequence)])
    }

    /// Declares a group from raw entries.
    pub fn entries(
        mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = GroupEntry>,
    ) -> Self {
        self.pending.push((name.into(), entries.into_iter().collect()));
        self
    }

    /// Expands sequences, validates ids, and freezes the registry.
    pub fn build(self) -> Result<AssetRegistry, RegistryError> {
        let mut registry = AssetRegistry::default();
        let mut declared: HashMap<AssetId, (AssetDescriptor, String)> = HashMap::new();

        for (name, entries) in self.pending {
            if registry.index.contains_key(&name) {
                return Err(RegistryError::DuplicateGroup(name));
            }

            let mut descriptors = Vec::new();
            for entry in entries {
                match entry {
                    GroupEntry::Asset(descriptor) => descriptors.push(descriptor),
                    GroupEntry::Sequence(sequence) => {
                        if sequence.prefix.is_empty() {
                            return Err(RegistryError::EmptySequencePrefix(name));
                        }
                        if let Err(reason) = sequence.check() {
                            return Err(RegistryError::InvalidSequence {
                                group: name,
                                prefix: sequence.prefix,
                                reason,
                            });
                        }
                        descriptors.extend(sequence.descriptors());
                    }
                }
            }

            for descriptor in &descriptors {
                match declared.get(&descriptor.id) {
                    Some((existing, first)) if existing != descriptor => {
                        return Err(RegistryError::ConflictingId {
                            id: descriptor.id.clone(),
                            first: first.clone(),
                            second: name,
                        });
                    }
                    Some(_) => {}
                    None => {
                        declared.insert(descriptor.id.clone(), (descriptor.clone(), name.clone()));
                    }
                }
            }

            log::debug!("Registered asset group '{}' ({} assets)", name, descriptors.len());
            registry.index.insert(name.clone(), registry.groups.len());
            registry.groups.push(AssetGroup {
                name,
                descriptors: descriptors.into(),
            });
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Priority;

    const REGISTRY: &str = r#"
        (
            groups: [
                (name: "essential", entries: []),
                (name: "interactions", entries: [
                    Asset((id: "button", source: "/ui/button.png", priority: High)),
                ]),
                (name: "animations", entries: [
                    Sequence((prefix: "1_mainloop", count: 121, source: "/ko/rsp/1_mainloop/{id}.png")),
                    Sequence((prefix: "3_hi", count: 161, source: "/ko/rsp/3_hi/{id}.png")),
                ]),
            ],
        )
    "#;

    #[test]
    fn parses_groups_in_declaration_order() {
        let registry = AssetRegistry::from_ron(REGISTRY).unwrap();
        let names: Vec<_> = registry.groups().map(AssetGroup::name).collect();
        assert_eq!(names, vec!["essential", "interactions", "animations"]);
    }

    #[test]
    fn sequences_are_expanded_once() {
        let registry = AssetRegistry::from_ron(REGISTRY).unwrap();
        let animations = registry.group("animations").unwrap();

        assert_eq!(animations.len(), 121 + 161);
        assert_eq!(animations.descriptors()[0].id.as_str(), "1_mainloop0000");
        assert_eq!(
            animations.descriptors()[121].source,
            "/ko/rsp/3_hi/3_hi0000.png"
        );
        assert_eq!(animations.descriptors()[0].priority, Priority::Medium);
    }

    #[test]
    fn empty_group_is_declared() {
        let registry = AssetRegistry::from_ron(REGISTRY).unwrap();
        assert!(registry.group("essential").unwrap().is_empty());
    }

    #[test]
    fn unknown_group_is_an_error() {
        let registry = AssetRegistry::from_ron(REGISTRY).unwrap();
        assert_eq!(
            registry.group("credits"),
            Err(GroupError::UnknownGroup("credits".into()))
        );
    }

    #[test]
    fn overlapping_groups_with_identical_descriptors_are_allowed() {
        let logo = AssetDescriptor::new("logo", "/logo.png", Priority::High);
        let registry = AssetRegistry::builder()
            .group("a", [logo.clone()])
            .group("b", [logo])
            .build()
            .unwrap();
        assert_eq!(registry.group("b").unwrap().len(), 1);
    }

    #[test]
    fn conflicting_ids_are_rejected() {
        let result = AssetRegistry::builder()
            .group("a", [AssetDescriptor::new("logo", "/logo.png", Priority::High)])
            .group("b", [AssetDescriptor::new("logo", "/other.png", Priority::High)])
            .build();

        match result {
            Err(RegistryError::ConflictingId { id, first, second }) => {
                assert_eq!(id.as_str(), "logo");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected a conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_group_names_are_rejected() {
        let result = AssetRegistry::builder()
            .group("a", [])
            .group("a", [])
            .build();
        assert!(matches!(result, Err(RegistryError::DuplicateGroup(name)) if name == "a"));
    }

    #[test]
    fn overflowing_sequences_are_rejected() {
        let result = AssetRegistry::from_ron(&format!(
            r#"(groups: [(name: "animations", entries: [
                Sequence((prefix: "f", start: {}, count: 10, source: "/f/{{id}}.png")),
            ])])"#,
            usize::MAX - 1
        ));

        match result {
            Err(RegistryError::InvalidSequence { group, prefix, .. }) => {
                assert_eq!(group, "animations");
                assert_eq!(prefix, "f");
            }
            other => panic!("expected an invalid sequence, got {other:?}"),
        }
    }

    #[test]
    fn absurd_frame_counts_are_rejected() {
        let result = AssetRegistry::builder()
            .sequence(
                "animations",
                FrameSequence::new("f", FrameSequence::MAX_FRAMES * 100, "/f/{id}.png", Priority::Medium),
            )
            .build();
        assert!(matches!(result, Err(RegistryError::InvalidSequence { .. })));
    }

    #[test]
    fn descriptor_lookup_spans_groups() {
        let registry = AssetRegistry::from_ron(REGISTRY).unwrap();
        let frame = registry.descriptor("3_hi0160").unwrap();
        assert_eq!(frame.source, "/ko/rsp/3_hi/3_hi0160.png");
        assert!(registry.descriptor("3_hi0161").is_none());
    }
}
