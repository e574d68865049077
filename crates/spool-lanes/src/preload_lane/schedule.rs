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

//! Ordering helpers for batch planning.

use spool_core::AssetDescriptor;
use std::collections::HashSet;

/// Drops repeated ids, keeping the first occurrence of each.
pub fn dedupe(descriptors: &[AssetDescriptor]) -> Vec<&AssetDescriptor> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    descriptors
        .iter()
        .filter(|descriptor| {
            let first = seen.insert(descriptor.id.as_str());
            if !first {
                log::debug!("Ignoring repeated asset '{}' in batch", descriptor.id);
            }
            first
        })
        .collect()
}

/// Sorts descriptors high before medium before low, keeping input order within a tier.
pub fn priority_order(descriptors: &mut [&AssetDescriptor]) {
    // `sort_by_key` is stable.
    descriptors.sort_by_key(|descriptor| descriptor.priority);
}
