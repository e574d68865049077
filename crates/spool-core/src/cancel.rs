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

//! Cooperative, hierarchical cancellation.

use futures::future::select_all;
use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation signal.
///
/// Cancelling a token cancels every clone of it and every token derived from
/// it with [`child`](Self::child). Cancelling a child never affects its parent,
/// which lets an owner cancel one tracked task (or all of them at once).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    /// This token's own flag first, followed by the flags of its ancestors.
    flags: Vec<Arc<watch::Sender<bool>>>,
}

impl CancellationToken {
    /// Creates a new, root token.
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flags: vec![Arc::new(flag)],
        }
    }

    /// Creates a token that is cancelled whenever `self` is.
    pub fn child(&self) -> Self {
        let (flag, _) = watch::channel(false);
        let mut flags = Vec::with_capacity(self.flags.len() + 1);
        flags.push(Arc::new(flag));
        flags.extend(self.flags.iter().cloned());
        Self { flags }
    }

    /// Cancels this token and all of its children.
    pub fn cancel(&self) {
        self.flags[0].send_replace(true);
    }

    /// Returns `true` if this token or one of its ancestors was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|flag| *flag.borrow())
    }

    /// Completes once this token or one of its ancestors is cancelled.
    pub async fn cancelled(&self) {
        let waits = self.flags.iter().map(|flag| {
            let mut receiver = flag.subscribe();
            Box::pin(async move {
                // The senders outlive this future, since `self` is borrowed for its duration.
                let _ = receiver.wait_for(|cancelled| *cancelled).await;
            })
        });
        select_all(waits).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
