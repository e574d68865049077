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

use spool_core::CancellationToken;
use tokio::task::JoinHandle;

/// A spawned task the agent owns, with its own cancellation token.
#[derive(Debug)]
pub(crate) struct TrackedTask {
    pub(crate) label: &'static str,
    pub(crate) cancel: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

impl TrackedTask {
    /// Cancels the task and waits for it to stop.
    pub(crate) async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                log::error!("Preload task '{}' panicked: {e}", self.label);
            }
        }
    }

    /// Cancels the task without waiting.
    pub(crate) fn abort(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}
