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

use std::sync::{Arc, Mutex, PoisonError};

/// A generic, thread-safe event fan-out.
///
/// Every receiver returned by [`subscribe`](Self::subscribe) gets its own
/// copy of each event published afterwards. The bus holds no receiver of its
/// own: an event published while nobody listens is dropped, and a subscriber
/// whose receiver was dropped is forgotten on the next publish. Clones share
/// the same subscribers.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    subscribers: Arc<Mutex<Vec<flume::Sender<T>>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus without subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Publishes an event to every live subscriber.
    pub fn publish(&self, event: T) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            log::trace!("No subscriber for published event");
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// The number of subscribers whose receiver is still alive.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| !subscriber.is_disconnected());
        subscribers.len()
    }
}

impl<T: Clone + Send + 'static> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
