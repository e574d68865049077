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

//! Scripted transport and recording handle factory shared by the lane tests.

#![allow(dead_code)]

use async_trait::async_trait;
use spool_core::{
    AssetDescriptor, AssetId, CancellationToken, DecodeError, FetchError, FetchedAsset,
    HandleFactory, Priority,
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// A transport that records every call and answers after an optional delay.
#[derive(Default)]
pub struct ScriptedTransport {
    pub calls: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<String>>,
    pub stalled: Mutex<HashSet<String>>,
    pub empty: Mutex<HashSet<String>>,
    pub delay: Option<Duration>,
    pub cancel_on_call: Option<(usize, CancellationToken)>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Cancels `token` when the `call`-th fetch starts.
    pub fn cancelling_on(call: usize, token: CancellationToken) -> Self {
        Self {
            cancel_on_call: Some((call, token)),
            ..Self::default()
        }
    }

    pub fn fail(&self, locator: &str) {
        self.failing.lock().unwrap().insert(locator.to_owned());
    }

    pub fn heal(&self, locator: &str) {
        self.failing.lock().unwrap().remove(locator);
    }

    pub fn stall(&self, locator: &str) {
        self.stalled.lock().unwrap().insert(locator.to_owned());
    }

    pub fn answer_empty(&self, locator: &str) {
        self.empty.lock().unwrap().insert(locator.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl spool_core::Transport for ScriptedTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(locator.to_owned());
            calls.len()
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some((on_call, token)) = &self.cancel_on_call {
            if call == *on_call {
                token.cancel();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let stalled = self.stalled.lock().unwrap().contains(locator);
        if stalled {
            std::future::pending::<()>().await;
        }

        if self.failing.lock().unwrap().contains(locator) {
            return Err(FetchError::Status {
                locator: locator.to_owned(),
                status: 404,
            });
        }
        if self.empty.lock().unwrap().contains(locator) {
            return Ok(FetchedAsset::new(Vec::new(), Some("image/png".into())));
        }
        Ok(FetchedAsset::new(
            locator.as_bytes().to_vec(),
            Some("image/png".into()),
        ))
    }
}

/// A factory whose handles are strings, recording every release.
#[derive(Default)]
pub struct RecordingFactory {
    pub created: AtomicUsize,
    pub released: Mutex<Vec<String>>,
}

impl HandleFactory for RecordingFactory {
    type Handle = String;

    fn create_handle(&self, id: &AssetId, asset: FetchedAsset) -> Result<String, DecodeError> {
        if asset.bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let serial = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{id}#{serial}"))
    }

    fn release_handle(&self, handle: String) {
        self.released.lock().unwrap().push(handle);
    }
}

pub fn descriptor(id: &str, priority: Priority) -> AssetDescriptor {
    AssetDescriptor::new(id, format!("/assets/{id}.png"), priority)
}

pub fn frames(count: usize) -> Vec<AssetDescriptor> {
    (0..count)
        .map(|index| descriptor(&format!("f{index}"), Priority::Medium))
        .collect()
}
