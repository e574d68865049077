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

//! Ownership of in-flight loads.
//!
//! Every id being fetched has exactly one owner, the [`FlightGuard`] returned
//! by the claim that found the id missing. Later claimants get a
//! [`FlightWaiter`] subscribed to the owner's outcome.

use spool_core::{AssetId, LoadError};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::watch;

pub(crate) type FlightTable = Arc<Mutex<HashMap<AssetId, watch::Receiver<FlightState>>>>;

#[derive(Debug, Clone)]
pub(crate) enum FlightState {
    Pending,
    Settled(FlightOutcome),
}

/// How an in-flight load ended, as seen by the batches waiting on it.
#[derive(Debug, Clone)]
pub enum FlightOutcome {
    /// The owner cached a handle.
    Loaded,
    /// The owner recorded a failure.
    Failed(LoadError),
    /// The owner stopped before settling, usually because its batch was cancelled.
    Abandoned,
}

/// The result of [`AssetCache::claim`](crate::AssetCache::claim).
#[derive(Debug)]
pub enum Claim<H> {
    /// The id is already cached.
    Cached(H),
    /// The caller now owns the load and must fetch the asset.
    Owner(FlightGuard),
    /// Another batch owns the load.
    Waiter(FlightWaiter),
}

/// The result of [`AssetCache::lookup`](crate::AssetCache::lookup).
#[derive(Debug)]
pub enum Lookup<H> {
    /// The id is already cached.
    Cached(H),
    /// Another batch is loading it.
    InFlight(FlightWaiter),
    /// Nobody has it.
    Missing,
}

/// Exclusive ownership of one id's load.
///
/// Settle it with [`finish`](Self::finish) once the handle (or the failure)
/// has been recorded in the cache. Dropping an unsettled guard reports
/// [`FlightOutcome::Abandoned`] to the waiters.
#[derive(Debug)]
pub struct FlightGuard {
    id: AssetId,
    sender: watch::Sender<FlightState>,
    table: FlightTable,
    settled: bool,
}

impl FlightGuard {
    pub(crate) fn new(id: AssetId, table: FlightTable) -> (Self, watch::Receiver<FlightState>) {
        let (sender, receiver) = watch::channel(FlightState::Pending);
        let guard = Self {
            id,
            sender,
            table,
            settled: false,
        };
        (guard, receiver)
    }

    /// The id this guard owns.
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Releases ownership and wakes every waiter with `outcome`.
    pub fn finish(mut self, outcome: FlightOutcome) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: FlightOutcome) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        self.sender.send_replace(FlightState::Settled(outcome));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            log::debug!("Load of '{}' abandoned before it settled", self.id);
            self.settle(FlightOutcome::Abandoned);
        }
    }
}

/// A subscription to another batch's load of an id.
#[derive(Debug, Clone)]
pub struct FlightWaiter {
    id: AssetId,
    receiver: watch::Receiver<FlightState>,
}

impl FlightWaiter {
    pub(crate) fn new(id: AssetId, receiver: watch::Receiver<FlightState>) -> Self {
        Self { id, receiver }
    }

    /// The id being waited on.
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Waits for the owner to settle.
    pub async fn wait(mut self) -> FlightOutcome {
        let settled = self
            .receiver
            .wait_for(|state| matches!(state, FlightState::Settled(_)))
            .await;
        match settled.as_deref() {
            Ok(FlightState::Settled(outcome)) => outcome.clone(),
            _ => FlightOutcome::Abandoned,
        }
    }
}
