// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Multi-producer, single-consumer event queue

use super::{Event, EventClass};
use crate::core::error::{CoreError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters shared between every sender and the receiving side
#[derive(Debug, Default)]
struct QueueCounters {
    /// Input events pushed but not yet drained
    pending_input: AtomicUsize,
    /// Input events rejected because the input capacity was reached
    dropped_input: AtomicU64,
}

/// Producer handle for the event queue
///
/// Cheap to clone; every host callback source may hold its own copy.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: flume::Sender<Event>,
    counters: Arc<QueueCounters>,
    input_capacity: Option<usize>,
}

impl EventSender {
    /// Push an event
    ///
    /// Control events are always accepted while the loop side exists. Input
    /// events are silently dropped (and counted) when an input capacity is
    /// configured and reached.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::QueueClosed`] if the [`EventQueue`] was dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use pacedloop::core::event::{Event, EventQueue};
    ///
    /// let queue = EventQueue::unbounded();
    /// let sender = queue.sender();
    /// sender.push(Event::Pause).unwrap();
    /// assert_eq!(queue.drain().len(), 1);
    /// ```
    pub fn push(&self, event: Event) -> Result<()> {
        let is_input = event.class() == EventClass::Input;

        if is_input && !self.reserve_input_slot() {
            let dropped = self.counters.dropped_input.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 {
                log::warn!(
                    "Input queue full ({} pending), dropping input events",
                    self.counters.pending_input.load(Ordering::Relaxed)
                );
            } else {
                log::debug!("Dropped input event ({} total)", dropped);
            }
            return Ok(());
        }

        match self.tx.send(event) {
            Ok(()) => Ok(()),
            Err(flume::SendError(event)) => {
                if is_input {
                    self.counters.pending_input.fetch_sub(1, Ordering::AcqRel);
                }
                log::error!("Event {} pushed after the loop side closed", event.name());
                Err(CoreError::QueueClosed)
            }
        }
    }

    /// Number of input events rejected so far
    pub fn dropped_input(&self) -> u64 {
        self.counters.dropped_input.load(Ordering::Relaxed)
    }

    fn reserve_input_slot(&self) -> bool {
        match self.input_capacity {
            None => {
                self.counters.pending_input.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(capacity) => self
                .counters
                .pending_input
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                    (pending < capacity).then_some(pending + 1)
                })
                .is_ok(),
        }
    }
}

/// Consumer side of the event queue, owned by the loop
#[derive(Debug)]
pub struct EventQueue {
    sender: EventSender,
    receiver: flume::Receiver<Event>,
}

impl EventQueue {
    /// Create a queue
    ///
    /// # Arguments
    ///
    /// * `input_capacity` - Maximum number of pending input events, or `None`
    ///   for no limit. Control events are never limited.
    pub fn new(input_capacity: Option<usize>) -> Self {
        let (tx, receiver) = flume::unbounded();
        let sender = EventSender {
            tx,
            counters: Arc::new(QueueCounters::default()),
            input_capacity,
        };
        Self { sender, receiver }
    }

    /// Create a queue without an input capacity
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// A new producer handle
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Take every event currently queued, in push order
    ///
    /// Never blocks; returns an empty vector when nothing is pending.
    pub fn drain(&self) -> Vec<Event> {
        let events: Vec<Event> = self.receiver.try_iter().collect();
        let inputs = events
            .iter()
            .filter(|e| e.class() == EventClass::Input)
            .count();
        if inputs > 0 {
            self.sender
                .counters
                .pending_input
                .fetch_sub(inputs, Ordering::AcqRel);
        }
        events
    }

    /// Wait up to `timeout` for the next event
    ///
    /// Returns `None` on timeout. Used for the bounded idle poll; the loop
    /// never waits without a timeout.
    pub fn wait(&self, timeout: Duration) -> Option<Event> {
        let event = self.receiver.recv_timeout(timeout).ok()?;
        if event.class() == EventClass::Input {
            self.sender
                .counters
                .pending_input
                .fetch_sub(1, Ordering::AcqRel);
        }
        Some(event)
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no event is queued
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of input events currently queued
    pub fn pending_input(&self) -> usize {
        self.sender.counters.pending_input.load(Ordering::Acquire)
    }

    /// Number of input events rejected so far
    pub fn dropped_input(&self) -> u64 {
        self.sender.dropped_input()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}
