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

//! Surface state machine
//!
//! Tracks whether a drawable surface exists and what size it has.
//!
//! ```text
//!               window-created
//!   NoSurface ------------------> SurfaceReady --+
//!       ^                           |    ^        | window-resized
//!       |      window-destroyed     |    +--------+ (resize pending)
//!       +---------------------------+
//! ```
//!
//! Drawing while [`SurfaceStatus::NoSurface`] is a no-op for the loop, which
//! is the normal steady state while the app is in the background.

use crate::core::error::{CoreError, Result};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique id of a surface handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Surface size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero (minimised window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opaque reference to a drawable surface
///
/// Carries a type-erased platform payload (for example an `Arc<Window>`) that
/// a renderer downcasts with [`SurfaceHandle::payload`]. Valid between the
/// window-created event that delivered it and the next window-destroyed.
#[derive(Clone)]
pub struct SurfaceHandle {
    id: SurfaceId,
    extent: Extent,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl SurfaceHandle {
    /// Wrap a platform surface
    ///
    /// # Example
    ///
    /// ```
    /// use pacedloop::core::surface::{Extent, SurfaceHandle};
    ///
    /// let handle = SurfaceHandle::new(String::from("native-window"), Extent::new(1080, 2400));
    /// assert_eq!(handle.payload::<String>().map(String::as_str), Some("native-window"));
    /// assert!(handle.payload::<u32>().is_none());
    /// ```
    pub fn new<T: Any + Send + Sync>(payload: T, extent: Extent) -> Self {
        Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            extent,
            payload: Some(Arc::new(payload)),
        }
    }

    /// A surface without a platform payload, for headless rendering
    pub fn headless(width: u32, height: u32) -> Self {
        Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            extent: Extent::new(width, height),
            payload: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Size at creation time
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Downcast the platform payload
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("id", &self.id)
            .field("extent", &self.extent)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// Observable surface state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SurfaceStatus {
    #[default]
    NoSurface,
    SurfaceReady,
}

#[derive(Debug)]
struct ReadySurface {
    handle: SurfaceHandle,
    extent: Extent,
    resize_pending: bool,
}

/// Surface state machine, owned by the loop thread
#[derive(Debug, Default)]
pub struct SurfaceState {
    ready: Option<ReadySurface>,
    /// Number of surfaces captured so far
    generation: u64,
}

impl SurfaceState {
    /// Start in `NoSurface`
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle window-created
    ///
    /// Returns the previous handle if one was still attached; the caller must
    /// treat that as an implicit window-destroyed and release it first.
    pub fn on_created(&mut self, handle: SurfaceHandle) -> Option<SurfaceHandle> {
        let previous = self.ready.take().map(|r| r.handle);
        if let Some(ref old) = previous {
            log::warn!(
                "Surface {} created while {} still attached, replacing",
                handle.id(),
                old.id()
            );
        }
        log::info!("Surface {} ready ({})", handle.id(), handle.extent());
        self.generation += 1;
        self.ready = Some(ReadySurface {
            extent: handle.extent(),
            handle,
            resize_pending: false,
        });
        previous
    }

    /// Handle window-resized
    ///
    /// Returns `false` (and ignores the event) when no surface is attached.
    pub fn on_resized(&mut self, extent: Extent) -> bool {
        match self.ready.as_mut() {
            Some(ready) => {
                if ready.extent != extent {
                    log::debug!("Surface {} resized {} -> {}", ready.handle.id(), ready.extent, extent);
                    ready.extent = extent;
                    ready.resize_pending = true;
                }
                true
            }
            None => {
                log::debug!("Ignoring resize to {} without a surface", extent);
                false
            }
        }
    }

    /// Handle window-destroyed
    ///
    /// Returns the handle that was released, if any.
    pub fn on_destroyed(&mut self) -> Option<SurfaceHandle> {
        let released = self.ready.take().map(|r| r.handle);
        match released {
            Some(ref handle) => log::info!("Surface {} destroyed", handle.id()),
            None => log::debug!("window-destroyed without a surface"),
        }
        released
    }

    pub fn status(&self) -> SurfaceStatus {
        if self.ready.is_some() {
            SurfaceStatus::SurfaceReady
        } else {
            SurfaceStatus::NoSurface
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    /// Ready and non-zero in size
    pub fn is_drawable(&self) -> bool {
        self.ready.as_ref().is_some_and(|r| !r.extent.is_empty())
    }

    /// Current handle, borrowed for the duration of a frame
    pub fn handle(&self) -> Option<&SurfaceHandle> {
        self.ready.as_ref().map(|r| &r.handle)
    }

    /// Current size
    pub fn extent(&self) -> Option<Extent> {
        self.ready.as_ref().map(|r| r.extent)
    }

    /// Consume the resize-pending flag
    ///
    /// Returns the new extent when size-dependent resources must be recreated
    /// before the next draw.
    pub fn take_resize(&mut self) -> Option<Extent> {
        let ready = self.ready.as_mut()?;
        if ready.resize_pending {
            ready.resize_pending = false;
            Some(ready.extent)
        } else {
            None
        }
    }

    /// Number of surfaces captured since start
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Acknowledgement that the loop released a destroyed surface
///
/// Returned by
/// [`LifecycleController::on_window_destroyed`](crate::core::lifecycle::LifecycleController::on_window_destroyed).
/// Hosts that must not return from their window-destroyed callback before the
/// native window is unused wait on it.
#[derive(Debug)]
pub struct SurfaceRelease {
    rx: flume::Receiver<SurfaceId>,
}

impl SurfaceRelease {
    /// Create the acknowledgement pair
    pub fn channel() -> (flume::Sender<SurfaceId>, Self) {
        let (tx, rx) = flume::bounded(1);
        (tx, Self { rx })
    }

    /// Wait until the loop has released the surface
    ///
    /// # Returns
    ///
    /// - `Ok(Some(id))` once the surface was released
    /// - `Ok(None)` if no surface was attached (or the loop is gone)
    ///
    /// # Errors
    ///
    /// [`CoreError::Timeout`] if the loop did not answer within `timeout`.
    pub fn wait(&self, timeout: Duration) -> Result<Option<SurfaceId>> {
        match self.rx.recv_timeout(timeout) {
            Ok(id) => Ok(Some(id)),
            Err(flume::RecvTimeoutError::Disconnected) => Ok(None),
            Err(flume::RecvTimeoutError::Timeout) => Err(CoreError::Timeout("surface release")),
        }
    }
}
