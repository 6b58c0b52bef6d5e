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

//! Error types for the loop core
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, CoreError>`. Each [`CoreError`] variant belongs to
//! one [`ErrorClass`], which decides how far the error travels:
//!
//! - [`ErrorClass::ContractViolation`]: caller bug, returned synchronously
//! - [`ErrorClass::DegradedCapability`]: reported in status, never returned
//!   from the loop
//! - [`ErrorClass::TransientResourceLoss`]: swallowed by the loop (the frame is
//!   skipped)
//! - [`ErrorClass::Fatal`]: ends the loop thread with an error

use crate::core::lifecycle::LoopState;
use thiserror::Error;

/// Coarse classification of a [`CoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller broke the host/core contract
    ContractViolation,
    /// A platform capability is missing; functionality narrows
    DegradedCapability,
    /// A resource went away in the normal course of the app lifecycle
    TransientResourceLoss,
    /// Unrecoverable failure (device, configuration, I/O)
    Fatal,
}

/// Loop core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// `start` was called more than once
    #[error("loop already started")]
    AlreadyStarted,

    /// `resume` delivered without a preceding `pause`
    #[error("resume without prior pause (state: {state})")]
    ResumeWithoutPause { state: LoopState },

    /// `pause` delivered while already paused
    #[error("pause while already paused")]
    PauseWhilePaused,

    /// Any host event after `destroy`
    #[error("{event} delivered after destroy (state: {state})")]
    AfterDestroy {
        event: &'static str,
        state: LoopState,
    },

    /// A draw was attempted outside Running + SurfaceReady
    #[error("draw attempted outside Running with a ready surface (state: {state}, surface ready: {surface_ready})")]
    DrawOutsideRunning {
        state: LoopState,
        surface_ready: bool,
    },

    /// Swap-timing feedback is not available on this device
    #[error("swap timing feedback unavailable, pacing at fixed interval")]
    SwapTimingUnavailable,

    /// The drawable surface was lost while a frame was being produced
    #[error("surface lost: {0}")]
    SurfaceLost(String),

    /// The loop side of the event queue is gone
    #[error("event queue closed")]
    QueueClosed,

    /// Renderer failure that cannot be recovered by skipping a frame
    #[error("renderer error: {0}")]
    Renderer(String),

    /// Timed out waiting for the GPU or the loop thread
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The loop thread panicked
    #[error("loop thread panicked")]
    ThreadPanicked,

    /// Invalid or unreadable configuration
    #[error("config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classify this error
    ///
    /// # Example
    ///
    /// ```
    /// use pacedloop::core::error::{CoreError, ErrorClass};
    ///
    /// assert_eq!(CoreError::AlreadyStarted.class(), ErrorClass::ContractViolation);
    /// assert_eq!(
    ///     CoreError::SurfaceLost("outdated".into()).class(),
    ///     ErrorClass::TransientResourceLoss
    /// );
    /// ```
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::AlreadyStarted
            | CoreError::ResumeWithoutPause { .. }
            | CoreError::PauseWhilePaused
            | CoreError::AfterDestroy { .. }
            | CoreError::DrawOutsideRunning { .. } => ErrorClass::ContractViolation,
            CoreError::SwapTimingUnavailable => ErrorClass::DegradedCapability,
            CoreError::SurfaceLost(_) => ErrorClass::TransientResourceLoss,
            CoreError::QueueClosed
            | CoreError::Renderer(_)
            | CoreError::Timeout(_)
            | CoreError::ThreadPanicked
            | CoreError::Config(_)
            | CoreError::Io(_) => ErrorClass::Fatal,
        }
    }

    /// Shorthand for `self.class() == ErrorClass::ContractViolation`
    pub fn is_contract_violation(&self) -> bool {
        self.class() == ErrorClass::ContractViolation
    }
}

/// Result type for loop core operations
pub type Result<T> = std::result::Result<T, CoreError>;
