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

//! Loop core
//!
//! Platform-independent pieces of the frame-paced loop. Nothing in here
//! depends on a window system or a GPU API.

pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod lifecycle;
pub mod pacer;
pub mod render;
pub mod render_loop;
pub mod surface;
pub mod time;
