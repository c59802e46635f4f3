// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod coerce;
pub mod event;
pub mod user;

pub use coerce::{display_string, normalize_counter};
pub use event::{Event, EventPatch, EventView, NewEvent};
pub use user::{NewUser, Role, User, UserProfile};
