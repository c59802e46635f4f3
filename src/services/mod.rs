// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod directory;
pub mod policy;
pub mod registration;

pub use catalog::EventCatalog;
pub use directory::UserDirectory;
pub use registration::RegistrationCoordinator;
