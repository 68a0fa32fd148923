// SPDX-License-Identifier: MIT

//! Identity store (embedded SQLite).

pub mod identity;

pub use identity::{IdentityStore, StoreError};
