// SPDX-License-Identifier: MIT

//! Domain types shared across the identity store, resolver and gate.

pub mod identity;

pub use identity::{ExternalIdentity, Provider, ProviderKey, User};
