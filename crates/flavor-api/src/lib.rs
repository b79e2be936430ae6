//! # Flavor API
//!
//! OpenStack client used to retrieve compute flavors.
//! This crate authenticates against Keystone (Identity v3), locates the
//! compute endpoint in the service catalog and lists every flavor the
//! credentials can see.

pub mod client;
pub mod errors;
pub mod sdk;

// Re-export common types for convenience
pub use client::*;
pub use errors::*;
pub use sdk::*;

// Re-export core types that API consumers will need
pub use flavor_core::{Flavor, FlavorCollection, FlavorFilter, RawFlavor};
