//! # Flavor Core
//!
//! Core domain logic for selecting OpenStack compute flavors.
//!
//! This crate contains pure logic with no I/O dependencies:
//! - The `Flavor` value type and the raw provider record it is built from
//! - Filter state and the `FlavorCollection` filter/sort/dedup pipeline
//! - Sort keys and core error definitions
//!
//! Filters are evaluated as independent facets (name, vCPU range, memory
//! range) and combined by intersecting identity keys, so the result never
//! contains two flavors with the same `(name, id)`.

pub mod collection;
pub mod errors;
pub mod models;

// Re-export commonly used types
pub use collection::{FlavorCollection, FlavorFilter, SortKey};
pub use errors::{FlavorError, Result};
pub use models::{ExtraSpecs, Flavor, FlavorKey, RawFlavor};
