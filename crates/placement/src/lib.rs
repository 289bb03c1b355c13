//! Placement Engine (C5): canonical-tenancy resolution, capacity-aware
//! registration, and bot migration between tenancies.

pub mod error;
pub mod placement;

pub use error::{Error, Result};
pub use placement::{PlacementEngine, PlacementOutcome};
