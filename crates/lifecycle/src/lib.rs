//! Lifecycle Orchestrator (C8): admin approve/revoke/reject/delete and
//! batch operations over bot instances, plus promotional-offer
//! auto-approval.

pub mod error;
pub mod lifecycle;

pub use error::{Error, Result};
pub use lifecycle::{BatchAction, BatchItem, BatchOutcome, LifecycleOrchestrator};
