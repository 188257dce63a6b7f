//! Hub-side disaster-recovery reconciliation for multicluster storage
//! workloads.
//!
//! The host console watches ACM and Ramen custom resources and hands each
//! collection over as a `[data, loaded, loadError]` triple; one call to
//! [`reconcile`] joins them into flat per-application and per-PVC
//! view-models. Every pass rebuilds the derived graph from scratch over a
//! read-only snapshot, so outputs are idempotent under a fixed clock.

pub mod api;
pub mod disaster_recovery;
pub mod telemetry;
pub mod watch;

pub use disaster_recovery::assemble::{reconcile, DerivedState};
pub use disaster_recovery::snapshot::{ResourceSnapshot, WatchResult};
