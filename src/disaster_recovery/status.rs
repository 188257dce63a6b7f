//! Derived status: replication-lag classification and DRPC condition
//! projection.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::constants::{CONDITION_AVAILABLE, CONDITION_PEER_READY};
use crate::api::v1::dr_placement_control::{DRPlacementControl, DrpcPhase};

use super::interval::SyncInterval;

/// How far actual replication lag trails the configured interval.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum SlaStatus {
    Healthy,
    Warning,
    Critical,
}

/// Lag beyond this multiple of the interval is critical.
const SLA_CRITICAL_THRESHOLD: f64 = 2.0;

/// Classifies replication lag at `now` against the scheduled interval.
///
/// The ratio is elapsed seconds over interval seconds (0 when the interval
/// is zero). At or past twice the interval the status is critical; strictly
/// between one and two intervals it is a warning; otherwise healthy. The
/// caller supplies `now` so a pass is reproducible under a fixed clock.
pub fn sla_status(
    last_sync_time: DateTime<Utc>,
    interval: SyncInterval,
    now: DateTime<Utc>,
) -> (SlaStatus, f64) {
    let elapsed = (now - last_sync_time).num_seconds() as f64;
    let interval_seconds = interval.as_secs() as f64;
    let ratio = if interval_seconds == 0.0 {
        0.0
    } else {
        elapsed / interval_seconds
    };
    let status = if ratio >= SLA_CRITICAL_THRESHOLD {
        SlaStatus::Critical
    } else if ratio > 1.0 {
        SlaStatus::Warning
    } else {
        SlaStatus::Healthy
    };
    (status, ratio)
}

/// Folds a set of placement controls into one displayable phase: an
/// in-flight transition always wins, otherwise the first known phase in
/// input order is kept.
pub fn current_phase(drpcs: &[&DRPlacementControl]) -> Option<DrpcPhase> {
    drpcs.iter().fold(None, |previous, drpc| {
        let next = drpc.phase().filter(|phase| *phase != DrpcPhase::Unknown);
        match next {
            Some(phase) if phase.is_in_progress() => Some(phase),
            _ => previous.or(next),
        }
    })
}

fn has_true_condition(drpc: &DRPlacementControl, condition_type: &str) -> bool {
    drpc.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|condition| condition.type_ == condition_type && condition.is_true())
        })
}

/// `PeerReady` condition reported true. Absent conditions count as false.
pub fn is_peer_ready(drpc: &DRPlacementControl) -> bool {
    has_true_condition(drpc, CONDITION_PEER_READY)
}

/// `Available` condition reported true. Absent conditions count as false.
pub fn is_available(drpc: &DRPlacementControl) -> bool {
    has_true_condition(drpc, CONDITION_AVAILABLE)
}

pub fn is_peer_ready_and_available(drpc: &DRPlacementControl) -> bool {
    is_peer_ready(drpc) && is_available(drpc)
}
