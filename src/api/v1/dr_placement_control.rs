use std::fmt::Debug;

use chrono::{DateTime, Utc};
use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Selector, StatusCondition, TypedObjectReference};

/// Ramen DRPlacementControl: binds one Placement (or PlacementRule) to one
/// DRPolicy and tracks the failover/relocate lifecycle for the workload
/// behind that placement.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPlacementControl",
    status = "DRPlacementControlStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlSpec {
    #[garde(skip)]
    pub dr_policy_ref: TypedObjectReference,
    #[garde(skip)]
    pub placement_ref: TypedObjectReference,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_cluster: Option<String>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover_cluster: Option<String>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<DrAction>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_selector: Option<Selector>,
}

/// User-initiated DR action.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum DrAction {
    Failover,
    Relocate,
}

/// Lifecycle phase driven by the Ramen hub operator. The set is open on
/// the wire; anything unrecognized maps to `Unknown`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum DrpcPhase {
    Initiating,
    Deploying,
    Deployed,
    FailingOver,
    FailedOver,
    Relocating,
    Relocated,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl DrpcPhase {
    /// True while a failover or relocation is still in flight.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, DrpcPhase::FailingOver | DrpcPhase::Relocating)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<DrpcPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_group_sync_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_conditions: Option<ResourceConditions>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_meta: Option<ResourceMeta>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    #[serde(rename = "protectedpvcs", skip_serializing_if = "Option::is_none")]
    pub protected_pvcs: Option<Vec<String>>,
}

impl DRPlacementControl {
    pub fn phase(&self) -> Option<DrpcPhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    pub fn last_group_sync_time(&self) -> Option<DateTime<Utc>> {
        self.status.as_ref().and_then(|s| s.last_group_sync_time)
    }

    /// Names of PVCs currently protected by this control.
    pub fn protected_pvc_names(&self) -> &[String] {
        self.status
            .as_ref()
            .and_then(|s| s.resource_conditions.as_ref())
            .and_then(|rc| rc.resource_meta.as_ref())
            .and_then(|meta| meta.protected_pvcs.as_deref())
            .unwrap_or_default()
    }
}
