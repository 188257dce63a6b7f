use std::fmt::Debug;

use chrono::{DateTime, Utc};
use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Selector, StatusCondition};

/// Ramen VolumeReplicationGroup, usually reaching this crate embedded in a
/// ManagedClusterView result rather than as a hub-local object.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "VolumeReplicationGroup",
    status = "VolumeReplicationGroupStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReplicationGroupSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvc_selector: Option<Selector>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_state: Option<String>,
    #[garde(skip)]
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub async_spec: Option<VrgAsyncSpec>,
    #[garde(skip)]
    #[serde(rename = "sync", skip_serializing_if = "Option::is_none")]
    pub sync_spec: Option<VrgSyncSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VrgAsyncSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_class_selector: Option<Selector>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VrgSyncSpec {}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReplicationGroupStatus {
    #[serde(rename = "protectedPVCs", skip_serializing_if = "Option::is_none")]
    pub protected_pvcs: Option<Vec<ProtectedPvc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedPvc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}
