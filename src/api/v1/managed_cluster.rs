use std::fmt::Debug;

use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::constants::MANAGED_CLUSTER_REGION_CLAIM;

use super::common::StatusCondition;

/// ACM ManagedCluster as seen from the hub.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster",
    status = "ManagedClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_accepts_client: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_claims: Option<Vec<ClusterClaim>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterClaim {
    pub name: String,
    pub value: String,
}

impl ManagedCluster {
    /// Region advertised through the cluster claim, if any.
    pub fn region(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.cluster_claims.as_ref())
            .and_then(|claims| {
                claims
                    .iter()
                    .find(|claim| claim.name == MANAGED_CLUSTER_REGION_CLAIM)
            })
            .map(|claim| claim.value.as_str())
    }
}

/// ACM ManagedClusterView: a hub-side proxy mirroring one resource from a
/// managed cluster. `status.result` embeds the mirrored object verbatim.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "view.open-cluster-management.io",
    version = "v1beta1",
    kind = "ManagedClusterView",
    status = "ManagedClusterViewStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterViewSpec {
    #[garde(skip)]
    pub scope: ViewScope,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewScope {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Kind of the mirrored resource, e.g. `VolumeReplicationGroup`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval_seconds: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterViewStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
    /// Mirrored object; decoded on demand by the consumer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}
