use std::fmt::Debug;

use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::constants::DR_CLUSTER_FENCED_PHASE;

use super::common::StatusCondition;

/// Ramen DRCluster. Matching regions across a policy's two clusters imply
/// synchronous replication.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRCluster",
    status = "DRClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[garde(ascii)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_profile_name: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DRClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}

impl DRCluster {
    pub fn is_fenced(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == DR_CLUSTER_FENCED_PHASE)
    }
}
