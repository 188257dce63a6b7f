use std::fmt::Debug;

use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::disaster_recovery::interval::SyncInterval;

use super::common::{Selector, StatusCondition};

/// Ramen DRPolicy: a pair of peer clusters plus the replication cadence.
/// A `"0m"` interval means synchronous replication.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPolicy",
    status = "DRPolicyStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicySpec {
    #[garde(length(min = 2, max = 2))]
    pub dr_clusters: Vec<String>,
    #[garde(custom(valid_sync_interval))]
    pub scheduling_interval: String,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_class_selector: Option<Selector>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicyStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}

fn valid_sync_interval(value: &str, _: &()) -> garde::Result {
    SyncInterval::parse_strict(value)
        .map(|_| ())
        .map_err(|e| garde::Error::new(e.to_string()))
}

impl DRPolicy {
    /// Parsed scheduling interval; malformed values fall back leniently.
    pub fn sync_interval(&self) -> SyncInterval {
        SyncInterval::parse(&self.spec.scheduling_interval)
    }
}
