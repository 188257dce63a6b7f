use std::fmt::Debug;

use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::TypedObjectReference;

/// ACM Subscription. Membership in an Application is decided by the
/// Application's match expressions over this object's labels; the placement
/// reference points at the Placement or PlacementRule deploying it.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "apps.open-cluster-management.io",
    version = "v1",
    kind = "Subscription",
    status = "SubscriptionStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<SubscriptionPlacement>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlacement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_ref: Option<TypedObjectReference>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
