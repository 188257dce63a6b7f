use std::borrow::Cow;
use std::fmt::Debug;

use garde::Validate;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::{CustomResource, Resource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::constants::ACM_CLUSTER_GROUP;

use super::common::{Selector, StatusCondition};

/// Legacy ACM PlacementRule. Carries its decisions inline; rules scheduled
/// by the DR scheduler are the anchor of the subscription DR workflow.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "apps.open-cluster-management.io",
    version = "v1",
    kind = "PlacementRule",
    status = "PlacementRuleStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRuleSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler_name: Option<String>,
    #[garde(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_replicas: Option<i32>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_selector: Option<Selector>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRuleStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<ClusterDecision>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDecision {
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Current-generation ACM Placement. Decisions live in separate
/// PlacementDecision objects labeled back to the placement.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1beta1",
    kind = "Placement",
    status = "PlacementStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSpec {
    #[garde(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_clusters: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_selected_clusters: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}

/// PlacementDecision objects carry no spec on the wire, so the kube derive
/// (which insists on one) does not fit; the resource is modeled by hand.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDecision {
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlacementDecisionStatus>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDecisionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<ClusterDecision>,
}

impl Resource for PlacementDecision {
    type DynamicType = ();
    type Scope = NamespaceResourceScope;

    fn kind(_: &()) -> Cow<'_, str> {
        "PlacementDecision".into()
    }

    fn group(_: &()) -> Cow<'_, str> {
        ACM_CLUSTER_GROUP.as_str().into()
    }

    fn version(_: &()) -> Cow<'_, str> {
        "v1beta1".into()
    }

    fn plural(_: &()) -> Cow<'_, str> {
        "placementdecisions".into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
