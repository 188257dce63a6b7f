use std::fmt::Debug;

use garde::Validate;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Selector, StatusCondition};

/// Inventory application (`app.k8s.io`). Its selector is matched against
/// Subscription labels to discover which subscriptions deploy it.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "app.k8s.io",
    version = "v1beta1",
    kind = "Application",
    status = "ApplicationStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    /// Resource kinds composing the application. Subscription-style apps
    /// list the ACM Subscription kind here.
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_kinds: Option<Vec<ComponentKind>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentKind {
    pub group: String,
    pub kind: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// Target cluster for declaratively-placed applications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<StatusCondition>>,
}

/// ArgoCD ApplicationSet (`argoproj.io`). The cluster-decision generator's
/// placement label is the only part of the spec this crate reads.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "argoproj.io",
    version = "v1alpha1",
    kind = "ApplicationSet",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetSpec {
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<ApplicationSetGenerator>,
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<ApplicationSetTemplate>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetGenerator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_decision_resource: Option<ClusterDecisionResource>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDecisionResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requeue_after_seconds: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<ApplicationSetTemplateSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetTemplateSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ApplicationDestination>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
