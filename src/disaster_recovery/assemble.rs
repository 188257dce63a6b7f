//! View-model assembly: the last stage of a reconciliation pass.
//!
//! Everything produced here is an owned, serializable record ready for
//! rendering or JSON transport; nothing borrows into the snapshot. All
//! selection policy lives in the resolvers and the status projector, the
//! assembler only joins their outputs.

use chrono::{DateTime, Utc};
use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::constants::{DRPC_NAME_ANNOTATION, DRPC_NAMESPACE_ANNOTATION};
use crate::api::v1::application::{Application, ApplicationSet};
use crate::api::v1::dr_cluster::DRCluster;
use crate::api::v1::dr_placement_control::{DRPlacementControl, DrAction, DrpcPhase};
use crate::api::v1::dr_policy::DRPolicy;
use crate::api::v1::managed_cluster::{ManagedCluster, ManagedClusterView};
use crate::api::v1::placement::{Placement, PlacementDecision, PlacementRule};
use crate::api::v1::subscription::Subscription;
use crate::api::v1::volume_replication_group::VolumeReplicationGroup;

use super::index::ResourceIndex;
use super::interval::SyncInterval;
use super::resolve::{
    self, DisasterRecoveryResource, PlacementRuleMap, ReplicationType, SubscriptionMap,
};
use super::snapshot::ResourceSnapshot;
use super::status::{self, SlaStatus};

/// Per-DRPC record backing the policy and status columns.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisasterRecoveryInfo {
    pub drpc_name: String,
    pub drpc_namespace: Option<String>,
    pub failover_cluster: Option<String>,
    pub preferred_cluster: Option<String>,
    pub action: Option<DrAction>,
    pub status: DrpcStatusInfo,
    pub policy: Option<PolicyInfo>,
    pub dr_clusters: Vec<DrClusterInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrpcStatusInfo {
    pub is_peer_ready: bool,
    pub is_available: bool,
    pub phase: Option<DrpcPhase>,
    pub last_group_sync_time: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfo {
    pub policy_name: String,
    pub policy_kind: String,
    pub replication_type: ReplicationType,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrClusterInfo {
    pub cluster_name: String,
    pub cluster_namespace: Option<String>,
    pub status: Option<String>,
}

/// Per-application record for subscription-style workloads.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDRInfo {
    pub dr_placement_control: DRPlacementControl,
    pub subscriptions: Vec<String>,
    /// Cluster the workload currently runs on.
    pub cluster_name: String,
}

/// Per-application subscription/placement summary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionAppInfo {
    pub app_name: String,
    pub app_namespace: Option<String>,
    pub subscriptions: Vec<SubscriptionInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub subscription_name: String,
    pub subscription_namespace: Option<String>,
    pub placement: Option<PlacementSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummary {
    pub placement_name: String,
    pub placement_namespace: Option<String>,
    pub placement_kind: String,
    pub cluster_names: Vec<String>,
}

/// Flattened protected-PVC record, one per PVC across all mirrored
/// VolumeReplicationGroups.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedPvcData {
    pub drpc_name: Option<String>,
    pub drpc_namespace: Option<String>,
    pub pvc_name: Option<String>,
    pub pvc_namespace: Option<String>,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub scheduling_interval: Option<SyncInterval>,
    pub sla_status: Option<SlaStatus>,
    pub sla_ratio: Option<f64>,
}

/// DR binding summary for one protected ApplicationSet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedAppSetMap {
    pub app_name: String,
    pub app_namespace: Option<String>,
    pub placement_info: Vec<PlacementInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInfo {
    pub placement_name: Option<String>,
    pub deployment_cluster_name: Option<String>,
    pub drpc_name: Option<String>,
    pub drpc_namespace: Option<String>,
    pub sync_interval: Option<SyncInterval>,
    pub failover_cluster: Option<String>,
    pub preferred_cluster: Option<String>,
    pub last_group_sync_time: Option<DateTime<Utc>>,
    pub phase: Option<DrpcPhase>,
}

/// Declaratively-placed application (the Application object itself acts as
/// the placement) joined with its DR binding and participating clusters.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeclarativeAppDrInfo {
    pub application: Option<Application>,
    pub dr_policy: Option<DRPolicy>,
    pub dr_clusters: Vec<DRCluster>,
    pub dr_placement_control: Option<DRPlacementControl>,
    pub managed_clusters: Vec<ManagedCluster>,
}

/// Output of one full reconciliation pass.
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DerivedState {
    pub disaster_recovery_info: Vec<DisasterRecoveryInfo>,
    pub application_dr_info: Vec<ApplicationDRInfo>,
    pub subscription_app_info: Vec<SubscriptionAppInfo>,
    pub protected_app_sets: Vec<ProtectedAppSetMap>,
    pub protected_pvcs: Vec<ProtectedPvcData>,
    pub declarative_apps: Vec<DeclarativeAppDrInfo>,
}

/// One record per DRPC: policy binding, condition projection, clusters.
pub fn disaster_recovery_info(
    drpcs: &[DRPlacementControl],
    dr_policies: &[DRPolicy],
    dr_clusters: &[DRCluster],
) -> Vec<DisasterRecoveryInfo> {
    drpcs
        .iter()
        .map(|drpc| {
            let policy = resolve::find_dr_policy(drpc, dr_policies);
            let clusters = policy
                .map(|policy| resolve::dr_clusters_for_policy(policy, dr_clusters))
                .unwrap_or_default();
            DisasterRecoveryInfo {
                drpc_name: drpc.name_any(),
                drpc_namespace: drpc.namespace(),
                failover_cluster: drpc.spec.failover_cluster.clone(),
                preferred_cluster: drpc.spec.preferred_cluster.clone(),
                action: drpc.spec.action,
                status: DrpcStatusInfo {
                    is_peer_ready: status::is_peer_ready(drpc),
                    is_available: status::is_available(drpc),
                    phase: drpc.phase(),
                    last_group_sync_time: drpc.last_group_sync_time(),
                },
                policy: policy.map(|policy| PolicyInfo {
                    policy_name: policy.name_any(),
                    policy_kind: DRPolicy::kind(&()).into_owned(),
                    replication_type: resolve::replication_type(clusters.iter().copied()),
                }),
                dr_clusters: clusters
                    .iter()
                    .map(|cluster| DrClusterInfo {
                        cluster_name: cluster.name_any(),
                        cluster_namespace: cluster.namespace(),
                        status: cluster
                            .status
                            .as_ref()
                            .and_then(|status| status.phase.clone()),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// DRPCs attached to an application through its resolved placement rules.
pub fn application_dr_info(
    drpcs: &[DRPlacementControl],
    subscriptions: &SubscriptionMap,
    placement_rules: &PlacementRuleMap,
) -> Vec<ApplicationDRInfo> {
    drpcs
        .iter()
        .filter_map(|drpc| {
            let names = subscriptions.get(&drpc.spec.placement_ref.name)?;
            Some(ApplicationDRInfo {
                dr_placement_control: drpc.clone(),
                subscriptions: names.clone(),
                cluster_name: resolve::placement_cluster_name(placement_rules, drpc).to_string(),
            })
        })
        .collect()
}

fn is_subscription_app(application: &Application) -> bool {
    application
        .spec
        .component_kinds
        .as_ref()
        .is_some_and(|kinds| {
            kinds.iter().any(|component| {
                component.group == crate::api::constants::ACM_APPS_GROUP.as_str()
                    && component.kind == Subscription::kind(&()).as_ref()
            })
        })
}

fn placement_summary_for_subscription(
    subscription: &Subscription,
    namespace: &str,
    placements: &ResourceIndex<'_, Placement>,
    placement_rules: &ResourceIndex<'_, PlacementRule>,
    placement_decisions: &[PlacementDecision],
) -> Option<PlacementSummary> {
    let reference = subscription
        .spec
        .placement
        .as_ref()
        .and_then(|p| p.placement_ref.as_ref())?;
    if reference.is_kind(PlacementRule::kind(&()).as_ref()) {
        let rule = placement_rules.lookup(namespace, &reference.name)?;
        Some(PlacementSummary {
            placement_name: rule.name_any(),
            placement_namespace: rule.namespace(),
            placement_kind: PlacementRule::kind(&()).into_owned(),
            cluster_names: resolve::rule_cluster_names(rule),
        })
    } else if reference.is_kind(Placement::kind(&()).as_ref()) {
        let placement = placements.lookup(namespace, &reference.name)?;
        let cluster_names = resolve::find_placement_decision(placement, placement_decisions)
            .map(resolve::deployment_cluster_names)
            .unwrap_or_default();
        Some(PlacementSummary {
            placement_name: placement.name_any(),
            placement_namespace: placement.namespace(),
            placement_kind: Placement::kind(&()).into_owned(),
            cluster_names,
        })
    } else {
        None
    }
}

/// Per-application subscription/placement summaries for subscription-style
/// applications (both placement generations resolved).
pub fn subscription_app_info(
    applications: &[Application],
    subscriptions: &[Subscription],
    placements: &[Placement],
    placement_rules: &[PlacementRule],
    placement_decisions: &[PlacementDecision],
) -> Vec<SubscriptionAppInfo> {
    let subscription_index = ResourceIndex::build(subscriptions);
    let placement_index = ResourceIndex::build(placements);
    let rule_index = ResourceIndex::build(placement_rules);

    applications
        .iter()
        .filter(|application| is_subscription_app(application))
        .map(|application| {
            let namespace = application.namespace().unwrap_or_default();
            let mut subscriptions: Vec<SubscriptionInfo> = subscription_index
                .in_namespace(&namespace)
                .filter(|subscription| {
                    resolve::match_application_to_subscription(subscription, application)
                })
                .map(|subscription| SubscriptionInfo {
                    subscription_name: subscription.name_any(),
                    subscription_namespace: subscription.namespace(),
                    placement: placement_summary_for_subscription(
                        subscription,
                        &namespace,
                        &placement_index,
                        &rule_index,
                        placement_decisions,
                    ),
                })
                .collect();
            // Index iteration order is arbitrary; passes must be comparable.
            subscriptions.sort_by(|a, b| a.subscription_name.cmp(&b.subscription_name));
            SubscriptionAppInfo {
                app_name: application.name_any(),
                app_namespace: application.namespace(),
                subscriptions,
            }
        })
        .collect()
}

/// Flattens protected PVCs out of VolumeReplicationGroup-scoped views.
/// Views whose embedded result does not decode are skipped with a warning.
pub fn protected_pvcs_from_views(views: &[ManagedClusterView]) -> Vec<ProtectedPvcData> {
    views
        .iter()
        .filter(|view| {
            view.spec.scope.resource.as_deref() == Some(VolumeReplicationGroup::kind(&()).as_ref())
        })
        .flat_map(|view| {
            let annotations = view.annotations();
            let drpc_name = annotations.get(DRPC_NAME_ANNOTATION).cloned();
            let drpc_namespace = annotations.get(DRPC_NAMESPACE_ANNOTATION).cloned();
            let vrg = view
                .status
                .as_ref()
                .and_then(|status| status.result.clone())
                .and_then(|result| {
                    serde_json::from_value::<VolumeReplicationGroup>(result)
                        .map_err(|error| {
                            warn!(
                                view = %view.name_any(),
                                %error,
                                "discarding managed cluster view with undecodable result"
                            );
                        })
                        .ok()
                });
            let Some(vrg) = vrg else {
                return Vec::new();
            };
            let scheduling_interval = vrg
                .spec
                .async_spec
                .as_ref()
                .and_then(|spec| spec.scheduling_interval.as_deref())
                .map(SyncInterval::parse);
            let pvc_namespace = vrg.namespace();
            vrg.status
                .as_ref()
                .and_then(|status| status.protected_pvcs.as_ref())
                .map(|pvcs| {
                    pvcs.iter()
                        .map(|pvc| ProtectedPvcData {
                            drpc_name: drpc_name.clone(),
                            drpc_namespace: drpc_namespace.clone(),
                            pvc_name: pvc.name.clone(),
                            pvc_namespace: pvc_namespace.clone(),
                            last_sync_time: pvc.last_sync_time,
                            scheduling_interval,
                            sla_status: None,
                            sla_ratio: None,
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect()
}

/// Keeps the PVCs whose owning DRPC backs one of the protected app sets.
pub fn filter_pvc_data_using_app_sets(
    pvcs: &[ProtectedPvcData],
    protected_app_sets: &[ProtectedAppSetMap],
) -> Vec<ProtectedPvcData> {
    pvcs.iter()
        .filter(|pvc| {
            protected_app_sets.iter().any(|app_set| {
                app_set.placement_info.first().is_some_and(|placement| {
                    placement.drpc_name == pvc.drpc_name
                        && placement.drpc_namespace == pvc.drpc_namespace
                })
            })
        })
        .cloned()
        .collect()
}

/// Classifies replication lag on each flattened PVC record.
pub fn apply_sla(pvcs: &mut [ProtectedPvcData], now: DateTime<Utc>) {
    for pvc in pvcs {
        if let (Some(last_sync), Some(interval)) = (pvc.last_sync_time, pvc.scheduling_interval) {
            let (sla, ratio) = status::sla_status(last_sync, interval, now);
            pvc.sla_status = Some(sla);
            pvc.sla_ratio = Some(ratio);
        }
    }
}

/// DR binding summaries for ApplicationSets that are actually protected,
/// i.e. whose generating Placement has a DRPC bound to it.
pub fn protected_app_sets(
    app_sets: &[ApplicationSet],
    placements: &[Placement],
    placement_decisions: &[PlacementDecision],
    dr_resources: &[DisasterRecoveryResource],
) -> Vec<ProtectedAppSetMap> {
    let placement_index = ResourceIndex::build(placements);
    app_sets
        .iter()
        .filter_map(|app_set| {
            let namespace = app_set.namespace().unwrap_or_default();
            let placement_name = resolve::app_set_placement_name(app_set)?;
            let narrowed =
                resolve::find_dr_resource_using_placement(placement_name, &namespace, dr_resources)?;
            let drpc = narrowed.dr_placement_controls.first()?;
            let deployment_cluster_name = placement_index
                .lookup(&namespace, placement_name)
                .and_then(|placement| {
                    resolve::find_placement_decision(placement, placement_decisions)
                })
                .and_then(|decision| resolve::deployment_cluster_names(decision).into_iter().next());
            Some(ProtectedAppSetMap {
                app_name: app_set.name_any(),
                app_namespace: app_set.namespace(),
                placement_info: vec![PlacementInfo {
                    placement_name: Some(placement_name.to_string()),
                    deployment_cluster_name,
                    drpc_name: Some(drpc.name_any()),
                    drpc_namespace: drpc.namespace(),
                    sync_interval: narrowed
                        .dr_policy
                        .as_ref()
                        .map(|policy| policy.sync_interval()),
                    failover_cluster: drpc.spec.failover_cluster.clone(),
                    preferred_cluster: drpc.spec.preferred_cluster.clone(),
                    last_group_sync_time: drpc.last_group_sync_time(),
                    phase: drpc.phase(),
                }],
            })
        })
        .collect()
}

/// Declaratively-placed applications joined with their DR binding. The
/// Application object doubles as the placement for these workloads.
pub fn declarative_app_dr_info(
    applications: &[Application],
    dr_resources: &[DisasterRecoveryResource],
    managed_clusters: &[ManagedCluster],
) -> Vec<DeclarativeAppDrInfo> {
    applications
        .iter()
        .map(|application| {
            let namespace = application.namespace().unwrap_or_default();
            let narrowed = resolve::find_dr_resource_using_placement(
                &application.name_any(),
                &namespace,
                dr_resources,
            )
            .unwrap_or_default();
            DeclarativeAppDrInfo {
                managed_clusters: resolve::managed_clusters_for_dr_clusters(
                    &narrowed.dr_clusters,
                    managed_clusters,
                )
                .into_iter()
                .cloned()
                .collect(),
                application: Some(application.clone()),
                dr_placement_control: narrowed.dr_placement_controls.into_iter().next(),
                dr_policy: narrowed.dr_policy,
                dr_clusters: narrowed.dr_clusters,
            }
        })
        .collect()
}

/// One total reconciliation pass over a ready snapshot.
///
/// The derived graph is rebuilt from scratch: there is no state carried
/// between passes and no partial output. A snapshot that is not ready
/// (pending or failed watches) yields the empty state, which is the single
/// error signal surfaced to the presentation layer.
pub fn reconcile(snapshot: &ResourceSnapshot, now: DateTime<Utc>) -> DerivedState {
    if !snapshot.is_ready() {
        debug!(
            loaded = snapshot.is_loaded(),
            load_error = snapshot.has_load_error(),
            "snapshot not ready, returning empty derived state"
        );
        return DerivedState::default();
    }

    let drpcs = &snapshot.dr_placement_controls.data;
    let dr_policies = &snapshot.dr_policies.data;
    let dr_clusters = &snapshot.dr_clusters.data;

    let rule_map = resolve::dr_placement_rules(&snapshot.placement_rules.data);
    let subscription_index = ResourceIndex::build(&snapshot.subscriptions.data);

    let mut application_info = Vec::new();
    for application in &snapshot.applications.data {
        let subscription_map =
            resolve::dr_subscriptions(application, &subscription_index, &rule_map);
        application_info.extend(application_dr_info(drpcs, &subscription_map, &rule_map));
    }

    let dr_resources = resolve::format_dr_resources(dr_policies, dr_clusters, drpcs);
    let app_sets = protected_app_sets(
        &snapshot.app_sets.data,
        &snapshot.placements.data,
        &snapshot.placement_decisions.data,
        &dr_resources,
    );

    let all_pvcs = protected_pvcs_from_views(&snapshot.managed_cluster_views.data);
    let mut protected_pvcs = filter_pvc_data_using_app_sets(&all_pvcs, &app_sets);
    apply_sla(&mut protected_pvcs, now);

    DerivedState {
        disaster_recovery_info: disaster_recovery_info(drpcs, dr_policies, dr_clusters),
        application_dr_info: application_info,
        subscription_app_info: subscription_app_info(
            &snapshot.applications.data,
            &snapshot.subscriptions.data,
            &snapshot.placements.data,
            &snapshot.placement_rules.data,
            &snapshot.placement_decisions.data,
        ),
        protected_app_sets: app_sets,
        protected_pvcs,
        declarative_apps: declarative_app_dr_info(
            &snapshot.applications.data,
            &dr_resources,
            &snapshot.managed_clusters.data,
        ),
    }
}
