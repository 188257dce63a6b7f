//! Fixture snapshot shared by the integration tests: one subscription-style
//! application and one ApplicationSet, both protected by the same policy,
//! written as the YAML the hub would serve so the wire contract is part of
//! what the tests exercise.

use chrono::{DateTime, Utc};
use odf_dr_reconciler::api::v1::application::{Application, ApplicationSet};
use odf_dr_reconciler::api::v1::dr_cluster::DRCluster;
use odf_dr_reconciler::api::v1::dr_placement_control::DRPlacementControl;
use odf_dr_reconciler::api::v1::dr_policy::DRPolicy;
use odf_dr_reconciler::api::v1::managed_cluster::{ManagedCluster, ManagedClusterView};
use odf_dr_reconciler::api::v1::placement::{Placement, PlacementDecision, PlacementRule};
use odf_dr_reconciler::api::v1::subscription::Subscription;
use odf_dr_reconciler::{ResourceSnapshot, WatchResult};

/// Clock every fixture timestamp is 90 seconds behind.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

const LAST_SYNC: &str = "2024-03-01T11:58:30Z";

fn yaml<T: serde::de::DeserializeOwned>(raw: &str) -> T {
    serde_yaml::from_str(raw).expect("fixture yaml must deserialize")
}

pub fn dr_policy() -> DRPolicy {
    yaml(
        r#"
apiVersion: ramendr.openshift.io/v1alpha1
kind: DRPolicy
metadata:
  name: gold
spec:
  drClusters:
    - east
    - west
  schedulingInterval: 5m
status:
  phase: Validated
"#,
    )
}

pub fn dr_clusters() -> Vec<DRCluster> {
    vec![
        yaml(
            r#"
apiVersion: ramendr.openshift.io/v1alpha1
kind: DRCluster
metadata:
  name: east
spec:
  region: us-east
  s3ProfileName: s3-east
"#,
        ),
        yaml(
            r#"
apiVersion: ramendr.openshift.io/v1alpha1
kind: DRCluster
metadata:
  name: west
spec:
  region: us-west
  s3ProfileName: s3-west
"#,
        ),
    ]
}

pub fn managed_clusters() -> Vec<ManagedCluster> {
    ["east", "west"]
        .iter()
        .map(|name| {
            yaml(&format!(
                r#"
apiVersion: cluster.open-cluster-management.io/v1
kind: ManagedCluster
metadata:
  name: {name}
spec:
  hubAcceptsClient: true
status:
  clusterClaims:
    - name: region.open-cluster-management.io
      value: us-{name}
"#
            ))
        })
        .collect()
}

pub fn application() -> Application {
    yaml(
        r#"
apiVersion: app.k8s.io/v1beta1
kind: Application
metadata:
  name: busybox
  namespace: busybox
spec:
  componentKinds:
    - group: apps.open-cluster-management.io
      kind: Subscription
  selector:
    matchExpressions:
      - key: app
        operator: In
        values:
          - busybox
"#,
    )
}

pub fn subscription() -> Subscription {
    yaml(
        r#"
apiVersion: apps.open-cluster-management.io/v1
kind: Subscription
metadata:
  name: busybox-sub
  namespace: busybox
  labels:
    app: busybox
spec:
  placement:
    placementRef:
      kind: PlacementRule
      name: busybox-placement
status:
  phase: Propagated
"#,
    )
}

pub fn placement_rule() -> PlacementRule {
    yaml(
        r#"
apiVersion: apps.open-cluster-management.io/v1
kind: PlacementRule
metadata:
  name: busybox-placement
  namespace: busybox
spec:
  schedulerName: ramen
  clusterReplicas: 1
status:
  decisions:
    - clusterName: east
      clusterNamespace: east
"#,
    )
}

pub fn subscription_drpc() -> DRPlacementControl {
    yaml(&format!(
        r#"
apiVersion: ramendr.openshift.io/v1alpha1
kind: DRPlacementControl
metadata:
  name: busybox-drpc
  namespace: busybox
spec:
  drPolicyRef:
    name: gold
  placementRef:
    kind: PlacementRule
    name: busybox-placement
  preferredCluster: east
  failoverCluster: west
  pvcSelector:
    matchLabels:
      app: busybox
status:
  phase: Deployed
  lastGroupSyncTime: "{LAST_SYNC}"
  conditions:
    - type: PeerReady
      status: "True"
    - type: Available
      status: "True"
"#
    ))
}

pub fn app_set() -> ApplicationSet {
    yaml(
        r#"
apiVersion: argoproj.io/v1alpha1
kind: ApplicationSet
metadata:
  name: busybox-appset
  namespace: openshift-gitops
spec:
  generators:
    - clusterDecisionResource:
        labelSelector:
          matchLabels:
            cluster.open-cluster-management.io/placement: appset-placement
  template:
    spec:
      destination:
        namespace: busybox-appset
"#,
    )
}

pub fn placement() -> Placement {
    yaml(
        r#"
apiVersion: cluster.open-cluster-management.io/v1beta1
kind: Placement
metadata:
  name: appset-placement
  namespace: openshift-gitops
spec:
  numberOfClusters: 1
"#,
    )
}

pub fn placement_decision() -> PlacementDecision {
    yaml(
        r#"
apiVersion: cluster.open-cluster-management.io/v1beta1
kind: PlacementDecision
metadata:
  name: appset-placement-decision-1
  namespace: openshift-gitops
  labels:
    cluster.open-cluster-management.io/placement: appset-placement
status:
  decisions:
    - clusterName: east
"#,
    )
}

pub fn app_set_drpc() -> DRPlacementControl {
    yaml(&format!(
        r#"
apiVersion: ramendr.openshift.io/v1alpha1
kind: DRPlacementControl
metadata:
  name: busybox-appset-drpc
  namespace: openshift-gitops
spec:
  drPolicyRef:
    name: gold
  placementRef:
    kind: Placement
    name: appset-placement
  preferredCluster: east
  failoverCluster: west
status:
  phase: Deployed
  lastGroupSyncTime: "{LAST_SYNC}"
  conditions:
    - type: PeerReady
      status: "True"
    - type: Available
      status: "True"
"#
    ))
}

pub fn vrg_view() -> ManagedClusterView {
    yaml(&format!(
        r#"
apiVersion: view.open-cluster-management.io/v1beta1
kind: ManagedClusterView
metadata:
  name: busybox-appset-drpc-vrg-view
  namespace: east
  annotations:
    drplacementcontrol.ramendr.openshift.io/drpc-name: busybox-appset-drpc
    drplacementcontrol.ramendr.openshift.io/drpc-namespace: openshift-gitops
spec:
  scope:
    name: busybox-appset-drpc
    resource: VolumeReplicationGroup
status:
  result:
    apiVersion: ramendr.openshift.io/v1alpha1
    kind: VolumeReplicationGroup
    metadata:
      name: busybox-appset-drpc
      namespace: busybox-appset
    spec:
      replicationState: primary
      async:
        schedulingInterval: 1m
    status:
      protectedPVCs:
        - name: busybox-pvc-1
          lastSyncTime: "{LAST_SYNC}"
        - name: busybox-pvc-2
          lastSyncTime: "{LAST_SYNC}"
"#
    ))
}

/// Fully-loaded snapshot of the whole scenario.
pub fn ready_snapshot() -> ResourceSnapshot {
    ResourceSnapshot {
        applications: WatchResult::loaded(vec![application()]),
        app_sets: WatchResult::loaded(vec![app_set()]),
        subscriptions: WatchResult::loaded(vec![subscription()]),
        placements: WatchResult::loaded(vec![placement()]),
        placement_rules: WatchResult::loaded(vec![placement_rule()]),
        placement_decisions: WatchResult::loaded(vec![placement_decision()]),
        dr_policies: WatchResult::loaded(vec![dr_policy()]),
        dr_clusters: WatchResult::loaded(dr_clusters()),
        dr_placement_controls: WatchResult::loaded(vec![subscription_drpc(), app_set_drpc()]),
        managed_clusters: WatchResult::loaded(managed_clusters()),
        managed_cluster_views: WatchResult::loaded(vec![vrg_view()]),
    }
}
