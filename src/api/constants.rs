use std::time::Duration;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref RAMEN_GROUP: String = "ramendr.openshift.io".to_string();
    pub static ref ACM_APPS_GROUP: String = "apps.open-cluster-management.io".to_string();
    pub static ref ACM_CLUSTER_GROUP: String = "cluster.open-cluster-management.io".to_string();
    pub static ref ACM_VIEW_GROUP: String = "view.open-cluster-management.io".to_string();
    pub static ref APP_GROUP: String = "app.k8s.io".to_string();
    pub static ref ARGO_GROUP: String = "argoproj.io".to_string();
}

/// Scheduler name marking a PlacementRule as DR-managed.
pub const DR_SCHEDULER_NAME: &str = "ramen";

/// A DRPolicy names exactly this many DR clusters.
pub const MAX_ALLOWED_CLUSTERS: usize = 2;

/// Hub cluster context.
pub const HUB_CLUSTER_NAME: &str = "local-cluster";

/// ManagedCluster claim carrying the cluster region.
pub const MANAGED_CLUSTER_REGION_CLAIM: &str = "region.open-cluster-management.io";

/// Label tying a PlacementDecision (and ApplicationSet cluster-decision
/// generators) back to its Placement.
pub const PLACEMENT_LABEL: &str = "cluster.open-cluster-management.io/placement";

/// Annotations stamped on VolumeReplicationGroup ManagedClusterViews,
/// identifying the owning DRPlacementControl.
pub const DRPC_NAME_ANNOTATION: &str = "drplacementcontrol.ramendr.openshift.io/drpc-name";
pub const DRPC_NAMESPACE_ANNOTATION: &str =
    "drplacementcontrol.ramendr.openshift.io/drpc-namespace";

/// Condition types reported on a DRPlacementControl.
pub const CONDITION_PEER_READY: &str = "PeerReady";
pub const CONDITION_AVAILABLE: &str = "Available";

/// DRCluster phase while fenced off from its peer.
pub const DR_CLUSTER_FENCED_PHASE: &str = "Fenced";

/// Default refresh period for host-driven polling.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(15);
