//! Input contract with the host's watch layer.
//!
//! The host hands over one `[data, loaded, loadError]` triple per resource
//! collection. This crate never fetches anything itself; a snapshot is a
//! read-only view over the host's cache, replaced wholesale between passes.

use crate::api::v1::application::{Application, ApplicationSet};
use crate::api::v1::dr_cluster::DRCluster;
use crate::api::v1::dr_placement_control::DRPlacementControl;
use crate::api::v1::dr_policy::DRPolicy;
use crate::api::v1::managed_cluster::{ManagedCluster, ManagedClusterView};
use crate::api::v1::placement::{Placement, PlacementDecision, PlacementRule};
use crate::api::v1::subscription::Subscription;

/// One watched collection as the host reports it.
#[derive(Debug)]
pub struct WatchResult<T> {
    pub data: Vec<T>,
    pub loaded: bool,
    /// Opaque error from the watch layer; any value poisons the pass.
    pub load_error: Option<anyhow::Error>,
}

impl<T> Default for WatchResult<T> {
    fn default() -> Self {
        WatchResult::pending()
    }
}

impl<T> WatchResult<T> {
    pub fn loaded(data: Vec<T>) -> Self {
        WatchResult {
            data,
            loaded: true,
            load_error: None,
        }
    }

    pub fn pending() -> Self {
        WatchResult {
            data: Vec::new(),
            loaded: false,
            load_error: None,
        }
    }

    pub fn failed(error: anyhow::Error) -> Self {
        WatchResult {
            data: Vec::new(),
            loaded: true,
            load_error: Some(error),
        }
    }

    pub fn ok(&self) -> bool {
        self.loaded && self.load_error.is_none()
    }
}

/// Everything one reconciliation pass reads, all collections together.
#[derive(Debug, Default)]
pub struct ResourceSnapshot {
    pub applications: WatchResult<Application>,
    pub app_sets: WatchResult<ApplicationSet>,
    pub subscriptions: WatchResult<Subscription>,
    pub placements: WatchResult<Placement>,
    pub placement_rules: WatchResult<PlacementRule>,
    pub placement_decisions: WatchResult<PlacementDecision>,
    pub dr_policies: WatchResult<DRPolicy>,
    pub dr_clusters: WatchResult<DRCluster>,
    pub dr_placement_controls: WatchResult<DRPlacementControl>,
    pub managed_clusters: WatchResult<ManagedCluster>,
    pub managed_cluster_views: WatchResult<ManagedClusterView>,
}

impl ResourceSnapshot {
    fn collections(&self) -> [(&bool, &Option<anyhow::Error>); 11] {
        [
            (&self.applications.loaded, &self.applications.load_error),
            (&self.app_sets.loaded, &self.app_sets.load_error),
            (&self.subscriptions.loaded, &self.subscriptions.load_error),
            (&self.placements.loaded, &self.placements.load_error),
            (&self.placement_rules.loaded, &self.placement_rules.load_error),
            (
                &self.placement_decisions.loaded,
                &self.placement_decisions.load_error,
            ),
            (&self.dr_policies.loaded, &self.dr_policies.load_error),
            (&self.dr_clusters.loaded, &self.dr_clusters.load_error),
            (
                &self.dr_placement_controls.loaded,
                &self.dr_placement_controls.load_error,
            ),
            (&self.managed_clusters.loaded, &self.managed_clusters.load_error),
            (
                &self.managed_cluster_views.loaded,
                &self.managed_cluster_views.load_error,
            ),
        ]
    }

    /// All collections delivered at least once.
    pub fn is_loaded(&self) -> bool {
        self.collections().iter().all(|(loaded, _)| **loaded)
    }

    /// Any collection reported a watch failure.
    pub fn has_load_error(&self) -> bool {
        self.collections().iter().any(|(_, error)| error.is_some())
    }

    /// A pass may derive output only from a ready snapshot.
    pub fn is_ready(&self) -> bool {
        self.is_loaded() && !self.has_load_error()
    }
}
