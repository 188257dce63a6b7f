pub mod application;
pub mod common;
pub mod dr_cluster;
pub mod dr_placement_control;
pub mod dr_policy;
pub mod managed_cluster;
pub mod placement;
pub mod subscription;
pub mod volume_replication_group;
