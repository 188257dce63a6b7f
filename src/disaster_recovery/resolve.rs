//! Relationship resolvers joining applications, placements, subscriptions
//! and the Ramen DR objects bound to them.
//!
//! Every function here is a pure, single-pass transformation over one
//! reconciliation snapshot. Unresolved references are valid, displayable
//! states and come back as `None`/empty, never as errors.

use std::collections::HashMap;

use kube::{Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::constants::{DR_SCHEDULER_NAME, PLACEMENT_LABEL};
use crate::api::v1::application::{Application, ApplicationSet};
use crate::api::v1::common::{Operator, TypedObjectReference};
use crate::api::v1::dr_cluster::DRCluster;
use crate::api::v1::dr_placement_control::DRPlacementControl;
use crate::api::v1::dr_policy::DRPolicy;
use crate::api::v1::managed_cluster::ManagedCluster;
use crate::api::v1::placement::{Placement, PlacementDecision, PlacementRule};
use crate::api::v1::subscription::Subscription;

use super::index::ResourceIndex;
use super::interval::SyncInterval;

/// Placement-rule name -> cluster name of its first decision.
pub type PlacementRuleMap = HashMap<String, String>;

/// Placement-rule name -> names of the subscriptions it deploys.
pub type SubscriptionMap = HashMap<String, Vec<String>>;

/// Replication mode between the two clusters of a policy.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationType {
    Sync,
    Async,
}

/// One DRPolicy grouped with the clusters and placement controls bound to
/// it, the shape every downstream consumer works from.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DisasterRecoveryResource {
    pub dr_policy: Option<DRPolicy>,
    pub dr_clusters: Vec<DRCluster>,
    pub dr_placement_controls: Vec<DRPlacementControl>,
}

fn placement_ref(subscription: &Subscription) -> Option<&TypedObjectReference> {
    subscription
        .spec
        .placement
        .as_ref()
        .and_then(|p| p.placement_ref.as_ref())
}

/// Rules scheduled by the DR scheduler, keyed by name, valued with the
/// cluster the rule currently places on (empty when undecided).
pub fn dr_placement_rules(placement_rules: &[PlacementRule]) -> PlacementRuleMap {
    placement_rules
        .iter()
        .filter(|rule| rule.spec.scheduler_name.as_deref() == Some(DR_SCHEDULER_NAME))
        .map(|rule| {
            let cluster = rule
                .status
                .as_ref()
                .and_then(|s| s.decisions.as_ref())
                .and_then(|decisions| decisions.first())
                .map(|decision| decision.cluster_name.clone())
                .unwrap_or_default();
            (rule.name_any(), cluster)
        })
        .collect()
}

/// Applies the application's selector to one subscription's labels.
///
/// Operator semantics follow the Kubernetes label-selector contract
/// literally: `In`/`NotIn` test the subscription's value for the
/// expression key against the expression values; `Exists`/`DoesNotExist`
/// test key presence and additionally require the expression to carry no
/// `values` list at all. An application without match expressions matches
/// nothing.
pub fn match_application_to_subscription(
    subscription: &Subscription,
    application: &Application,
) -> bool {
    let Some(expressions) = application
        .spec
        .selector
        .as_ref()
        .and_then(|selector| selector.match_expressions.as_ref())
    else {
        return false;
    };
    let labels = subscription.labels();
    expressions.iter().all(|expr| {
        let value_listed = labels
            .get(&expr.key)
            .is_some_and(|value| expr.values.as_ref().is_some_and(|values| values.contains(value)));
        match expr.operator {
            Operator::In => value_listed,
            Operator::NotIn => !value_listed,
            Operator::Exists => labels.contains_key(&expr.key) && expr.values.is_none(),
            Operator::DoesNotExist => !labels.contains_key(&expr.key) && expr.values.is_none(),
        }
    })
}

/// Subscriptions in the application's namespace that ride a DR-scheduled
/// placement rule and match the application's selector, grouped by rule
/// name. Subscriptions that resolve to no known rule are dropped.
pub fn dr_subscriptions(
    application: &Application,
    subscriptions: &ResourceIndex<'_, Subscription>,
    placement_rules: &PlacementRuleMap,
) -> SubscriptionMap {
    let namespace = application.namespace().unwrap_or_default();
    let mut map = SubscriptionMap::new();
    for subscription in subscriptions.in_namespace(&namespace) {
        let matched = placement_ref(subscription).filter(|reference| {
            reference.is_kind(PlacementRule::kind(&()).as_ref())
                && placement_rules.contains_key(&reference.name)
                && match_application_to_subscription(subscription, application)
        });
        match matched {
            Some(reference) => map
                .entry(reference.name.clone())
                .or_default()
                .push(subscription.name_any()),
            None => debug!(
                subscription = %subscription.name_any(),
                application = %application.name_any(),
                "subscription has no matching DR placement rule, dropping"
            ),
        }
    }
    // Index iteration order is arbitrary; passes must be comparable.
    for names in map.values_mut() {
        names.sort();
    }
    map
}

/// Cluster the DRPC's placement rule currently places on, or empty.
pub fn placement_cluster_name<'a>(
    placement_rules: &'a PlacementRuleMap,
    drpc: &DRPlacementControl,
) -> &'a str {
    placement_rules
        .get(&drpc.spec.placement_ref.name)
        .map(String::as_str)
        .unwrap_or_default()
}

/// Exact-name policy lookup. `None` is a displayable "no policy" state.
pub fn find_dr_policy<'a>(
    drpc: &DRPlacementControl,
    dr_policies: &'a [DRPolicy],
) -> Option<&'a DRPolicy> {
    dr_policies
        .iter()
        .find(|policy| policy.name_any() == drpc.spec.dr_policy_ref.name)
}

/// Placement controls bound to the given policy by name.
pub fn find_drpcs_using_policy<'a>(
    drpcs: &'a [DRPlacementControl],
    dr_policy: &DRPolicy,
) -> Vec<&'a DRPlacementControl> {
    drpcs
        .iter()
        .filter(|drpc| drpc.spec.dr_policy_ref.name == dr_policy.name_any())
        .collect()
}

/// The subset of known DR clusters a policy names, input order preserved.
pub fn dr_clusters_for_policy<'a>(
    dr_policy: &DRPolicy,
    dr_clusters: &'a [DRCluster],
) -> Vec<&'a DRCluster> {
    dr_clusters
        .iter()
        .filter(|cluster| dr_policy.spec.dr_clusters.contains(&cluster.name_any()))
        .collect()
}

/// Replication mode implied by the scheduling interval alone: a zero
/// interval means synchronous replication.
pub fn replication_type_from_interval(interval: SyncInterval) -> ReplicationType {
    if interval.is_sync() {
        ReplicationType::Sync
    } else {
        ReplicationType::Async
    }
}

/// Sync when every resolved cluster shares the first cluster's region
/// (vacuously Sync for zero or one clusters), Async otherwise.
pub fn replication_type<'a>(
    dr_clusters: impl IntoIterator<Item = &'a DRCluster>,
) -> ReplicationType {
    let mut clusters = dr_clusters.into_iter();
    let Some(first) = clusters.next() else {
        return ReplicationType::Sync;
    };
    if clusters.all(|cluster| cluster.spec.region == first.spec.region) {
        ReplicationType::Sync
    } else {
        ReplicationType::Async
    }
}

/// The PlacementDecision labeled back to a Placement, in its namespace.
pub fn find_placement_decision<'a>(
    placement: &Placement,
    decisions: &'a [PlacementDecision],
) -> Option<&'a PlacementDecision> {
    decisions.iter().find(|decision| {
        decision.labels().get(PLACEMENT_LABEL) == placement.metadata.name.as_ref()
            && decision.metadata.namespace == placement.metadata.namespace
    })
}

/// Cluster names a decision currently selects.
pub fn deployment_cluster_names(decision: &PlacementDecision) -> Vec<String> {
    decision
        .status
        .as_ref()
        .map(|status| {
            status
                .decisions
                .iter()
                .map(|entry| entry.cluster_name.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Cluster names a legacy placement rule currently selects.
pub fn rule_cluster_names(rule: &PlacementRule) -> Vec<String> {
    rule.status
        .as_ref()
        .and_then(|status| status.decisions.as_ref())
        .map(|decisions| {
            decisions
                .iter()
                .map(|entry| entry.cluster_name.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Picks the deployment cluster (or its peer) out of a cluster list.
pub fn find_cluster<'a, K: Resource>(
    clusters: &'a [K],
    deployment_cluster_name: &str,
    is_deployment_cluster: bool,
) -> Option<&'a K> {
    clusters.iter().find(|cluster| {
        let is_deployment = cluster.meta().name.as_deref() == Some(deployment_cluster_name);
        if is_deployment_cluster {
            is_deployment
        } else {
            !is_deployment
        }
    })
}

/// First policy cluster that a placement decision also selects.
pub fn matching_clusters<'a>(
    dr_cluster_names: &'a [String],
    decision_clusters: &[String],
) -> Option<&'a str> {
    dr_cluster_names
        .iter()
        .find(|name| decision_clusters.contains(name))
        .map(String::as_str)
}

/// Managed clusters participating in DR, i.e. named by some DRCluster.
pub fn managed_clusters_for_dr_clusters<'a>(
    dr_clusters: &[DRCluster],
    managed_clusters: &'a [ManagedCluster],
) -> Vec<&'a ManagedCluster> {
    managed_clusters
        .iter()
        .filter(|managed| {
            dr_clusters
                .iter()
                .any(|dr_cluster| dr_cluster.name_any() == managed.name_any())
        })
        .collect()
}

/// Namespace the ApplicationSet deploys its workload into on the remote
/// cluster.
pub fn remote_namespace_from_app_set(app_set: &ApplicationSet) -> Option<&str> {
    app_set
        .spec
        .template
        .as_ref()
        .and_then(|template| template.spec.as_ref())
        .and_then(|spec| spec.destination.as_ref())
        .and_then(|destination| destination.namespace.as_deref())
}

/// Placement an ApplicationSet is generated from, read off its
/// cluster-decision generator's label selector.
pub fn app_set_placement_name(app_set: &ApplicationSet) -> Option<&str> {
    app_set.spec.generators.iter().find_map(|generator| {
        generator
            .cluster_decision_resource
            .as_ref()
            .and_then(|resource| resource.label_selector.as_ref())
            .and_then(|selector| selector.match_labels.as_ref())
            .and_then(|labels| labels.get(PLACEMENT_LABEL))
            .map(String::as_str)
    })
}

/// Groups each policy with its clusters and placement controls.
pub fn format_dr_resources(
    dr_policies: &[DRPolicy],
    dr_clusters: &[DRCluster],
    drpcs: &[DRPlacementControl],
) -> Vec<DisasterRecoveryResource> {
    dr_policies
        .iter()
        .map(|policy| DisasterRecoveryResource {
            dr_clusters: dr_clusters_for_policy(policy, dr_clusters)
                .into_iter()
                .cloned()
                .collect(),
            dr_placement_controls: find_drpcs_using_policy(drpcs, policy)
                .into_iter()
                .cloned()
                .collect(),
            dr_policy: Some(policy.clone()),
        })
        .collect()
}

/// Narrows the grouped resources down to the DRPC bound to one Placement
/// in one workload namespace. Used for declaratively-placed applications,
/// whose placement is referenced by kind `Placement`.
pub fn find_dr_resource_using_placement(
    placement_name: &str,
    workload_namespace: &str,
    dr_resources: &[DisasterRecoveryResource],
) -> Option<DisasterRecoveryResource> {
    dr_resources.iter().find_map(|resource| {
        let drpc = resource.dr_placement_controls.iter().find(|drpc| {
            let reference = &drpc.spec.placement_ref;
            reference.is_kind(Placement::kind(&()).as_ref())
                && reference.name == placement_name
                && drpc.namespace().as_deref() == Some(workload_namespace)
        })?;
        Some(DisasterRecoveryResource {
            dr_policy: resource.dr_policy.clone(),
            dr_clusters: resource.dr_clusters.clone(),
            dr_placement_controls: vec![drpc.clone()],
        })
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::rstest;

    use crate::api::v1::application::ApplicationSpec;
    use crate::api::v1::common::{MatchExpression, Selector};
    use crate::api::v1::dr_cluster::DRClusterSpec;
    use crate::api::v1::dr_placement_control::DRPlacementControlSpec;
    use crate::api::v1::dr_policy::DRPolicySpec;
    use crate::api::v1::placement::{ClusterDecision, PlacementRuleSpec, PlacementRuleStatus};
    use crate::api::v1::subscription::{SubscriptionPlacement, SubscriptionSpec};

    use super::*;

    fn meta(namespace: &str, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    fn application(namespace: &str, expressions: Option<Vec<MatchExpression>>) -> Application {
        Application {
            metadata: meta(namespace, "app"),
            spec: ApplicationSpec {
                selector: Some(Selector {
                    match_labels: None,
                    match_expressions: expressions,
                }),
                component_kinds: None,
            },
            status: None,
        }
    }

    fn subscription(namespace: &str, name: &str, labels: &[(&str, &str)], rule: &str) -> Subscription {
        Subscription {
            metadata: ObjectMeta {
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..meta(namespace, name)
            },
            spec: SubscriptionSpec {
                name: None,
                placement: Some(SubscriptionPlacement {
                    placement_ref: Some(TypedObjectReference {
                        kind: Some("PlacementRule".to_string()),
                        name: rule.to_string(),
                        namespace: None,
                    }),
                }),
            },
            status: None,
        }
    }

    fn placement_rule(namespace: &str, name: &str, scheduler: Option<&str>, cluster: &str) -> PlacementRule {
        PlacementRule {
            metadata: meta(namespace, name),
            spec: PlacementRuleSpec {
                scheduler_name: scheduler.map(str::to_string),
                cluster_replicas: None,
                cluster_selector: None,
            },
            status: Some(PlacementRuleStatus {
                decisions: Some(vec![ClusterDecision {
                    cluster_name: cluster.to_string(),
                    cluster_namespace: None,
                    reason: None,
                }]),
            }),
        }
    }

    fn dr_cluster(name: &str, region: &str) -> DRCluster {
        DRCluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: DRClusterSpec {
                region: Some(region.to_string()),
                s3_profile_name: None,
            },
            status: None,
        }
    }

    fn expr(key: &str, operator: Operator, values: Option<&[&str]>) -> MatchExpression {
        MatchExpression {
            key: key.to_string(),
            operator,
            values: values.map(|vals| vals.iter().map(|v| v.to_string()).collect()),
        }
    }

    #[rstest]
    #[case(Operator::In, Some(&["web"][..]), true)]
    #[case(Operator::In, Some(&["db"][..]), false)]
    #[case(Operator::In, None, false)]
    #[case(Operator::NotIn, Some(&["db"][..]), true)]
    #[case(Operator::NotIn, Some(&["web"][..]), false)]
    #[case(Operator::Exists, None, true)]
    #[case(Operator::Exists, Some(&["web"][..]), false)]
    #[case(Operator::DoesNotExist, None, false)]
    fn operator_truth_table(
        #[case] operator: Operator,
        #[case] values: Option<&[&str]>,
        #[case] expected: bool,
    ) {
        let app = application("ns", Some(vec![expr("app", operator, values)]));
        let sub = subscription("ns", "sub", &[("app", "web")], "rule");
        assert_eq!(match_application_to_subscription(&sub, &app), expected);
    }

    #[test]
    fn missing_label_inverts_value_operators() {
        let sub = subscription("ns", "sub", &[], "rule");
        let in_app = application("ns", Some(vec![expr("app", Operator::In, Some(&["web"]))]));
        let not_in_app = application("ns", Some(vec![expr("app", Operator::NotIn, Some(&["web"]))]));
        assert!(!match_application_to_subscription(&sub, &in_app));
        assert!(match_application_to_subscription(&sub, &not_in_app));
    }

    #[test]
    fn swapping_in_and_not_in_inverts_membership() {
        let sub = subscription("ns", "sub", &[("tier", "gold")], "rule");
        for values in [Some(&["gold"][..]), Some(&["silver"][..])] {
            let with_in = application("ns", Some(vec![expr("tier", Operator::In, values)]));
            let with_not_in = application("ns", Some(vec![expr("tier", Operator::NotIn, values)]));
            assert_ne!(
                match_application_to_subscription(&sub, &with_in),
                match_application_to_subscription(&sub, &with_not_in),
            );
        }
    }

    #[test]
    fn selector_without_expressions_matches_nothing() {
        let sub = subscription("ns", "sub", &[("app", "web")], "rule");
        let no_expressions = application("ns", None);
        let empty_expressions = application("ns", Some(vec![]));
        assert!(!match_application_to_subscription(&sub, &no_expressions));
        // An explicitly empty expression list is vacuously true.
        assert!(match_application_to_subscription(&sub, &empty_expressions));
    }

    #[test]
    fn dr_placement_rules_keep_only_dr_scheduled() {
        let rules = vec![
            placement_rule("ns", "dr-rule", Some(DR_SCHEDULER_NAME), "east"),
            placement_rule("ns", "other-rule", Some("default"), "west"),
            placement_rule("ns", "no-scheduler", None, "west"),
        ];
        let map = dr_placement_rules(&rules);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("dr-rule").map(String::as_str), Some("east"));
    }

    #[test]
    fn dr_subscriptions_group_by_rule_and_drop_unmatched() {
        let app = application(
            "app-ns",
            Some(vec![expr("app", Operator::In, Some(&["web"]))]),
        );
        let subs = vec![
            subscription("app-ns", "sub-1", &[("app", "web")], "dr-rule"),
            subscription("app-ns", "sub-2", &[("app", "web")], "dr-rule"),
            subscription("app-ns", "sub-other-rule", &[("app", "web")], "unknown-rule"),
            subscription("app-ns", "sub-no-match", &[("app", "db")], "dr-rule"),
            subscription("other-ns", "sub-elsewhere", &[("app", "web")], "dr-rule"),
        ];
        let rules = vec![placement_rule("app-ns", "dr-rule", Some(DR_SCHEDULER_NAME), "east")];
        let rule_map = dr_placement_rules(&rules);
        let index = ResourceIndex::build(&subs);

        let grouped = dr_subscriptions(&app, &index, &rule_map);
        assert_eq!(grouped.len(), 1);
        let mut names = grouped.get("dr-rule").cloned().unwrap();
        names.sort();
        assert_eq!(names, vec!["sub-1".to_string(), "sub-2".to_string()]);
    }

    #[rstest]
    #[case(&["us-east", "us-east"], ReplicationType::Sync)]
    #[case(&["us-east", "us-west"], ReplicationType::Async)]
    #[case(&["us-east"], ReplicationType::Sync)]
    #[case(&[], ReplicationType::Sync)]
    fn replication_type_by_region(#[case] regions: &[&str], #[case] expected: ReplicationType) {
        let clusters: Vec<DRCluster> = regions
            .iter()
            .enumerate()
            .map(|(i, region)| dr_cluster(&format!("cluster-{i}"), region))
            .collect();
        assert_eq!(replication_type(&clusters), expected);
    }

    #[rstest]
    #[case("0m", ReplicationType::Sync)]
    #[case("5m", ReplicationType::Async)]
    #[case("1d", ReplicationType::Async)]
    fn replication_type_by_interval(#[case] interval: &str, #[case] expected: ReplicationType) {
        assert_eq!(
            replication_type_from_interval(SyncInterval::parse(interval)),
            expected
        );
    }

    #[test]
    fn cluster_helpers_pick_deployment_and_peer() {
        let clusters = vec![dr_cluster("east", "us-east"), dr_cluster("west", "us-west")];
        let deployment = find_cluster(&clusters, "east", true).unwrap();
        let peer = find_cluster(&clusters, "east", false).unwrap();
        assert_eq!(deployment.name_any(), "east");
        assert_eq!(peer.name_any(), "west");
        assert!(find_cluster(&clusters, "missing", true).is_none());

        let policy_clusters = vec!["east".to_string(), "west".to_string()];
        let decisions = vec!["west".to_string()];
        assert_eq!(matching_clusters(&policy_clusters, &decisions), Some("west"));
        assert_eq!(matching_clusters(&policy_clusters, &[]), None);
    }

    #[test]
    fn policy_resolution_is_exact_name_match() {
        let policy = DRPolicy {
            metadata: ObjectMeta {
                name: Some("gold-policy".to_string()),
                ..Default::default()
            },
            spec: DRPolicySpec {
                dr_clusters: vec!["east".to_string(), "west".to_string()],
                scheduling_interval: "5m".to_string(),
                replication_class_selector: None,
            },
            status: None,
        };
        let drpc = DRPlacementControl {
            metadata: meta("app-ns", "app-drpc"),
            spec: DRPlacementControlSpec {
                dr_policy_ref: TypedObjectReference {
                    name: "gold-policy".to_string(),
                    ..Default::default()
                },
                placement_ref: TypedObjectReference {
                    name: "dr-rule".to_string(),
                    ..Default::default()
                },
                preferred_cluster: None,
                failover_cluster: None,
                action: None,
                pvc_selector: None,
            },
            status: None,
        };

        let policies = vec![policy];
        assert!(find_dr_policy(&drpc, &policies).is_some());
        assert_eq!(find_drpcs_using_policy(std::slice::from_ref(&drpc), &policies[0]).len(), 1);

        let clusters = vec![
            dr_cluster("east", "us-east"),
            dr_cluster("west", "us-west"),
            dr_cluster("unrelated", "eu"),
        ];
        let resolved = dr_clusters_for_policy(&policies[0], &clusters);
        let names: Vec<String> = resolved.iter().map(|c| c.name_any()).collect();
        assert_eq!(names, vec!["east".to_string(), "west".to_string()]);
    }
}
