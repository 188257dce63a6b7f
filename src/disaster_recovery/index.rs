//! Namespace/name-keyed lookup tables over borrowed resource snapshots.
//!
//! Every resolver pass needs the same two-level maps; building them once
//! per reconciliation keeps each lookup O(1) without rescanning the flat
//! collections per relationship.

use std::collections::HashMap;

use kube::Resource;

fn name_of<K: Resource>(resource: &K) -> &str {
    resource.meta().name.as_deref().unwrap_or_default()
}

fn namespace_of<K: Resource>(resource: &K) -> &str {
    resource.meta().namespace.as_deref().unwrap_or_default()
}

/// Two-level mapping namespace -> name -> resource, borrowing the input
/// snapshot. Cluster-scoped resources land under the empty namespace.
#[derive(Debug)]
pub struct ResourceIndex<'a, K> {
    by_namespace: HashMap<&'a str, HashMap<&'a str, &'a K>>,
    len: usize,
}

impl<'a, K: Resource> ResourceIndex<'a, K> {
    pub fn build<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = &'a K>,
    {
        let mut by_namespace: HashMap<&str, HashMap<&str, &K>> = HashMap::new();
        let mut len = 0;
        for resource in resources {
            let replaced = by_namespace
                .entry(namespace_of(resource))
                .or_default()
                .insert(name_of(resource), resource);
            if replaced.is_none() {
                len += 1;
            }
        }
        ResourceIndex { by_namespace, len }
    }

    pub fn lookup(&self, namespace: &str, name: &str) -> Option<&'a K> {
        self.by_namespace
            .get(namespace)
            .and_then(|names| names.get(name))
            .copied()
    }

    /// All resources in one namespace, in arbitrary order.
    pub fn in_namespace(&self, namespace: &str) -> impl Iterator<Item = &'a K> + '_ {
        self.by_namespace
            .get(namespace)
            .into_iter()
            .flat_map(|names| names.values().copied())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a, K: Resource> Default for ResourceIndex<'a, K> {
    fn default() -> Self {
        ResourceIndex {
            by_namespace: HashMap::new(),
            len: 0,
        }
    }
}
