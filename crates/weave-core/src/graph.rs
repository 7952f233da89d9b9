use std::collections::HashMap;

use parking_lot::RwLock;

/// Records which rendered nodes read which state keys.
///
/// Implemented by [`DependencyGraph`] and by
/// [`ReactiveStore`](crate::ReactiveStore), which forwards to its own graph.
pub trait DependencyTracker {
    fn register(&self, node: &str, key: &str);
    fn unregister(&self, node: &str);
}

#[derive(Default)]
struct Edges {
    // state key -> dependent nodes, insertion order, no duplicates
    deps: HashMap<String, Vec<String>>,
    // node -> state keys it registered
    reverse: HashMap<String, Vec<String>>,
}

/// Bidirectional key ⇄ node multimap. `deps` and `reverse` are always exact
/// inverses of each other; one lock guards both.
///
/// Unregistering a node leaves any key it emptied in place with an empty
/// list; call [`DependencyGraph::compact`] to drop those.
#[derive(Default)]
pub struct DependencyGraph {
    edges: RwLock<Edges>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `node` depends on `key`. Registering the same pair twice
    /// is a no-op.
    pub fn register(&self, node: &str, key: &str) {
        let mut edges = self.edges.write();
        let dependents = edges.deps.entry(key.to_string()).or_default();
        if dependents.iter().any(|n| n == node) {
            return;
        }
        dependents.push(node.to_string());
        edges
            .reverse
            .entry(node.to_string())
            .or_default()
            .push(key.to_string());
    }

    /// Removes `node` from every key it was registered under.
    pub fn unregister(&self, node: &str) {
        let mut edges = self.edges.write();
        let Some(keys) = edges.reverse.remove(node) else {
            return;
        };
        for key in &keys {
            if let Some(dependents) = edges.deps.get_mut(key) {
                dependents.retain(|n| n != node);
            }
        }
        log::trace!("unregistered {node} from {} keys", keys.len());
    }

    pub fn dependents(&self, key: &str) -> Vec<String> {
        self.edges.read().deps.get(key).cloned().unwrap_or_default()
    }

    pub fn dependencies(&self, node: &str) -> Vec<String> {
        self.edges.read().reverse.get(node).cloned().unwrap_or_default()
    }

    pub fn clear(&self) {
        let mut edges = self.edges.write();
        edges.deps.clear();
        edges.reverse.clear();
    }

    /// Total number of (key, node) edges.
    pub fn size(&self) -> usize {
        self.edges.read().deps.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Keys with at least one dependent, sorted.
    pub fn keys(&self) -> Vec<String> {
        let edges = self.edges.read();
        let mut keys: Vec<String> = edges
            .deps
            .iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Nodes with at least one registration, sorted.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.edges.read().reverse.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Drops keys left with no dependents; returns how many were removed.
    pub fn compact(&self) -> usize {
        let mut edges = self.edges.write();
        let before = edges.deps.len();
        edges.deps.retain(|_, nodes| !nodes.is_empty());
        let removed = before - edges.deps.len();
        if removed > 0 {
            log::debug!("dependency graph compacted {removed} empty keys");
        }
        removed
    }
}

impl DependencyTracker for DependencyGraph {
    fn register(&self, node: &str, key: &str) {
        DependencyGraph::register(self, node, key);
    }

    fn unregister(&self, node: &str) {
        DependencyGraph::unregister(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn assert_inverse(graph: &DependencyGraph) {
        let edges = graph.edges.read();
        for (key, nodes) in &edges.deps {
            for node in nodes {
                assert!(edges.reverse[node].contains(key), "{node} missing reverse {key}");
            }
        }
        for (node, keys) in &edges.reverse {
            for key in keys {
                assert!(edges.deps[key].contains(node), "{key} missing forward {node}");
            }
        }
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let graph = DependencyGraph::new();
        graph.register("n", "k");
        graph.register("n", "k");
        assert_eq!(graph.size(), 1);
        assert_eq!(graph.dependents("k"), ["n"]);
        assert_eq!(graph.dependencies("n"), ["k"]);
        assert_inverse(&graph);
    }

    #[test]
    fn dependents_keep_insertion_order() {
        let graph = DependencyGraph::new();
        for node in ["c", "a", "b"] {
            graph.register(node, "count");
        }
        assert_eq!(graph.dependents("count"), ["c", "a", "b"]);
    }

    #[test]
    fn unregister_removes_every_edge() {
        let graph = DependencyGraph::new();
        graph.register("label", "user");
        graph.register("label", "theme");
        graph.register("badge", "user");
        graph.unregister("label");

        assert_eq!(graph.dependents("user"), ["badge"]);
        assert!(graph.dependents("theme").is_empty());
        assert!(graph.dependencies("label").is_empty());
        assert_eq!(graph.size(), 1);
        assert_inverse(&graph);

        // emptied keys linger until compacted
        assert_eq!(graph.keys(), ["user"]);
        assert_eq!(graph.compact(), 1);
        assert_eq!(graph.compact(), 0);
    }

    #[test]
    fn copies_are_detached() {
        let graph = DependencyGraph::new();
        graph.register("a", "k");
        let mut snapshot = graph.dependents("k");
        snapshot.push("intruder".into());
        assert_eq!(graph.dependents("k"), ["a"]);
    }

    #[test]
    fn clear_resets_everything() {
        let graph = DependencyGraph::new();
        graph.register("a", "x");
        graph.register("b", "y");
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.nodes().is_empty());
    }

    #[test]
    fn concurrent_registration_stays_consistent() {
        let graph = Arc::new(DependencyGraph::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || {
                    for i in 0..100 {
                        let node = format!("node{t}-{i}");
                        graph.register(&node, "shared");
                        graph.register(&node, &format!("key{}", i % 7));
                        if i % 3 == 0 {
                            graph.unregister(&node);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_inverse(&graph);
        // 4 threads * (100 - 34 unregistered) nodes * 2 keys
        assert_eq!(graph.size(), 4 * 66 * 2);
    }
}
