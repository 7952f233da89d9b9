//! # Scopes
//!
//! A [`Scope`] is a node in a chain of data contexts. Each scope owns a local
//! map and optionally points at a parent. Lookups that fail locally are
//! retried, with the whole original path, against the parent, so a list row
//! scope can read both its own `$item` and a `theme.accent` defined three
//! levels up.
//!
//! ```rust
//! use weave_core::{Scope, Value, ValueMap};
//!
//! let root = Scope::new();
//! root.set("theme.accent", Value::from("teal"));
//!
//! let row = root.item_child(2, Value::map([("title", "Inbox")]));
//! assert_eq!(row.get("$index"), Some(Value::from(2)));
//! assert_eq!(row.get("$item.title"), Some(Value::from("Inbox")));
//! assert_eq!(row.get("theme.accent"), Some(Value::from("teal")));
//! ```
//!
//! Writes only ever touch the scope they are issued on. A child never
//! mutates an ancestor, and a `$parent` value handed out by a lookup is a
//! handle to the parent, not a copy.
//!
//! `Scope` is a cheap, cloneable handle; [`Scope::fork`] is the operation that
//! copies local data.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::Context;
use crate::error::PathError;
use crate::value::{Lookup, Value, ValueMap};

#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    data: RwLock<ValueMap>,
    parent: Option<Scope>,
}

impl Scope {
    /// An empty root scope.
    pub fn new() -> Self {
        Self::root_with(ValueMap::new())
    }

    pub fn root_with(data: ValueMap) -> Self {
        Self::build(data, None)
    }

    fn build(data: ValueMap, parent: Option<Scope>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                data: RwLock::new(data),
                parent,
            }),
        }
    }

    pub fn child(&self, data: ValueMap) -> Scope {
        Self::build(data, Some(self.clone()))
    }

    /// Child scope for one row of a repeated element, carrying `$index` and
    /// `$item`.
    pub fn item_child(&self, index: usize, item: impl Into<Value>) -> Scope {
        let mut data = ValueMap::with_capacity(2);
        data.insert("$index".to_string(), Value::from(index));
        data.insert("$item".to_string(), item.into());
        self.child(data)
    }

    /// Shallow copy of the local data that keeps the same parent. The copy
    /// still sees later writes to ancestors but not later writes to `self`.
    pub fn fork(&self) -> Scope {
        let data = self.inner.data.read().clone();
        Self::build(data, self.inner.parent.clone())
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    pub fn root(&self) -> Scope {
        let mut current = self;
        while let Some(parent) = current.inner.parent.as_ref() {
            current = parent;
        }
        current.clone()
    }

    /// Number of ancestors above this scope.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.inner.parent.as_ref() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Whether both handles point at the same scope.
    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        if path.is_empty() {
            return None;
        }
        if path.starts_with('$') {
            return self.get_special(path);
        }
        if let Some(v) = self.get_local(path) {
            return Some(v);
        }
        self.inner.parent.as_ref()?.get(path)
    }

    fn get_special(&self, path: &str) -> Option<Value> {
        let (name, rest) = match path.split_once('.') {
            Some((name, rest)) => (name, Some(rest)),
            None => (path, None),
        };
        match name {
            "$parent" => {
                let parent = self.inner.parent.as_ref()?;
                match rest {
                    Some(rest) => parent.get(rest),
                    None => Some(Value::Scope(parent.clone())),
                }
            }
            "$root" => {
                let root = self.root();
                match rest {
                    Some(rest) => root.get(rest),
                    None => Some(Value::Scope(root)),
                }
            }
            // $index, $item and unknown names never leave this scope
            _ => self.get_local(path),
        }
    }

    /// Resolves `path` against local data only. The lock is released before
    /// any delegation into another scope.
    fn get_local(&self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (first, rest) = segments.split_first()?;
        let lookup = {
            let data = self.inner.data.read();
            data.get(*first)?.lookup(rest)
        };
        match lookup {
            Lookup::Found(v) => Some(v),
            Lookup::Delegate(scope, rest) => scope.get(&rest),
            Lookup::Missing => None,
        }
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Fail-soft form of [`Scope::try_set`].
    pub fn set(&self, path: &str, value: impl Into<Value>) -> bool {
        self.try_set(path, value.into()).is_ok()
    }

    /// Writes `value` at `path` in this scope, creating intermediate maps.
    pub fn try_set(&self, path: &str, value: Value) -> Result<(), PathError> {
        if path.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        let (first, rest) = segments
            .split_first()
            .ok_or(PathError::EmptyPath)?;

        let mut data = self.inner.data.write();
        if rest.is_empty() {
            data.insert((*first).to_string(), value);
            return Ok(());
        }

        let mut slot = data.entry((*first).to_string()).or_insert(Value::Null);
        let mut owner = *first;
        for segment in rest {
            if slot.is_null() {
                *slot = Value::Map(ValueMap::new());
            }
            slot = child_slot(slot, segment).ok_or_else(|| PathError::NotAContainer {
                path: path.to_string(),
                segment: owner.to_string(),
            })?;
            owner = *segment;
        }
        *slot = value;
        Ok(())
    }

    /// Removes `path` from this scope's local data.
    pub fn delete(&self, path: &str) -> Option<Value> {
        let mut data = self.inner.data.write();
        let Some((parents, last)) = path.rsplit_once('.') else {
            return data.remove(path);
        };
        let mut segments = parents.split('.');
        let first = segments.next()?;
        let mut container = data.get_mut(first)?;
        for segment in segments {
            container = child_mut(container, segment)?;
        }
        match container {
            Value::Map(m) => m.remove(last),
            Value::Dict(entries) => {
                let pos = entries.iter().position(|(k, _)| k.key_matches(last))?;
                Some(entries.remove(pos).1)
            }
            _ => None,
        }
    }

    /// Local keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.data.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn local_snapshot(&self) -> ValueMap {
        self.inner.data.read().clone()
    }
}

/// Existing-or-created slot for `segment` inside a container being written.
fn child_slot<'a>(container: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match container {
        Value::Map(m) => Some(m.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Dict(entries) => {
            let idx = match entries.iter().position(|(k, _)| k.key_matches(segment)) {
                Some(idx) => idx,
                None => {
                    entries.push((Value::from(segment), Value::Null));
                    entries.len() - 1
                }
            };
            Some(&mut entries[idx].1)
        }
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

fn child_mut<'a>(container: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match container {
        Value::Map(m) => m.get_mut(segment),
        Value::Dict(entries) => entries
            .iter_mut()
            .find(|(k, _)| k.key_matches(segment))
            .map(|(_, v)| v),
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("keys", &self.keys())
            .finish()
    }
}

impl Context for Scope {
    fn get(&self, path: &str) -> Option<Value> {
        Scope::get(self, path)
    }

    fn set(&self, path: &str, value: Value) -> bool {
        Scope::set(self, path, value)
    }

    fn has(&self, path: &str) -> bool {
        Scope::has(self, path)
    }

    fn parent(&self) -> Option<Scope> {
        self.inner.parent.clone()
    }

    fn root(&self) -> Scope {
        Scope::root(self)
    }

    fn new_child(&self, data: ValueMap) -> Scope {
        self.child(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn chain(depth: usize) -> Vec<Scope> {
        let mut scopes = vec![Scope::new()];
        for _ in 0..depth {
            let next = scopes[scopes.len() - 1].child(ValueMap::new());
            scopes.push(next);
        }
        scopes
    }

    #[test]
    fn root_values_visible_at_any_depth() {
        for depth in [1, 2, 5, 12] {
            let scopes = chain(depth);
            scopes[0].set("app.title", "Weave");
            let leaf = &scopes[depth];
            assert_eq!(leaf.get("app.title"), Some(Value::from("Weave")));
            assert_eq!(leaf.depth(), depth);
        }
    }

    #[test]
    fn child_shadows_parent() {
        let root = Scope::root_with(ValueMap::from([("name".to_string(), Value::from("root"))]));
        let child = root.child(ValueMap::from([("name".to_string(), Value::from("child"))]));
        assert_eq!(child.get("name"), Some(Value::from("child")));
        assert_eq!(root.get("name"), Some(Value::from("root")));
    }

    #[test]
    fn failed_local_lookup_retries_whole_path() {
        let root = Scope::new();
        root.set("user.name", "Alice");
        let mid = root.child(ValueMap::new());
        // local `user` is a scalar, so `user.name` fails locally and the parent answers
        let leaf = mid.child(ValueMap::from([("user".to_string(), Value::from(5))]));
        assert_eq!(leaf.get("user.name"), Some(Value::from("Alice")));
        assert_eq!(leaf.get("user"), Some(Value::from(5)));
        assert_eq!(leaf.get("user.missing"), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let scope = Scope::new();
        for path in ["a", "a2.b", "x.y.z.w"] {
            assert!(scope.set(path, 42));
            assert_eq!(scope.get(path), Some(Value::from(42)));
        }
    }

    #[test]
    fn set_through_scalar_fails() {
        let scope = Scope::new();
        scope.set("count", 3);
        assert!(!scope.set("count.inner", 1));
        assert_eq!(
            scope.try_set("count.inner", Value::from(1)),
            Err(PathError::NotAContainer {
                path: "count.inner".into(),
                segment: "count".into()
            })
        );
        assert_eq!(scope.try_set("", Value::Null), Err(PathError::EmptyPath));
        assert!(!scope.set("a..b", 1));
        assert_eq!(scope.get("count"), Some(Value::from(3)));
    }

    #[test]
    fn set_never_touches_parent() {
        let root = Scope::new();
        root.set("theme.fg", "white");
        let child = root.child(ValueMap::new());
        child.set("theme.fg", "black");
        assert_eq!(root.get("theme.fg"), Some(Value::from("white")));
        assert_eq!(child.get("theme.fg"), Some(Value::from("black")));
    }

    #[test]
    fn special_variables() {
        let root = Scope::new();
        root.set("title", "Root");
        let list = root.child(ValueMap::from([("title".to_string(), Value::from("List"))]));
        let row = list.item_child(3, Value::map([("label", "third")]));

        assert_eq!(row.get("$index"), Some(Value::from(3)));
        assert_eq!(row.get("$item.label"), Some(Value::from("third")));
        assert_eq!(row.get("$parent.title"), Some(Value::from("List")));
        assert_eq!(row.get("$root.title"), Some(Value::from("Root")));
        assert_eq!(row.get("$parent"), Some(Value::Scope(list.clone())));
        assert_eq!(row.get("$root"), Some(Value::Scope(root.clone())));

        // relative variables do not fall back to ancestors
        assert_eq!(list.get("$index"), None);
        assert_eq!(root.get("$parent"), None);
        assert_eq!(root.get("$parent.title"), None);
    }

    #[test]
    fn parent_handle_navigates_like_a_path() {
        let root = Scope::new();
        root.set("user.name", "Alice");
        let child = root.child(ValueMap::new());
        let parent = child.get("$parent").unwrap_or_default();
        assert_eq!(parent.get_path("user.name"), Some(Value::from("Alice")));
    }

    #[test]
    fn generic_keyed_containers_are_navigable() {
        let scope = Scope::new();
        scope.set(
            "lookup",
            Value::Dict(vec![(Value::Int(1), Value::map([("name", "one")]))]),
        );
        assert_eq!(scope.get("lookup.1.name"), Some(Value::from("one")));
        assert!(scope.set("lookup.1.name", "uno"));
        assert_eq!(scope.get("lookup.1.name"), Some(Value::from("uno")));
    }

    #[test]
    fn fork_copies_local_data_but_shares_parent() {
        let root = Scope::new();
        root.set("shared", 1);
        let original = root.child(ValueMap::new());
        original.set("local", "a");

        let copy = original.fork();
        original.set("local", "b");
        root.set("shared", 2);

        assert_eq!(copy.get("local"), Some(Value::from("a")));
        assert_eq!(copy.get("shared"), Some(Value::from(2)));
        assert!(copy.parent().is_some_and(|p| p.same_scope(&root)));
    }

    #[test]
    fn delete_removes_nested_entries() {
        let scope = Scope::new();
        scope.set("user.name", "Alice");
        scope.set("user.age", 30);
        assert_eq!(scope.delete("user.age"), Some(Value::from(30)));
        assert!(!scope.has("user.age"));
        assert!(scope.has("user.name"));
        assert_eq!(scope.delete("missing.key"), None);
    }

    #[test]
    fn context_trait_objects_delegate() {
        let root = Scope::new();
        let ctx: &dyn Context = &root;
        assert!(ctx.set("a.b", Value::from(1)));
        assert!(ctx.has("a.b"));
        let child = ctx.new_child(ValueMap::new());
        assert!(Context::root(&child).same_scope(&root));
        assert!(Context::parent(&child).is_some());
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let root = Scope::new();
        root.set("counter", 0);
        let child = root.child(ValueMap::new());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let root = root.clone();
                let child = child.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        root.set(&format!("t{t}.v"), i);
                        child.set(&format!("c{t}"), i);
                        assert!(child.get("counter").is_some());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for t in 0..4 {
            assert_eq!(child.get(&format!("t{t}.v")), Some(Value::from(199)));
        }
    }
}
