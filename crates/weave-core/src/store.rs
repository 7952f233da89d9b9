//! # Reactive store
//!
//! [`ReactiveStore`] is the shared mutable state behind a UI: a flat map of
//! string keys to [`Value`]s with change notification, batching, and a
//! [`DependencyGraph`] that turns "key changed" into "node must repaint".
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use weave_core::{ReactiveStore, Value, Zone};
//!
//! let store = ReactiveStore::new();
//! let dirty = Arc::new(Mutex::new(Vec::new()));
//! store.set_dirty_callback({
//!     let dirty = dirty.clone();
//!     move |node: &str, zone: &Zone| dirty.lock().push((node.to_string(), zone.clone()))
//! });
//!
//! store.register_dependency("counter-label", "count");
//! store.set("count", 1);
//! store.set("count", 1); // unchanged, nothing fires
//! assert_eq!(*dirty.lock(), [("counter-label".to_string(), Zone::DATA)]);
//! ```
//!
//! ## Notification order
//!
//! For one effective change: per-key subscribers (registration order), then
//! global subscribers, then the dirty callback once per dependent node. All
//! callbacks run on the writing thread after the store lock is released, so
//! they may read or write the store.
//!
//! ## Batching
//!
//! Between [`ReactiveStore::begin_batch`] and [`ReactiveStore::end_batch`]
//! values are written immediately but notifications are held back. Each key
//! fires once at the end, in first-touched order, with the value from before
//! the batch as `old` and the latest write as `new`. A key that ends the
//! batch where it started fires nothing. Batches nest; only the outermost
//! `end_batch` flushes.
//!
//! Keys are opaque strings here; there is no nested-map traversal. Use
//! [`ReactiveStore::to_context`] to get a [`Scope`] for path lookups.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{RwLock, RwLockWriteGuard};
use smallvec::SmallVec;

use crate::config::{StoreConfig, Zone};
use crate::graph::{DependencyGraph, DependencyTracker};
use crate::scope::Scope;
use crate::subscription::{Subscription, SubscriptionId};
use crate::value::{Value, ValueMap};

/// Change callback: `(key, old, new)`.
pub type Notifier = Arc<dyn Fn(&str, &Value, &Value) + Send + Sync>;

/// Repaint hook: `(node, zone)`.
pub type DirtyCallback = Arc<dyn Fn(&str, &Zone) + Send + Sync>;

type Dependents = SmallVec<[String; 4]>;

struct Change {
    key: String,
    old: Value,
    existed: bool,
    new: Value,
    present: bool,
    zone: Zone,
    dependents: Dependents,
}

impl Change {
    fn is_effective(&self) -> bool {
        self.existed != self.present || self.old != self.new
    }
}

#[derive(Default)]
struct DebounceSlot {
    generation: u64,
    first_old: Option<Value>,
}

#[derive(Default)]
struct StoreState {
    values: ValueMap,
    subscribers: HashMap<String, Vec<(SubscriptionId, Notifier)>>,
    global: Vec<(SubscriptionId, Notifier)>,
    next_id: SubscriptionId,
    enabled: bool,
    batch_depth: usize,
    pending: Vec<Change>,
    debounce: HashMap<SubscriptionId, DebounceSlot>,
}

impl StoreState {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        self.next_id
    }

    fn notifiers_for(&self, key: &str) -> Vec<Notifier> {
        let keyed = self.subscribers.get(key).into_iter().flatten();
        keyed
            .chain(self.global.iter())
            .map(|(_, n)| Arc::clone(n))
            .collect()
    }

    fn remove_subscriber(&mut self, id: SubscriptionId) -> bool {
        self.debounce.remove(&id);
        if let Some(pos) = self.global.iter().position(|(sid, _)| *sid == id) {
            self.global.remove(pos);
            return true;
        }
        let mut emptied = None;
        let mut found = false;
        for (key, list) in self.subscribers.iter_mut() {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                found = true;
                if list.is_empty() {
                    emptied = Some(key.clone());
                }
                break;
            }
        }
        if let Some(key) = emptied {
            self.subscribers.remove(&key);
        }
        found
    }

    /// Folds a change into the pending batch. The first write to a key keeps
    /// the pre-batch value; later writes only move `new`.
    fn stage(&mut self, change: Change) {
        if let Some(entry) = self.pending.iter_mut().find(|p| p.key == change.key) {
            entry.new = change.new;
            entry.present = change.present;
            entry.zone = change.zone;
            for node in change.dependents {
                if !entry.dependents.contains(&node) {
                    entry.dependents.push(node);
                }
            }
        } else {
            self.pending.push(change);
        }
    }
}

pub struct ReactiveStore {
    state: Arc<RwLock<StoreState>>,
    graph: DependencyGraph,
    dirty: RwLock<Option<DirtyCallback>>,
    config: StoreConfig,
}

impl Default for ReactiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let state = StoreState {
            enabled: config.enabled,
            ..StoreState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            graph: DependencyGraph::new(),
            dirty: RwLock::new(None),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---- reads ----

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().values.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.read().values.contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.state.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> ValueMap {
        self.state.read().values.clone()
    }

    /// A detached [`Scope`] holding a copy of every value. Dotted keys are
    /// expanded into nested maps so that path lookups reach them. Later store
    /// writes are not visible through it.
    pub fn to_context(&self) -> Scope {
        let mut entries: Vec<(String, Value)> = self.snapshot().into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        let scope = Scope::new();
        for (key, value) in entries {
            if let Err(err) = scope.try_set(&key, value) {
                log::debug!("to_context: skipping `{key}`: {err}");
            }
        }
        scope
    }

    // ---- writes ----

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.set_zoned(key, value, self.config.default_zone.clone());
    }

    pub fn set_zoned(&self, key: &str, value: impl Into<Value>, zone: Zone) {
        let value = value.into();
        let mut state = self.state.write();
        let old = state.values.insert(key.to_string(), value.clone());
        let change = self.change(key, old, value, true, zone);
        self.commit(state, change);
    }

    /// Read-modify-write under one lock. `f` sees `Null` for a missing key.
    ///
    /// `f` runs while the store's write lock is held and the lock is not
    /// reentrant: calling back into this store from `f` (`get`, `set`,
    /// `register_dependency`, ...) deadlocks.
    pub fn update(&self, key: &str, f: impl FnOnce(&Value) -> Value) {
        let mut state = self.state.write();
        let current = state.values.get(key).cloned().unwrap_or_default();
        let value = f(&current);
        let old = state.values.insert(key.to_string(), value.clone());
        let change = self.change(key, old, value, true, self.config.default_zone.clone());
        self.commit(state, change);
    }

    /// Removes `key`, firing a change to `Null` when it existed.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let mut state = self.state.write();
        let old = state.values.remove(key)?;
        let change = self.change(
            key,
            Some(old.clone()),
            Value::Null,
            false,
            self.config.default_zone.clone(),
        );
        self.commit(state, change);
        Some(old)
    }

    /// Replaces the whole map. One change fires per key whose value differs,
    /// including keys that disappear.
    pub fn set_all(&self, data: ValueMap) {
        let mut state = self.state.write();
        let previous = std::mem::replace(&mut state.values, data);
        let zone = self.config.default_zone.clone();

        let mut changes = Vec::new();
        for (key, new) in state.values.iter() {
            let old = previous.get(key);
            if old != Some(new) {
                changes.push(self.change(key, old.cloned(), new.clone(), true, zone.clone()));
            }
        }
        for (key, old) in previous {
            if !state.values.contains_key(&key) {
                changes.push(self.change(&key, Some(old), Value::Null, false, zone.clone()));
            }
        }
        log::debug!("set_all: {} keys, {} changed", state.values.len(), changes.len());

        if state.batch_depth > 0 {
            for change in changes {
                state.stage(change);
            }
            return;
        }
        if !state.enabled {
            return;
        }
        let fired: Vec<(Change, Vec<Notifier>)> = changes
            .into_iter()
            .map(|c| {
                let targets = state.notifiers_for(&c.key);
                (c, targets)
            })
            .collect();
        drop(state);
        for (change, targets) in &fired {
            self.dispatch(change, targets);
        }
    }

    /// Captures the current dependents of `key` while the store lock is held.
    fn change(
        &self,
        key: &str,
        old: Option<Value>,
        new: Value,
        present: bool,
        zone: Zone,
    ) -> Change {
        Change {
            key: key.to_string(),
            existed: old.is_some(),
            old: old.unwrap_or_default(),
            new,
            present,
            zone,
            dependents: self.collect_dependents(key),
        }
    }

    fn collect_dependents(&self, key: &str) -> Dependents {
        let mut out: Dependents = self.graph.dependents(key).into_iter().collect();
        if self.config.notify_ancestors {
            let mut prefix = key;
            while let Some((head, _)) = prefix.rsplit_once('.') {
                for node in self.graph.dependents(head) {
                    if !out.contains(&node) {
                        out.push(node);
                    }
                }
                prefix = head;
            }
        }
        out
    }

    fn commit(&self, mut state: RwLockWriteGuard<'_, StoreState>, change: Change) {
        if state.batch_depth > 0 {
            state.stage(change);
            return;
        }
        if !change.is_effective() || !state.enabled {
            return;
        }
        let targets = state.notifiers_for(&change.key);
        drop(state);
        self.dispatch(&change, &targets);
    }

    fn dispatch(&self, change: &Change, targets: &[Notifier]) {
        log::trace!(
            "{} changed; {} subscribers, {} dependents",
            change.key,
            targets.len(),
            change.dependents.len()
        );
        for notify in targets {
            notify(&change.key, &change.old, &change.new);
        }
        self.mark_dirty(&change.dependents, &change.zone);
    }

    fn mark_dirty(&self, nodes: &[String], zone: &Zone) {
        if nodes.is_empty() {
            return;
        }
        let hook = self.dirty.read().clone();
        if let Some(hook) = hook {
            for node in nodes {
                log::trace!("dirty {node} ({zone})");
                hook(node, zone);
            }
        }
    }

    /// Runs the dirty callback for every node depending on `key` without
    /// changing any value.
    pub fn invalidate(&self, key: &str, zone: Zone) {
        let dependents = {
            let _state = self.state.read();
            self.collect_dependents(key)
        };
        self.mark_dirty(&dependents, &zone);
    }

    // ---- batching ----

    pub fn begin_batch(&self) {
        self.state.write().batch_depth += 1;
    }

    /// Ends the current batch; the outermost call fires everything collected.
    pub fn end_batch(&self) {
        let fired: Vec<(Change, Vec<Notifier>)> = {
            let mut state = self.state.write();
            if state.batch_depth == 0 {
                log::warn!("end_batch called without a matching begin_batch");
                return;
            }
            state.batch_depth -= 1;
            if state.batch_depth > 0 {
                return;
            }
            let pending = std::mem::take(&mut state.pending);
            if !state.enabled {
                log::debug!("batch dropped {} changes while disabled", pending.len());
                return;
            }
            pending
                .into_iter()
                .filter(Change::is_effective)
                .map(|c| {
                    let targets = state.notifiers_for(&c.key);
                    (c, targets)
                })
                .collect()
        };
        log::debug!("batch flushed {} changes", fired.len());
        for (change, targets) in &fired {
            self.dispatch(change, targets);
        }
    }

    pub fn is_batching(&self) -> bool {
        self.state.read().batch_depth > 0
    }

    /// Runs `f` inside a batch. The batch is closed even if `f` panics.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        struct Guard<'a>(&'a ReactiveStore);
        impl Drop for Guard<'_> {
            fn drop(&mut self) {
                self.0.end_batch();
            }
        }
        self.begin_batch();
        let _guard = Guard(self);
        f(self)
    }

    // ---- notification switch ----

    pub fn enable(&self) {
        self.state.write().enabled = true;
    }

    /// Stops notifications. Writes still take effect.
    pub fn disable(&self) {
        self.state.write().enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    // ---- subscriptions ----

    pub fn subscribe(
        &self,
        key: &str,
        f: impl Fn(&str, &Value, &Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.state.write();
            let id = state.next_id();
            state
                .subscribers
                .entry(key.to_string())
                .or_default()
                .push((id, Arc::new(f)));
            id
        };
        self.handle(id)
    }

    /// Subscribes to every key.
    pub fn subscribe_global(
        &self,
        f: impl Fn(&str, &Value, &Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.state.write();
            let id = state.next_id();
            state.global.push((id, Arc::new(f)));
            id
        };
        self.handle(id)
    }

    /// Like [`ReactiveStore::subscribe`], but first calls `f` with the
    /// current value (`old` is `Null`) when the key exists.
    ///
    /// The current value is read under the same lock that registers `f`, so
    /// no write can fall between the two.
    pub fn watch(
        &self,
        key: &str,
        f: impl Fn(&str, &Value, &Value) + Send + Sync + 'static,
    ) -> Subscription {
        let f: Notifier = Arc::new(f);
        let (id, current) = {
            let mut state = self.state.write();
            let current = state.values.get(key).cloned();
            let id = state.next_id();
            state
                .subscribers
                .entry(key.to_string())
                .or_default()
                .push((id, Arc::clone(&f)));
            (id, current)
        };
        if let Some(current) = current {
            f(key, &Value::Null, &current);
        }
        self.handle(id)
    }

    /// Calls `f` once a burst of changes to `key` has been quiet for `delay`.
    ///
    /// Every change restarts the wait; a worker thread is spawned per change
    /// and only the one that finds its generation still current fires. `old`
    /// is the value from before the burst.
    pub fn watch_debounced(
        &self,
        key: &str,
        delay: Duration,
        f: impl Fn(&str, &Value, &Value) + Send + Sync + 'static,
    ) -> Subscription {
        let f: Notifier = Arc::new(f);
        let weak = Arc::downgrade(&self.state);
        let id = {
            let mut state = self.state.write();
            let id = state.next_id();
            state.debounce.insert(id, DebounceSlot::default());
            let notifier: Notifier = Arc::new(move |key: &str, old: &Value, new: &Value| {
                debounce_hit(&weak, id, delay, &f, key, old, new);
            });
            state
                .subscribers
                .entry(key.to_string())
                .or_default()
                .push((id, notifier));
            id
        };
        self.handle(id)
    }

    /// Removes a subscription by id. Prefer [`Subscription::unsubscribe`].
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.write().remove_subscriber(id)
    }

    fn handle(&self, id: SubscriptionId) -> Subscription {
        let weak = Arc::downgrade(&self.state);
        Subscription::new(id, move || {
            if let Some(state) = weak.upgrade() {
                state.write().remove_subscriber(id);
            }
        })
    }

    // ---- dirty hook ----

    /// Installs the repaint hook, replacing any previous one.
    pub fn set_dirty_callback(&self, f: impl Fn(&str, &Zone) + Send + Sync + 'static) {
        *self.dirty.write() = Some(Arc::new(f));
    }

    pub fn clear_dirty_callback(&self) {
        *self.dirty.write() = None;
    }

    // ---- dependency graph ----

    pub fn register_dependency(&self, node: &str, key: &str) {
        let _state = self.state.read();
        self.graph.register(node, key);
    }

    pub fn unregister_node(&self, node: &str) {
        let _state = self.state.read();
        self.graph.unregister(node);
    }

    pub fn dependents(&self, key: &str) -> Vec<String> {
        let _state = self.state.read();
        self.graph.dependents(key)
    }

    pub fn dependencies(&self, node: &str) -> Vec<String> {
        let _state = self.state.read();
        self.graph.dependencies(node)
    }

    pub fn clear_dependencies(&self) {
        let _state = self.state.read();
        self.graph.clear();
    }

    pub fn dependency_count(&self) -> usize {
        let _state = self.state.read();
        self.graph.size()
    }

    pub fn compact_dependencies(&self) -> usize {
        let _state = self.state.read();
        self.graph.compact()
    }
}

fn debounce_hit(
    weak: &Weak<RwLock<StoreState>>,
    id: SubscriptionId,
    delay: Duration,
    f: &Notifier,
    key: &str,
    old: &Value,
    new: &Value,
) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let generation = {
        let mut state = state.write();
        let Some(slot) = state.debounce.get_mut(&id) else {
            return;
        };
        slot.generation += 1;
        if slot.first_old.is_none() {
            slot.first_old = Some(old.clone());
        }
        slot.generation
    };
    drop(state);

    let weak = weak.clone();
    let f = Arc::clone(f);
    let thread_key = key.to_string();
    let new = new.clone();
    let spawned = std::thread::Builder::new()
        .name("weave-debounce".into())
        .spawn(move || {
            std::thread::sleep(delay);
            let Some(state) = weak.upgrade() else {
                return;
            };
            let old = {
                let mut state = state.write();
                match state.debounce.get_mut(&id) {
                    Some(slot) if slot.generation == generation => {
                        slot.first_old.take().unwrap_or_default()
                    }
                    _ => return,
                }
            };
            f(&thread_key, &old, &new);
        });
    if let Err(err) = spawned {
        log::warn!("debounced watcher for `{key}` could not start: {err}");
    }
}

impl DependencyTracker for ReactiveStore {
    fn register(&self, node: &str, key: &str) {
        self.register_dependency(node, key);
    }

    fn unregister(&self, node: &str) {
        self.unregister_node(node);
    }
}

#[cfg(feature = "json")]
impl ReactiveStore {
    /// Replaces the store contents with the members of a JSON object.
    pub fn load_json(&self, json: serde_json::Value) {
        match Value::from(json) {
            Value::Map(map) => self.set_all(map),
            other => log::warn!("load_json expects an object, got {}", other.type_name()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let snapshot = self.snapshot();
        serde_json::Value::Object(
            snapshot
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                .collect(),
        )
    }
}
