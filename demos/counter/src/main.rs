use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use weave_core::prelude::*;

#[derive(Serialize)]
struct Initial {
    count: i64,
    step: i64,
    user: User,
}

#[derive(Serialize)]
struct User {
    name: String,
}

/// Node ids collected by the dirty callback between frames.
#[derive(Clone, Default)]
struct DirtySet(Arc<Mutex<BTreeSet<String>>>);

impl DirtySet {
    fn insert(&self, node: &str) {
        self.0.lock().insert(node.to_string());
    }

    fn take(&self) -> BTreeSet<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// A rendered text node: an id plus the prop that produces its text.
struct Label {
    id: &'static str,
    text: Prop<String>,
}

fn render(store: &ReactiveStore, labels: &[Label], only: Option<&BTreeSet<String>>) {
    let ctx = store.to_context();
    for label in labels {
        if only.is_some_and(|set| !set.contains(label.id)) {
            continue;
        }
        let text = label.text.resolve_with_tracking(Some(&ctx), label.id, store);
        println!("{:>8} | {text}", label.id);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // labels bind `user.name` but register `user`; writes go to `user.name`
    let store = Arc::new(ReactiveStore::with_config(
        StoreConfig::default().with_notify_ancestors(true),
    ));
    store.load_json(serde_json::to_value(Initial {
        count: 0,
        step: 1,
        user: User {
            name: "Ada".into(),
        },
    })?);

    let labels = [
        Label {
            id: "title",
            text: Prop::string("{{ user.name }}"),
        },
        Label {
            id: "count",
            text: Prop::string("{{ count }}"),
        },
        Label {
            id: "next",
            text: Prop::string("{{ count + step }}"),
        },
        Label {
            id: "footer",
            text: Prop::string("Press + to increment"),
        },
    ];

    let dirty = DirtySet::default();
    store.set_dirty_callback({
        let dirty = dirty.clone();
        move |node: &str, zone: &Zone| {
            log::debug!("{node} dirty in {zone}");
            dirty.insert(node);
        }
    });

    let history = store.subscribe("count", |_, old, new| {
        log::info!("count: {old} -> {new}");
    });

    println!("-- initial");
    render(&store, &labels, None);

    for _ in 0..3 {
        let step = store.get("step").and_then(|v| v.as_f64()).unwrap_or(1.0) as i64;
        store.update("count", |v| {
            Value::from(i64::from_value(v).unwrap_or_default() + step)
        });
        println!("-- increment");
        render(&store, &labels, Some(&dirty.take()));
    }

    store.batch(|s| {
        s.set("step", 10);
        s.set("user.name", "Grace");
        s.set("count", 3);
    });
    println!("-- batch");
    render(&store, &labels, Some(&dirty.take()));

    history.unsubscribe();
    log::info!("final state: {}", store.to_json());
    Ok(())
}
