#[cfg(test)]
mod tests {
    use crate::config::{StoreConfig, Zone};
    use crate::prop::*;
    use crate::scope::*;
    use crate::store::*;
    use crate::value::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_list_rows_read_item_and_outer_scope() {
        let page = Scope::new();
        page.set("currency", "EUR");
        page.set("markup", 0.5);
        page.set(
            "items",
            Value::List(vec![
                Value::map([("name", Value::from("Tea")), ("price", Value::from(3))]),
                Value::map([("name", Value::from("Cake")), ("price", Value::from(4.5))]),
            ]),
        );

        let label = Prop::string("{{ $item.name }}");
        let currency = Prop::string("{{ currency }}");
        let price = Prop::<f64>::parse("{{ $item.price }}");
        let surcharge = Prop::<f64>::parse("{{ markup * 2 }}");

        let items = match page.get("items") {
            Some(Value::List(items)) => items,
            other => panic!("unexpected {other:?}"),
        };
        let rows: Vec<(String, String, f64, f64)> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let row = page.item_child(i, item);
                let ctx = Some(&row as &dyn crate::Context);
                (
                    label.resolve(ctx),
                    currency.resolve(ctx),
                    price.resolve(ctx),
                    surcharge.resolve(ctx),
                )
            })
            .collect();

        assert_eq!(
            rows,
            [
                ("Tea".to_string(), "EUR".to_string(), 3.0, 1.0),
                ("Cake".to_string(), "EUR".to_string(), 4.5, 1.0),
            ]
        );
    }

    #[test]
    fn test_parent_variables_resolve_through_props() {
        let root = Scope::new();
        root.set("title", "Root");
        let section = root.child(ValueMap::from([("title".to_string(), Value::from("Section"))]));
        let leaf = section.child(ValueMap::new());

        let own = Prop::string("{{ title }}");
        let above = Prop::string("{{ $parent.title }}");
        let top = Prop::string("{{ $root.title }}");

        assert_eq!(own.resolve(Some(&leaf)), "Section");
        assert_eq!(above.resolve(Some(&leaf)), "Section");
        assert_eq!(top.resolve(Some(&leaf)), "Root");
    }

    #[test]
    fn test_store_drives_repaint_of_tracked_props() {
        let store = ReactiveStore::with_config(StoreConfig::default().with_notify_ancestors(true));
        let dirty = Arc::new(Mutex::new(Vec::new()));
        store.set_dirty_callback({
            let dirty = dirty.clone();
            move |node: &str, zone: &Zone| dirty.lock().push((node.to_string(), zone.clone()))
        });

        store.set("price", 2);
        store.set("qty", 3);
        store.set("user.name", "Ada");

        let total = Prop::<f64>::parse("{{ price * qty }}");
        let greeting = Prop::<String>::computed(["user"], |ctx| {
            let name = ctx.and_then(|c| c.get("user.name")).unwrap_or_default();
            format!("Hello, {name}")
        });

        let ctx = store.to_context();
        assert_eq!(total.resolve_with_tracking(Some(&ctx), "total", &store), 6.0);
        assert_eq!(
            greeting.resolve_with_tracking(Some(&ctx), "greeting", &store),
            "Hello, Ada"
        );

        store.set("qty", 3);
        assert!(dirty.lock().is_empty());

        store.batch(|s| {
            s.set("price", 5);
            s.set("qty", 4);
            s.set("user.name", "Grace");
        });

        assert_eq!(
            *dirty.lock(),
            [
                ("total".to_string(), Zone::DATA),
                ("total".to_string(), Zone::DATA),
                ("greeting".to_string(), Zone::DATA),
            ]
        );

        let ctx = store.to_context();
        assert_eq!(total.resolve(Some(&ctx)), 20.0);
        assert_eq!(greeting.resolve(Some(&ctx)), "Hello, Grace");
    }

    #[test]
    fn test_unregistered_node_is_not_repainted() {
        let store = ReactiveStore::new();
        let hits = Arc::new(Mutex::new(0));
        store.set_dirty_callback({
            let hits = hits.clone();
            move |_: &str, _: &Zone| *hits.lock() += 1
        });

        let prop = Prop::<i64>::parse("{{ count }}");
        prop.resolve_with_tracking(None, "badge", &store);
        store.set("count", 1);
        store.unregister_node("badge");
        store.set("count", 2);

        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_store_context_is_a_snapshot() {
        let store = ReactiveStore::new();
        store.set("count", 1);
        let ctx = store.to_context();
        store.set("count", 2);
        let prop = Prop::<i64>::parse("{{ count }}");
        assert_eq!(prop.resolve(Some(&ctx)), 1);
        assert_eq!(prop.resolve(Some(&store.to_context())), 2);
    }
}
