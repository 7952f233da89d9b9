//! # Data binding for declarative UIs
//!
//! Weave is the plumbing between application state and the properties of
//! rendered components. There are four main pieces:
//!
//! - [`Scope`] — a chain of data contexts that bindings read from.
//! - [`Prop<T>`] — a component property: static, bound to a path, an
//!   expression, or a host-computed value.
//! - [`Expression`] — a small formula language (`price * quantity`).
//! - [`ReactiveStore`] — shared state with change notification, batching and
//!   a [`DependencyGraph`] that tells the renderer which nodes to repaint.
//!
//! ## Scopes
//!
//! ```rust
//! use weave_core::*;
//!
//! let root = Scope::new();
//! root.set("user.name", "Alice");
//!
//! let row = root.item_child(0, Value::map([("title", "Inbox")]));
//! assert_eq!(row.get("user.name"), Some(Value::from("Alice")));
//! assert_eq!(row.get("$item.title"), Some(Value::from("Inbox")));
//! ```
//!
//! ## Props
//!
//! Property strings are classified when the prop is built. `{{ path }}` is a
//! binding, `{{ a * b }}` an expression, anything else a literal:
//!
//! ```rust
//! use weave_core::*;
//!
//! let scope = Scope::new();
//! scope.set("price", 3);
//! scope.set("qty", 2);
//!
//! let total = Prop::<f64>::parse("{{ price * qty }}");
//! assert_eq!(total.resolve(Some(&scope)), 6.0);
//! assert_eq!(total.dependencies(), ["price", "qty"]);
//! ```
//!
//! Resolution never fails; anything missing or unconvertible becomes
//! `T::default()`.
//!
//! ## Store and dirty marking
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use weave_core::*;
//!
//! let store = ReactiveStore::new();
//! let repaint = Arc::new(Mutex::new(Vec::new()));
//! store.set_dirty_callback({
//!     let repaint = repaint.clone();
//!     move |node: &str, _: &Zone| repaint.lock().push(node.to_string())
//! });
//!
//! let label = Prop::<i64>::parse("{{ count }}");
//! store.set("count", 1);
//! let shown = label.resolve_with_tracking(Some(&store.to_context()), "label", &store);
//! assert_eq!(shown, 1);
//!
//! store.set("count", 2);
//! assert_eq!(*repaint.lock(), ["label"]);
//! ```
//!
//! - Setting a key to a value equal to the current one notifies nobody.
//! - `batch` / `begin_batch` + `end_batch` coalesce writes: one notification
//!   per key, old value from before the batch.
//! - Subscriptions return a [`Subscription`] handle; `unsubscribe` on it is
//!   idempotent.

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod expr;
pub mod graph;
pub mod prelude;
pub mod prop;
pub mod scope;
pub mod store;
pub mod subscription;
pub mod tests;
pub mod value;

pub use config::*;
pub use context::*;
pub use convert::*;
pub use error::*;
pub use expr::{Expression, parse_expression};
pub use graph::*;
pub use prop::*;
pub use scope::*;
pub use store::*;
pub use subscription::*;
pub use value::{Value, ValueMap};
