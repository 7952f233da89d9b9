//! # Props
//!
//! A [`Prop<T>`] is a component property that is resolved to a concrete `T`
//! at render time. It is one of:
//!
//! - `Static` — a fixed value.
//! - `Bound` — a dotted path looked up in the [`Context`].
//! - `Expr` — a parsed [`Expression`] evaluated against the context.
//! - `Computed` — a host closure over the context with an explicit
//!   dependency list.
//!
//! Property strings are classified once, when the prop is built:
//!
//! ```rust
//! use weave_core::{Prop, PropKind, Scope, Value};
//!
//! let title = Prop::string("Settings");
//! let name = Prop::string("{{ user.name }}");
//! let total = Prop::<f64>::parse("{{ price * quantity }}");
//! assert_eq!(title.kind(), PropKind::Static);
//! assert_eq!(name.kind(), PropKind::Bound);
//! assert_eq!(total.kind(), PropKind::Expression);
//!
//! let scope = Scope::new();
//! scope.set("user.name", "Alice");
//! scope.set("price", 2.5);
//! scope.set("quantity", 4);
//! assert_eq!(name.resolve(Some(&scope)), "Alice");
//! assert_eq!(total.resolve(Some(&scope)), 10.0);
//! ```
//!
//! [`Prop::resolve`] never fails. A missing path, an expression that
//! evaluates to `null`, or a value that does not convert to `T` all resolve to
//! `T::default()`, so one bad binding cannot take down a frame.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::convert::FromValue;
use crate::expr::Expression;
use crate::graph::DependencyTracker;
use crate::value::Value;

pub const BIND_OPEN: &str = "{{";
pub const BIND_CLOSE: &str = "}}";

pub type ComputeFn<T> = Arc<dyn Fn(Option<&dyn Context>) -> T + Send + Sync>;

pub enum Prop<T> {
    Static(T),
    Bound(String),
    Expr(Expression),
    Computed {
        deps: Vec<String>,
        compute: ComputeFn<T>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Static,
    Bound,
    Expression,
    Computed,
}

/// Trims whitespace and one surrounding `{{ }}` pair.
pub fn strip_delimiters(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix(BIND_OPEN)
        .and_then(|s| s.strip_suffix(BIND_CLOSE))
        .unwrap_or(trimmed);
    inner.trim()
}

/// Whether `s` is a plain path (`user.name`, `$item.title`) rather than an
/// expression.
pub fn is_simple_path(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '$')
}

impl<T> Prop<T> {
    pub fn new_static(value: T) -> Self {
        Prop::Static(value)
    }

    pub fn binding(path: &str) -> Self {
        Prop::Bound(strip_delimiters(path).to_string())
    }

    pub fn expression(source: &str) -> Self {
        Prop::Expr(Expression::parse(strip_delimiters(source)))
    }

    pub fn computed(
        deps: impl IntoIterator<Item = impl Into<String>>,
        compute: impl Fn(Option<&dyn Context>) -> T + Send + Sync + 'static,
    ) -> Self {
        Prop::Computed {
            deps: deps.into_iter().map(Into::into).collect(),
            compute: Arc::new(compute),
        }
    }

    pub fn kind(&self) -> PropKind {
        match self {
            Prop::Static(_) => PropKind::Static,
            Prop::Bound(_) => PropKind::Bound,
            Prop::Expr(_) => PropKind::Expression,
            Prop::Computed { .. } => PropKind::Computed,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Prop::Static(_))
    }

    /// State keys this prop reads: the explicit list for `Computed`, the root
    /// segment of the path for `Bound`, the extracted names for `Expr`, and
    /// nothing for `Static`.
    pub fn dependencies(&self) -> Vec<String> {
        match self {
            Prop::Static(_) => Vec::new(),
            Prop::Bound(path) => {
                let head = path.split('.').next().unwrap_or(path);
                vec![head.to_string()]
            }
            Prop::Expr(expr) => expr.dependencies().to_vec(),
            Prop::Computed { deps, .. } => deps.clone(),
        }
    }

    /// Demotes this prop to a static value, dropping any binding.
    pub fn set_static(&mut self, value: T) {
        *self = Prop::Static(value);
    }
}

impl<T: FromValue + Default> Prop<T> {
    /// Classifies a raw property string. Without `{{ }}` the text itself is
    /// converted to `T` and stored as a static value.
    pub fn parse(raw: &str) -> Self {
        if !raw.contains(BIND_OPEN) {
            let value = T::from_value(&Value::Str(raw.to_string())).unwrap_or_default();
            return Prop::Static(value);
        }
        let inner = strip_delimiters(raw);
        if is_simple_path(inner) {
            Prop::Bound(inner.to_string())
        } else {
            Prop::Expr(Expression::parse(inner))
        }
    }
}

impl Prop<String> {
    pub fn string(raw: &str) -> Self {
        Prop::parse(raw)
    }
}

impl<T: FromValue + Default + Clone> Prop<T> {
    pub fn resolve(&self, ctx: Option<&dyn Context>) -> T {
        match self {
            Prop::Static(v) => v.clone(),
            Prop::Bound(path) => match ctx.and_then(|c| c.get(path)) {
                Some(v) => coerce(&v),
                None => T::default(),
            },
            Prop::Expr(expr) => coerce(&expr.evaluate(ctx)),
            Prop::Computed { compute, .. } => compute(ctx),
        }
    }

    /// Registers every dependency of this prop for `node` before resolving,
    /// so a binding that currently fails is still invalidated later.
    pub fn resolve_with_tracking(
        &self,
        ctx: Option<&dyn Context>,
        node: &str,
        tracker: &dyn DependencyTracker,
    ) -> T {
        for key in self.dependencies() {
            tracker.register(node, &key);
        }
        self.resolve(ctx)
    }
}

fn coerce<T: FromValue + Default>(value: &Value) -> T {
    T::from_value(value).unwrap_or_else(|err| {
        log::trace!("prop resolved to default: {err}");
        T::default()
    })
}

impl<T: Clone> Clone for Prop<T> {
    fn clone(&self) -> Self {
        match self {
            Prop::Static(v) => Prop::Static(v.clone()),
            Prop::Bound(path) => Prop::Bound(path.clone()),
            Prop::Expr(expr) => Prop::Expr(expr.clone()),
            Prop::Computed { deps, compute } => Prop::Computed {
                deps: deps.clone(),
                compute: Arc::clone(compute),
            },
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Prop::Bound(path) => f.debug_tuple("Bound").field(path).finish(),
            Prop::Expr(expr) => f.debug_tuple("Expr").field(&expr.source()).finish(),
            Prop::Computed { deps, .. } => f.debug_struct("Computed").field("deps", deps).finish(),
        }
    }
}

impl<T: Default> Default for Prop<T> {
    fn default() -> Self {
        Prop::Static(T::default())
    }
}
