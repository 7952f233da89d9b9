pub use crate::config::{StoreConfig, Zone};
pub use crate::context::Context;
pub use crate::convert::FromValue;
pub use crate::error::*;
pub use crate::expr::{Expression, parse_expression};
pub use crate::graph::{DependencyGraph, DependencyTracker};
pub use crate::prop::{Prop, PropKind};
pub use crate::scope::Scope;
pub use crate::store::ReactiveStore;
pub use crate::subscription::{Subscription, SubscriptionId};
pub use crate::value::{Value, ValueMap};
