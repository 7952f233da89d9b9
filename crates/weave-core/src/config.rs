use std::borrow::Cow;
use std::fmt;

/// Opaque priority label passed through to the dirty callback. The store
/// never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zone(Cow<'static, str>);

impl Zone {
    pub const DATA: Zone = Zone(Cow::Borrowed("data"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::DATA
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings for a [`ReactiveStore`](crate::ReactiveStore).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Whether notifications fire at all. Mutations happen either way.
    pub enabled: bool,
    /// Zone used by `set`, `delete` and `set_all`.
    pub default_zone: Zone,
    /// Also dirty nodes registered on the dotted ancestors of a written key
    /// (`user` and `user.profile` for `user.profile.name`). Off by default:
    /// keys are opaque and only exact registrations are dirtied.
    pub notify_ancestors: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_zone: Zone::DATA,
            notify_ancestors: false,
        }
    }
}

impl StoreConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_default_zone(mut self, zone: Zone) -> Self {
        self.default_zone = zone;
        self
    }

    pub fn with_notify_ancestors(mut self, on: bool) -> Self {
        self.notify_ancestors = on;
        self
    }
}
