use crate::scope::Scope;
use crate::value::{Value, ValueMap};

/// Read/write access to bound data by dotted path.
///
/// Components, layout and paint code only ever see data through this trait.
/// [`Scope`] is the implementation; the trait exists so collaborators can be
/// written against `&dyn Context` and tested with whatever scope chain they
/// build.
///
/// Paths are dotted (`user.address.city`). Names starting with `$` are
/// relative variables: `$index`, `$item`, `$parent`, `$root` and
/// `$parent.<path>`.
pub trait Context: Send + Sync {
    /// Looks `path` up, falling back to ancestors. `None` means not found,
    /// which is an ordinary outcome.
    fn get(&self, path: &str) -> Option<Value>;

    /// Writes into this context only, creating intermediate maps. Returns
    /// `false` when the path is empty or crosses a non-container value.
    fn set(&self, path: &str, value: Value) -> bool;

    fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    fn parent(&self) -> Option<Scope>;

    /// The outermost ancestor (or this context when it has no parent).
    fn root(&self) -> Scope;

    /// A new child context whose parent is this one.
    fn new_child(&self, data: ValueMap) -> Scope;
}
