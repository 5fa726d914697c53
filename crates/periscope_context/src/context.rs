//! Append-only context chain.
//!
//! A [`Context`] is a handle to the innermost [`Scope`] of a chain. Lookups
//! walk from the innermost scope outwards, so the closest binding of a type
//! shadows any binding further up the chain.

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

/// A value that can be stored in a [`Context`].
///
/// Any `Send + Sync + 'static` type qualifies. Values are keyed by their type,
/// so wrap plain data in a newtype to give it a distinct identity:
///
/// ```
/// use periscope_context::Context;
///
/// struct TenantId(String);
///
/// let ctx = Context::new().with(TenantId("acme".into()));
/// assert_eq!(ctx.get::<TenantId>().map(|t| t.0.as_str()), Some("acme"));
/// ```
pub trait ContextValue: Send + Sync + 'static {
    /// Returns the type name for debugging purposes.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl<T: Send + Sync + 'static> ContextValue for T {}

/// A stored value together with its type name.
struct Entry {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// One link of the chain.
///
/// ```text
/// Scope
/// ├── parent: Option<Arc<Scope>>        (shared, read-only)
/// ├── values: HashMap<TypeId, Entry>     (frozen once the scope is built)
/// └── depth: usize                       (number of scopes up to the root)
/// ```
struct Scope {
    parent: Option<Arc<Scope>>,
    values: HashMap<TypeId, Entry>,
    depth: usize,
}

/// Immutable, typed execution context.
///
/// Cloning a `Context` is an `Arc` clone. Deriving a child with
/// [`with`](Self::with) or [`child`](Self::child) never changes the receiver,
/// which makes a context safe to share between concurrently resolving fields.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Scope>>,
}

impl Context {
    /// Creates an empty root context.
    #[must_use]
    pub fn new() -> Self {
        Self { head: None }
    }

    /// Derives a child context binding `value`.
    ///
    /// The binding shadows any value of the same type in this context.
    ///
    /// # Example
    ///
    /// ```
    /// use periscope_context::Context;
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct Depth(u32);
    ///
    /// let outer = Context::new().with(Depth(1));
    /// let inner = outer.with(Depth(2));
    ///
    /// assert_eq!(outer.get::<Depth>(), Some(&Depth(1)));
    /// assert_eq!(inner.get::<Depth>(), Some(&Depth(2)));
    /// ```
    #[must_use]
    pub fn with<T: ContextValue>(&self, value: T) -> Context {
        self.child().insert(value).finish()
    }

    /// Starts a child scope that can bind several values at once.
    #[must_use]
    pub fn child(&self) -> ContextBuilder {
        ContextBuilder {
            parent: self.head.clone(),
            values: HashMap::new(),
        }
    }

    /// Gets a reference to the closest value of type `T`, walking up the chain.
    #[must_use]
    pub fn get<T: ContextValue>(&self) -> Option<&T> {
        let type_id = TypeId::of::<T>();
        let mut scope = self.head.as_deref();
        while let Some(current) = scope {
            if let Some(entry) = current.values.get(&type_id) {
                return entry.value.downcast_ref::<T>();
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Returns `true` if a value of type `T` is bound anywhere in the chain.
    #[must_use]
    pub fn contains<T: ContextValue>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Returns `true` if a value of type `T` is bound in the innermost scope.
    #[must_use]
    pub fn contains_local<T: ContextValue>(&self) -> bool {
        self.head
            .as_ref()
            .is_some_and(|scope| scope.values.contains_key(&TypeId::of::<T>()))
    }

    /// Returns the number of scopes between this context and the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.head.as_ref().map_or(0, |scope| scope.depth)
    }

    /// Returns `true` if nothing has been bound yet.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// Returns `true` if both handles point at the same scope.
    #[must_use]
    pub fn ptr_eq(&self, other: &Context) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the type names of all visible bindings, innermost first.
    ///
    /// Shadowed bindings are listed once, at their closest position.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut seen = hashbrown::HashSet::new();
        let mut names = Vec::new();
        let mut scope = self.head.as_deref();
        while let Some(current) = scope {
            for (type_id, entry) in &current.values {
                if seen.insert(*type_id) {
                    names.push(entry.type_name);
                }
            }
            scope = current.parent.as_deref();
        }
        names
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("values", &self.type_names())
            .finish()
    }
}

/// Builder for a child scope holding several values.
///
/// # Example
///
/// ```
/// use periscope_context::Context;
///
/// struct UserId(u64);
/// struct Locale(&'static str);
///
/// let ctx = Context::new()
///     .child()
///     .insert(UserId(1))
///     .insert(Locale("en"))
///     .finish();
///
/// assert_eq!(ctx.depth(), 1);
/// assert!(ctx.contains::<UserId>() && ctx.contains::<Locale>());
/// ```
pub struct ContextBuilder {
    parent: Option<Arc<Scope>>,
    values: HashMap<TypeId, Entry>,
}

impl ContextBuilder {
    /// Binds `value` in the scope being built. A later insert of the same
    /// type replaces the earlier one.
    #[must_use]
    pub fn insert<T: ContextValue>(mut self, value: T) -> Self {
        self.values.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: value.type_name(),
                value: Box::new(value),
            },
        );
        self
    }

    /// Freezes the scope and returns the derived context.
    ///
    /// An empty builder returns the parent context unchanged.
    #[must_use]
    pub fn finish(self) -> Context {
        if self.values.is_empty() {
            return Context { head: self.parent };
        }
        let depth = self.parent.as_ref().map_or(0, |scope| scope.depth) + 1;
        Context {
            head: Some(Arc::new(Scope {
                parent: self.parent,
                values: self.values,
                depth,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Path(Vec<&'static str>);

    #[derive(Debug, PartialEq)]
    struct Marker;

    #[test]
    fn empty_context_has_no_values() {
        let ctx = Context::new();
        assert!(ctx.is_root());
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.get::<Path>().is_none());
    }

    #[test]
    fn with_does_not_mutate_receiver() {
        let root = Context::new().with(Path(vec![]));
        let child = root.with(Path(vec!["a"]));

        assert_eq!(root.get::<Path>(), Some(&Path(vec![])));
        assert_eq!(child.get::<Path>(), Some(&Path(vec!["a"])));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let ctx = Context::new().with(Marker).with(Path(vec!["a"]));
        assert_eq!(ctx.get::<Marker>(), Some(&Marker));
        assert!(ctx.contains_local::<Path>());
        assert!(!ctx.contains_local::<Marker>());
    }

    #[test]
    fn siblings_are_isolated() {
        let parent = Context::new().with(Path(vec!["root"]));
        let a = parent.with(Marker);
        let b = parent.with(Path(vec!["b"]));

        assert!(a.contains::<Marker>());
        assert!(!b.contains::<Marker>());
        assert_eq!(a.get::<Path>(), Some(&Path(vec!["root"])));
    }

    #[test]
    fn empty_builder_returns_parent() {
        let parent = Context::new().with(Marker);
        let same = parent.child().finish();
        assert!(same.ptr_eq(&parent));
    }

    #[test]
    fn type_names_lists_shadowed_once() {
        let ctx = Context::new().with(Marker).with(Marker);
        assert_eq!(ctx.type_names().len(), 1);
    }

    #[test]
    fn context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Context>();
    }
}
