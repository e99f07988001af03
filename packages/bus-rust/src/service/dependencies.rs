//! Opaque per-operation dependency payloads.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Type-erased dependency value attached to an operation.
///
/// The framework never inspects the payload: it is carried on the operation
/// instance and surfaced through the [`ExecutionContext`] passed to the
/// service, where the service downcasts it to the type it expects.
///
/// Cloning is cheap and shares the payload.
///
/// [`ExecutionContext`]: crate::service::context::ExecutionContext
#[derive(Clone)]
pub struct Dependencies {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Dependencies {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an already shared value without another allocation.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Borrow the payload as `T`, or `None` if it holds a different type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Shared handle to the payload as `T`, or `None` if it holds a different type.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Rust type name of the payload, for logs.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if both handles share the same payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tenant(&'static str);

    #[test]
    fn downcast_to_stored_type() {
        let deps = Dependencies::new(Tenant("acme"));
        assert_eq!(deps.downcast_ref::<Tenant>(), Some(&Tenant("acme")));
        assert_eq!(deps.downcast::<Tenant>().as_deref(), Some(&Tenant("acme")));
        assert!(deps.type_name().ends_with("Tenant"));
    }

    #[test]
    fn downcast_to_other_type_is_none() {
        let deps = Dependencies::new(7_u32);
        assert!(deps.downcast_ref::<String>().is_none());
        assert!(deps.downcast::<u64>().is_none());
    }

    #[test]
    fn clones_share_payload() {
        let deps = Dependencies::new(String::from("shared"));
        let copy = deps.clone();
        assert!(deps.ptr_eq(&copy));
        assert!(!deps.ptr_eq(&Dependencies::new(String::from("shared"))));
    }
}
