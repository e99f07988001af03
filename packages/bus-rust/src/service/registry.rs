use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// Contract trait
// ---------------------------------------------------------------------------

/// Marks a service contract: the trait object type under which an
/// implementation is registered and looked up.
///
/// Implemented on the contract's trait object, not on implementations:
///
/// ```ignore
/// pub trait ListService: Send + Sync { /* ... */ }
/// impl Contract for dyn ListService {
///     const NAME: &'static str = "ListService";
/// }
/// ```
///
/// Identity is the `TypeId` of the contract type itself, so a mock and a
/// production implementation registered against the same contract are
/// interchangeable to every consumer.
pub trait Contract: Send + Sync + 'static {
    /// Contract name used in logs and error messages.
    const NAME: &'static str;
}

/// Errors returned by [`ServiceRegistry`] lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("service contract {contract} not registered")]
    ServiceNotRegistered { contract: &'static str },
}

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

struct Registration {
    contract: &'static str,
    /// Always holds an `Arc<C>` for the contract `C` it is keyed under.
    service: Arc<dyn Any + Send + Sync>,
}

/// Contract-keyed store of singleton service instances.
///
/// At most one implementation per contract; registering again replaces the
/// previous one (last write wins). All access goes through sharded locks, so
/// registration may overlap with lookups from other threads.
pub struct ServiceRegistry {
    by_type: DashMap<TypeId, Registration>,
    /// First-registration order, for diagnostics.
    order: RwLock<Vec<&'static str>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_type: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register `service` as the implementation of contract `C`.
    ///
    /// ```ignore
    /// registry.register::<dyn ListService>(Arc::new(MockListService::new()));
    /// ```
    pub fn register<C: Contract + ?Sized>(&self, service: Arc<C>) {
        let registration = Registration {
            contract: C::NAME,
            service: Arc::new(service),
        };
        if self
            .by_type
            .insert(TypeId::of::<C>(), registration)
            .is_some()
        {
            tracing::warn!(target: "commandment::registry", contract = C::NAME, "Service replaced");
        } else {
            self.order.write().push(C::NAME);
            tracing::debug!(target: "commandment::registry", contract = C::NAME, "Service registered");
        }
    }

    /// Retrieve the implementation registered for contract `C`.
    ///
    /// Returns the registered `Arc` itself, not a copy of the service.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ServiceNotRegistered`] if nothing is registered for `C`.
    pub fn get<C: Contract + ?Sized>(&self) -> Result<Arc<C>, RegistryError> {
        self.by_type
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.service.downcast_ref::<Arc<C>>().cloned())
            .ok_or(RegistryError::ServiceNotRegistered { contract: C::NAME })
    }

    /// Returns true if an implementation is registered for contract `C`.
    #[must_use]
    pub fn contains<C: Contract + ?Sized>(&self) -> bool {
        self.contains_type(TypeId::of::<C>())
    }

    /// Returns true if an implementation is registered under the contract identity `id`.
    #[must_use]
    pub fn contains_type(&self, id: TypeId) -> bool {
        self.by_type.contains_key(&id)
    }

    /// Names of registered contracts in first-registration order.
    #[must_use]
    pub fn contracts(&self) -> Vec<&'static str> {
        self.order.read().clone()
    }

    /// Name of the contract registered under `id`, if any.
    #[must_use]
    pub fn contract_name(&self, id: TypeId) -> Option<&'static str> {
        self.by_type.get(&id).map(|entry| entry.contract)
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Returns true if no contract is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
