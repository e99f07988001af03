//! Closed sets of operation types.
//!
//! The reverse path needs to map a type tag back to a concrete operation type.
//! An [`OperationSet`] is a tagged union over the operation types a program
//! knows about; [`operation_set!`](crate::operation_set) generates one together
//! with its [`OperationCatalog`], which is checked against a registry at
//! startup.

use std::any::TypeId;

use commandment_core::{CodecError, OperationDescriptor, OperationMetadata};

use crate::service::bus::OperationBus;
use crate::service::operation::{BusError, Operation, OperationKind};
use crate::service::registry::{Contract, ServiceRegistry};

// ---------------------------------------------------------------------------
// OperationCatalog
// ---------------------------------------------------------------------------

/// Static description of one operation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub type_tag: &'static str,
    pub kind: OperationKind,
    /// Name of the service contract the operation binds to.
    pub contract: &'static str,
    contract_id: TypeId,
}

/// Ordered list of operation types with unique tags.
#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    entries: Vec<CatalogEntry>,
}

impl OperationCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `O` to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateTypeTag`] if another entry already uses
    /// `O::TYPE_TAG`.
    pub fn register<O: Operation>(&mut self) -> Result<(), BusError> {
        if self.contains(O::TYPE_TAG) {
            return Err(BusError::DuplicateTypeTag {
                type_tag: O::TYPE_TAG,
            });
        }
        self.entries.push(CatalogEntry {
            type_tag: O::TYPE_TAG,
            kind: O::KIND,
            contract: <O::Service as Contract>::NAME,
            contract_id: TypeId::of::<O::Service>(),
        });
        Ok(())
    }

    /// Entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entry for `type_tag`, if catalogued.
    #[must_use]
    pub fn get(&self, type_tag: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.type_tag == type_tag)
    }

    /// Returns true if `type_tag` is catalogued.
    #[must_use]
    pub fn contains(&self, type_tag: &str) -> bool {
        self.get(type_tag).is_some()
    }

    /// Number of catalogued operation types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is catalogued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contracts required by catalog entries but absent from `registry`,
    /// sorted and deduplicated.
    #[must_use]
    pub fn missing_contracts(&self, registry: &ServiceRegistry) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|entry| !registry.contains_type(entry.contract_id))
            .map(|entry| entry.contract)
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// # Errors
    ///
    /// Returns [`BusError::MissingContracts`] if any required contract is not
    /// registered.
    pub fn validate(&self, registry: &ServiceRegistry) -> Result<(), BusError> {
        let contracts = self.missing_contracts(registry);
        if contracts.is_empty() {
            Ok(())
        } else {
            Err(BusError::MissingContracts { contracts })
        }
    }
}

// ---------------------------------------------------------------------------
// OperationSet
// ---------------------------------------------------------------------------

/// Tagged union over a closed set of operation types.
///
/// Implement with [`operation_set!`](crate::operation_set).
pub trait OperationSet: Sized {
    /// Catalog of the member operation types.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateTypeTag`] if two members share a tag.
    fn catalog() -> Result<OperationCatalog, BusError>;

    /// Rebuild the member named by `descriptor.type_tag`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownOperationType`] for tags outside the set,
    /// otherwise whatever [`OperationBus::restore`] returns.
    fn rehydrate(bus: &OperationBus, descriptor: &OperationDescriptor) -> Result<Self, BusError>;

    fn type_tag(&self) -> &'static str;

    fn metadata(&self) -> &OperationMetadata;

    /// # Errors
    ///
    /// See [`Operation::descriptor`].
    fn descriptor(&self) -> Result<OperationDescriptor, CodecError>;
}

/// Declare an enum over operation types and implement [`OperationSet`] for it.
///
/// ```ignore
/// operation_set! {
///     #[derive(Debug)]
///     pub enum NodeOperation {
///         ShowNode(ShowNodeQuery),
///         CreateList(CreateListCommand),
///     }
/// }
/// ```
///
/// Also generates `From<Op>` for every member.
#[macro_export]
macro_rules! operation_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($op:ty) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant($op), )+
        }

        impl $crate::service::catalog::OperationSet for $name {
            fn catalog() -> ::std::result::Result<
                $crate::service::catalog::OperationCatalog,
                $crate::service::operation::BusError,
            > {
                let mut catalog = $crate::service::catalog::OperationCatalog::new();
                $( catalog.register::<$op>()?; )+
                ::std::result::Result::Ok(catalog)
            }

            fn rehydrate(
                bus: &$crate::service::bus::OperationBus,
                descriptor: &$crate::commandment_core::OperationDescriptor,
            ) -> ::std::result::Result<Self, $crate::service::operation::BusError> {
                let tag = descriptor.type_tag.as_str();
                $(
                    if tag == <$op as $crate::service::operation::Operation>::TYPE_TAG {
                        return bus.restore::<$op>(descriptor).map($name::$variant);
                    }
                )+
                ::std::result::Result::Err(
                    $crate::service::operation::BusError::UnknownOperationType {
                        type_tag: tag.to_string(),
                    },
                )
            }

            fn type_tag(&self) -> &'static str {
                match self {
                    $( $name::$variant(_) => <$op as $crate::service::operation::Operation>::TYPE_TAG, )+
                }
            }

            fn metadata(&self) -> &$crate::commandment_core::OperationMetadata {
                match self {
                    $( $name::$variant(op) => $crate::service::operation::Operation::metadata(op), )+
                }
            }

            fn descriptor(
                &self,
            ) -> ::std::result::Result<
                $crate::commandment_core::OperationDescriptor,
                $crate::commandment_core::CodecError,
            > {
                match self {
                    $( $name::$variant(op) => $crate::service::operation::Operation::descriptor(op), )+
                }
            }
        }

        $(
            impl ::std::convert::From<$op> for $name {
                fn from(op: $op) -> Self {
                    $name::$variant(op)
                }
            }
        )+
    };
}
