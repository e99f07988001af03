//! Operation construction and execution framework.
//!
//! 1. **Registry** (`registry`): contract-keyed singleton services
//! 2. **Operations** (`operation`): the `Operation` trait, `Command`/`Query` markers, `BusError`
//! 3. **Execution** (`execute`): stamping, logging and metrics around business logic
//! 4. **Bus** (`bus`): builds operations forward from params and backward from descriptors
//! 5. **Catalog** (`catalog`): closed operation sets and startup validation
//! 6. **Domain** (`domain`): the node manager reference domain

pub mod bus;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dependencies;
pub mod domain;
pub mod execute;
pub mod operation;
pub mod registry;

// Re-export key types for convenient access.
pub use bus::OperationBus;
pub use catalog::{CatalogEntry, OperationCatalog, OperationSet};
pub use config::BusConfig;
pub use context::{CancellationFlag, ExecutionContext};
pub use dependencies::Dependencies;
pub use execute::execute_operation;
pub use operation::{BusError, Command, Operation, OperationKind, OperationParts, Query};
pub use registry::{Contract, RegistryError, ServiceRegistry};
