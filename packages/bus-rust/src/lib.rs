//! Commandment bus: service registry, operation factory and execution wrapper.

pub mod logging;
pub mod service;

pub use commandment_core;

pub use service::{
    BusConfig, BusError, Command, Contract, Dependencies, ExecutionContext, Operation,
    OperationBus, OperationKind, OperationSet, Query, RegistryError, ServiceRegistry,
};
