use std::fmt;
use std::sync::Arc;

use commandment_core::{
    ClockSource, CodecError, Logger, OperationDescriptor, OperationMetadata,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::service::context::ExecutionContext;
use crate::service::dependencies::Dependencies;
use crate::service::execute::execute_operation;
use crate::service::registry::Contract;

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// Whether an operation mutates state (command) or only reads it (query).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Command,
    Query,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationParts
// ---------------------------------------------------------------------------

/// Everything the bus injects into an operation at construction.
///
/// Concrete operations wrap one of these and hand it back through
/// [`Operation::parts`]; the provided trait methods do the rest.
pub struct OperationParts<P, S: ?Sized> {
    pub params: P,
    pub service: Arc<S>,
    pub metadata: OperationMetadata,
    pub logger: Arc<dyn Logger>,
    pub clock: Arc<dyn ClockSource>,
    pub dependencies: Option<Dependencies>,
}

impl<P: fmt::Debug, S: Contract + ?Sized> fmt::Debug for OperationParts<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationParts")
            .field("params", &self.params)
            .field("service", &S::NAME)
            .field("metadata", &self.metadata)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Operation trait
// ---------------------------------------------------------------------------

/// A typed, self-describing unit of work bound to one service contract.
///
/// Implementors supply the type tag, the parameter/service/output types, and
/// [`invoke`](Operation::invoke), which forwards to the service. Execution
/// (stamping, logging, metrics), accessors and the descriptor all come from
/// the provided methods.
///
/// Instances are built by [`OperationBus`](crate::service::bus::OperationBus),
/// never directly.
pub trait Operation: Sized + 'static {
    /// Stable, unique name of the operation type. Appears on the wire.
    const TYPE_TAG: &'static str;
    const KIND: OperationKind;

    type Params: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;
    type Service: Contract + ?Sized;
    type Output;

    fn from_parts(parts: OperationParts<Self::Params, Self::Service>) -> Self;
    fn parts(&self) -> &OperationParts<Self::Params, Self::Service>;
    fn parts_mut(&mut self) -> &mut OperationParts<Self::Params, Self::Service>;

    /// Business logic: call the bound service with the operation's params.
    ///
    /// # Errors
    ///
    /// Whatever the service returns, unchanged.
    fn invoke(
        service: &Self::Service,
        params: &Self::Params,
        ctx: &ExecutionContext,
    ) -> anyhow::Result<Self::Output>;

    /// Run the operation through the execution wrapper.
    ///
    /// The service sees `ctx` with this operation's dependencies attached (they
    /// replace any dependencies already on `ctx`). Executing again re-stamps
    /// `executed` and `returned`.
    ///
    /// # Errors
    ///
    /// Returns the service's error unchanged.
    fn execute(&mut self, ctx: &ExecutionContext) -> anyhow::Result<Self::Output> {
        let parts = self.parts_mut();
        let ctx = match &parts.dependencies {
            Some(deps) => ctx.clone().with_dependencies(deps.clone()),
            None => ctx.clone(),
        };
        let service = &*parts.service;
        let params = &parts.params;
        execute_operation(
            Self::TYPE_TAG,
            &mut parts.metadata,
            parts.logger.as_ref(),
            parts.clock.as_ref(),
            || Self::invoke(service, params, &ctx),
        )
    }

    fn params(&self) -> &Self::Params {
        &self.parts().params
    }

    fn metadata(&self) -> &OperationMetadata {
        &self.parts().metadata
    }

    fn service(&self) -> &Arc<Self::Service> {
        &self.parts().service
    }

    fn dependencies(&self) -> Option<&Dependencies> {
        self.parts().dependencies.as_ref()
    }

    /// Plain-data snapshot: type tag, params and current metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Params`] if the params have no JSON representation.
    fn descriptor(&self) -> Result<OperationDescriptor, CodecError> {
        OperationDescriptor::from_params(
            Self::TYPE_TAG,
            &self.parts().params,
            self.parts().metadata.clone(),
        )
    }
}

/// State-changing operation.
pub trait Command: Operation {}

/// Read-only operation.
pub trait Query: Operation {}

// ---------------------------------------------------------------------------
// BusError
// ---------------------------------------------------------------------------

/// Errors raised by the bus itself, never by services.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("service contract {contract} not registered (required by {operation_type})")]
    ServiceNotRegistered {
        contract: &'static str,
        operation_type: &'static str,
    },
    #[error("unknown operation type: {type_tag}")]
    UnknownOperationType { type_tag: String },
    #[error("invalid params for {type_tag}: {source}")]
    Decode {
        type_tag: String,
        #[source]
        source: CodecError,
    },
    #[error("descriptor type {found} does not match operation type {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("operation type tag {type_tag} declared more than once")]
    DuplicateTypeTag { type_tag: &'static str },
    #[error("service contracts not registered: {}", contracts.join(", "))]
    MissingContracts { contracts: Vec<&'static str> },
    #[error(transparent)]
    Codec(#[from] CodecError),
}
