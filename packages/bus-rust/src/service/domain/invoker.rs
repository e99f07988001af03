//! Capability-scoped construction handles for node manager operations.
//!
//! Code that should only read takes `&dyn QueryInvoker` and cannot build a
//! command through it.

use std::sync::Arc;

use crate::service::bus::OperationBus;
use crate::service::operation::BusError;

use super::operations::{CreateListCommand, DisplayNodeTreeCommand, ShowNodeQuery};
use super::params::{CreateListCommandParams, DisplayNodeTreeCommandParams, ShowNodeQueryParams};
use super::NodeOperation;

/// Builds read-only operations.
pub trait QueryInvoker {
    /// # Errors
    ///
    /// See [`OperationBus::create`].
    fn new_show_node_query(&self, params: ShowNodeQueryParams) -> Result<ShowNodeQuery, BusError>;
}

/// Builds state-changing operations.
pub trait CommandInvoker {
    /// # Errors
    ///
    /// See [`OperationBus::create`].
    fn new_display_node_tree_command(
        &self,
        params: DisplayNodeTreeCommandParams,
    ) -> Result<DisplayNodeTreeCommand, BusError>;

    /// # Errors
    ///
    /// See [`OperationBus::create`].
    fn new_create_list_command(
        &self,
        params: CreateListCommandParams,
    ) -> Result<CreateListCommand, BusError>;
}

/// Both capabilities.
pub trait OperationInvoker: QueryInvoker + CommandInvoker {}

impl<T: QueryInvoker + CommandInvoker> OperationInvoker for T {}

/// Node manager front end over a shared [`OperationBus`].
#[derive(Clone)]
pub struct NodeManagerBus {
    bus: Arc<OperationBus>,
}

impl NodeManagerBus {
    #[must_use]
    pub fn new(bus: Arc<OperationBus>) -> Self {
        Self { bus }
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<OperationBus> {
        &self.bus
    }

    /// Rebuild a node manager operation from its encoded descriptor.
    ///
    /// # Errors
    ///
    /// See [`OperationBus::decode`].
    pub fn decode(
        &self,
        bytes: &[u8],
        codec: &dyn commandment_core::DescriptorCodec,
    ) -> Result<NodeOperation, BusError> {
        self.bus.decode(bytes, codec)
    }
}

impl QueryInvoker for NodeManagerBus {
    fn new_show_node_query(&self, params: ShowNodeQueryParams) -> Result<ShowNodeQuery, BusError> {
        self.bus.create(params)
    }
}

impl CommandInvoker for NodeManagerBus {
    fn new_display_node_tree_command(
        &self,
        params: DisplayNodeTreeCommandParams,
    ) -> Result<DisplayNodeTreeCommand, BusError> {
        self.bus.create(params)
    }

    fn new_create_list_command(
        &self,
        params: CreateListCommandParams,
    ) -> Result<CreateListCommand, BusError> {
        self.bus.create(params)
    }
}
