//! Node manager: the reference domain built on the operation framework.
//!
//! Three contracts (`TreeService`, `ListService`, `NodeService`), their mock
//! implementations, one operation per contract method, and the
//! [`NodeOperation`] set used to rebuild any of them from a descriptor.

use std::sync::Arc;

use crate::service::registry::ServiceRegistry;

pub mod invoker;
pub mod mock;
pub mod operations;
pub mod params;
pub mod services;

pub use invoker::{CommandInvoker, NodeManagerBus, OperationInvoker, QueryInvoker};
pub use mock::{MockListService, MockNodeService, MockTreeService};
pub use operations::{CreateListCommand, DisplayNodeTreeCommand, ShowNodeQuery};
pub use params::{
    CreateListCommandParams, DisplayNodeTreeCommandParams, Node, NodeCommandResult, NodeTree,
    ShowNodeQueryParams, TreeStats, ValidationError,
};
pub use services::{ListService, NodeService, TreeService};

crate::operation_set! {
    /// Every node manager operation.
    #[derive(Debug)]
    pub enum NodeOperation {
        ShowNode(ShowNodeQuery),
        DisplayNodeTree(DisplayNodeTreeCommand),
        CreateList(CreateListCommand),
    }
}

/// Register the mock implementation of every node manager contract.
pub fn register_mock_services(registry: &ServiceRegistry) {
    registry.register::<dyn TreeService>(Arc::new(MockTreeService::new()));
    registry.register::<dyn ListService>(Arc::new(MockListService::new()));
    registry.register::<dyn NodeService>(Arc::new(MockNodeService::new()));
}
