//! Service contracts of the node manager domain.

use crate::service::context::ExecutionContext;
use crate::service::registry::Contract;

use super::params::{
    CreateListCommandParams, DisplayNodeTreeCommandParams, Node, NodeCommandResult, NodeTree,
    ShowNodeQueryParams,
};

/// Renders node hierarchies.
pub trait TreeService: Send + Sync {
    /// # Errors
    ///
    /// Implementation-defined; returned unchanged to the caller.
    fn display_tree(
        &self,
        ctx: &ExecutionContext,
        params: &DisplayNodeTreeCommandParams,
    ) -> anyhow::Result<NodeTree>;
}

impl Contract for dyn TreeService {
    const NAME: &'static str = "TreeService";
}

/// Creates lists. Validation failures are reported in the result, not as errors.
pub trait ListService: Send + Sync {
    /// # Errors
    ///
    /// Implementation-defined; returned unchanged to the caller.
    fn create_list(
        &self,
        ctx: &ExecutionContext,
        params: &CreateListCommandParams,
    ) -> anyhow::Result<NodeCommandResult>;
}

impl Contract for dyn ListService {
    const NAME: &'static str = "ListService";
}

/// Looks up single nodes.
pub trait NodeService: Send + Sync {
    /// # Errors
    ///
    /// Implementation-defined; returned unchanged to the caller.
    fn show_node(&self, ctx: &ExecutionContext, params: &ShowNodeQueryParams)
        -> anyhow::Result<Node>;
}

impl Contract for dyn NodeService {
    const NAME: &'static str = "NodeService";
}
