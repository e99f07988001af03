//! Node manager operations.

use crate::service::context::ExecutionContext;
use crate::service::operation::{Command, Operation, OperationKind, OperationParts, Query};

use super::params::{
    CreateListCommandParams, DisplayNodeTreeCommandParams, Node, NodeCommandResult, NodeTree,
    ShowNodeQueryParams,
};
use super::services::{ListService, NodeService, TreeService};

// ---------------------------------------------------------------------------
// Macro for the per-operation wiring
// ---------------------------------------------------------------------------

/// Generate an operation struct bound to one contract method.
///
/// The type tag is the struct name.
macro_rules! node_operation {
    (
        $(#[$meta:meta])*
        $name:ident: $marker:ident,
        params = $params:ty,
        service = $svc:ident::$method:ident,
        output = $output:ty $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            parts: OperationParts<$params, dyn $svc>,
        }

        impl Operation for $name {
            const TYPE_TAG: &'static str = stringify!($name);
            const KIND: OperationKind = OperationKind::$marker;
            type Params = $params;
            type Service = dyn $svc;
            type Output = $output;

            fn from_parts(parts: OperationParts<$params, dyn $svc>) -> Self {
                Self { parts }
            }

            fn parts(&self) -> &OperationParts<$params, dyn $svc> {
                &self.parts
            }

            fn parts_mut(&mut self) -> &mut OperationParts<$params, dyn $svc> {
                &mut self.parts
            }

            fn invoke(
                service: &dyn $svc,
                params: &$params,
                ctx: &ExecutionContext,
            ) -> anyhow::Result<$output> {
                service.$method(ctx, params)
            }
        }

        impl $marker for $name {}
    };
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

node_operation!(
    /// Look up a single node by reference.
    ShowNodeQuery: Query,
    params = ShowNodeQueryParams,
    service = NodeService::show_node,
    output = Node,
);

node_operation!(
    /// Render the node tree below a root, up to a depth.
    DisplayNodeTreeCommand: Command,
    params = DisplayNodeTreeCommandParams,
    service = TreeService::display_tree,
    output = NodeTree,
);

node_operation!(
    /// Create a list, optionally under a parent node.
    CreateListCommand: Command,
    params = CreateListCommandParams,
    service = ListService::create_list,
    output = NodeCommandResult,
);
