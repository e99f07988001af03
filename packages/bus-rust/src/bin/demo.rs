//! Walks the node manager domain through the operation bus.

use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use commandment_bus::commandment_core::{DescriptorCodec, JsonCodec, MsgPackCodec};
use commandment_bus::logging::{init_tracing, LogFormat};
use commandment_bus::service::domain::{
    register_mock_services, CommandInvoker, CreateListCommandParams, DisplayNodeTreeCommandParams,
    NodeManagerBus, NodeOperation, OperationInvoker, QueryInvoker, ShowNodeQueryParams,
};
use commandment_bus::{BusConfig, Operation, OperationBus, OperationSet, ServiceRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecKind {
    Json,
    Msgpack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    All,
    Tree,
    List,
    Show,
    Serialize,
    QueryOnly,
    Failures,
}

#[derive(Debug, Parser)]
#[command(name = "commandment-demo", about = "Operation bus walkthrough over the node manager domain")]
struct Cli {
    /// Default log filter, overridden by `COMMANDMENT_LOG`.
    #[arg(long, env = "COMMANDMENT_LOG_FILTER", default_value = "info")]
    log_filter: String,

    #[arg(long, env = "COMMANDMENT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Encoding used by the serialization scenario.
    #[arg(long, env = "COMMANDMENT_CODEC", value_enum, default_value_t = CodecKind::Json)]
    codec: CodecKind,

    /// Operation timeout in milliseconds for execution contexts (0 disables it).
    #[arg(long, env = "COMMANDMENT_OPERATION_TIMEOUT_MS", default_value_t = 30_000)]
    timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter, cli.log_format)?;

    let config = BusConfig {
        default_operation_timeout_ms: cli.timeout_ms,
        ..BusConfig::default()
    };
    let registry = Arc::new(ServiceRegistry::new());
    register_mock_services(&registry);
    let bus = Arc::new(OperationBus::from_config(registry, config));
    bus.validate::<NodeOperation>()
        .context("node manager services are not fully registered")?;
    let node_manager = NodeManagerBus::new(Arc::clone(&bus));

    let codec: Box<dyn DescriptorCodec> = match cli.codec {
        CodecKind::Json => Box::new(JsonCodec::pretty()),
        CodecKind::Msgpack => Box::new(MsgPackCodec),
    };

    let run = |scenario: Scenario| cli.scenario == Scenario::All || cli.scenario == scenario;

    if run(Scenario::Tree) {
        println!("\n1. DisplayNodeTreeCommand");
        display_tree(&node_manager, &bus)?;
    }
    if run(Scenario::List) {
        println!("\n2. CreateListCommand");
        create_list(&node_manager, &bus)?;
    }
    if run(Scenario::Show) {
        println!("\n3. ShowNodeQuery");
        show_node(&node_manager, &bus)?;
    }
    if run(Scenario::Serialize) {
        println!("\n4. Serialization ({})", codec.name());
        serialization(&node_manager, codec.as_ref())?;
    }
    if run(Scenario::QueryOnly) {
        println!("\n5. Query-only access");
        query_only(&node_manager, &bus)?;
    }
    if run(Scenario::Failures) {
        println!("\n6. Failure paths");
        failures(&node_manager, &bus, codec.as_ref());
    }

    println!("\nDone.");
    Ok(())
}

fn display_tree(invoker: &dyn OperationInvoker, bus: &OperationBus) -> anyhow::Result<()> {
    let mut command = invoker.new_display_node_tree_command(DisplayNodeTreeCommandParams {
        root_reference: "root-123".into(),
        max_depth: 3,
    })?;
    println!("   command id: {}", command.metadata().id());

    let tree = command.execute(&bus.execution_context())?;
    println!(
        "   {} nodes, max depth {}",
        tree.nodes.len(),
        tree.stats.max_depth
    );
    for node in &tree.nodes {
        println!("   - {} (id {})", node.title, node.id);
    }
    Ok(())
}

fn create_list(invoker: &dyn CommandInvoker, bus: &OperationBus) -> anyhow::Result<()> {
    for title in ["My New List", ""] {
        let mut command = invoker.new_create_list_command(CreateListCommandParams {
            title: title.into(),
            description: "A list created via command".into(),
            parent_id: None,
        })?;
        let result = command.execute(&bus.execution_context())?;
        if result.is_valid() {
            println!("   created list: {} (id {})", result.node.title, result.node.id);
        } else {
            for error in &result.errors {
                println!("   validation error: {}: {}", error.field, error.message);
            }
        }
    }
    Ok(())
}

fn show_node(invoker: &dyn QueryInvoker, bus: &OperationBus) -> anyhow::Result<()> {
    let mut query = invoker.new_show_node_query(ShowNodeQueryParams { reference: 42 })?;
    let node = query.execute(&bus.execution_context())?;
    println!("   node: {} (id {})", node.title, node.id);
    println!("   description: {}", node.description);
    Ok(())
}

fn serialization(node_manager: &NodeManagerBus, codec: &dyn DescriptorCodec) -> anyhow::Result<()> {
    let command = node_manager.new_create_list_command(CreateListCommandParams {
        title: "Serialization Test".into(),
        description: "Testing command serialization".into(),
        parent_id: None,
    })?;

    let bytes = node_manager.bus().encode(&command, codec)?;
    match codec.name() {
        "json" => println!("   encoded:\n{}", String::from_utf8_lossy(&bytes)),
        name => println!("   encoded: {} bytes of {name}", bytes.len()),
    }

    let restored = node_manager.decode(&bytes, codec)?;
    println!(
        "   decoded {} with id {}",
        restored.type_tag(),
        restored.metadata().id()
    );
    if let NodeOperation::CreateList(mut restored) = restored {
        let result = restored.execute(&node_manager.bus().execution_context())?;
        println!("   re-executed: {} (id {})", result.node.title, result.node.id);
    }
    Ok(())
}

fn query_only(queries: &dyn QueryInvoker, bus: &OperationBus) -> anyhow::Result<()> {
    let mut query = queries.new_show_node_query(ShowNodeQueryParams { reference: 7 })?;
    let node = query.execute(&bus.execution_context())?;
    println!("   query-only handle read node {}", node.id);
    Ok(())
}

fn failures(node_manager: &NodeManagerBus, bus: &OperationBus, codec: &dyn DescriptorCodec) {
    let bare = NodeManagerBus::new(Arc::new(OperationBus::new(
        Arc::new(ServiceRegistry::new()),
        Arc::clone(bus.logger()),
    )));
    if let Err(err) = bare.new_show_node_query(ShowNodeQueryParams { reference: 1 }) {
        println!("   unregistered service: {err}");
    }

    match node_manager.new_show_node_query(ShowNodeQueryParams { reference: -1 }) {
        Ok(mut query) => {
            if let Err(err) = query.execute(&bus.execution_context()) {
                println!("   service error: {err}");
            }
        }
        Err(err) => println!("   construction failed: {err}"),
    }

    if let Err(err) = node_manager.decode(b"\x00garbage", codec) {
        println!("   malformed bytes: {err}");
    }
}
