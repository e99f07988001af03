//! Operation factory.
//!
//! [`OperationBus`] is the single construction point for operations: it
//! resolves each operation's service contract from the shared
//! [`ServiceRegistry`], stamps fresh metadata, and injects the logger, clock
//! and dependencies. The reverse path ([`restore`](OperationBus::restore),
//! [`rehydrate`](OperationBus::rehydrate), [`decode`](OperationBus::decode))
//! rebuilds live operations from descriptors.

use std::sync::Arc;

use commandment_core::{
    ClockSource, CodecError, DescriptorCodec, Logger, OperationDescriptor, OperationMetadata,
    SystemClock, TracingLogger,
};
use serde::Deserialize;

use crate::service::catalog::OperationSet;
use crate::service::config::BusConfig;
use crate::service::context::ExecutionContext;
use crate::service::dependencies::Dependencies;
use crate::service::operation::{BusError, Operation, OperationParts};
use crate::service::registry::{Contract, ServiceRegistry};

/// Factory for fully wired operations.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct OperationBus {
    registry: Arc<ServiceRegistry>,
    logger: Arc<dyn Logger>,
    clock: Arc<dyn ClockSource>,
    config: Arc<BusConfig>,
    default_dependencies: Option<Dependencies>,
}

impl OperationBus {
    /// Creates a bus with the default configuration and the system clock.
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(registry, logger, BusConfig::default())
    }

    /// Creates a bus that logs through a [`TracingLogger`] labelled with
    /// `config.component`.
    #[must_use]
    pub fn from_config(registry: Arc<ServiceRegistry>, config: BusConfig) -> Self {
        let logger = Arc::new(TracingLogger::new(config.component.clone()));
        Self::with_config(registry, logger, config)
    }

    /// Creates a bus with an explicit logger and configuration.
    ///
    /// `logger` is used as given; `config.component` only labels loggers the
    /// bus builds itself (see [`from_config`](Self::from_config)).
    #[must_use]
    pub fn with_config(
        registry: Arc<ServiceRegistry>,
        logger: Arc<dyn Logger>,
        config: BusConfig,
    ) -> Self {
        Self {
            registry,
            logger,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
            default_dependencies: None,
        }
    }

    /// Dependencies attached to every operation the bus builds, unless a
    /// call supplies its own.
    #[must_use]
    pub fn with_default_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.default_dependencies = Some(dependencies);
        self
    }

    /// Replace the clock used for `created`, `executed` and `returned`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Registry the bus resolves service contracts from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Logger injected into every operation the bus builds.
    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Configuration the bus was created with.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Dependencies attached when a call supplies none.
    #[must_use]
    pub fn default_dependencies(&self) -> Option<&Dependencies> {
        self.default_dependencies.as_ref()
    }

    /// A fresh context carrying the configured default deadline.
    #[must_use]
    pub fn execution_context(&self) -> ExecutionContext {
        let ctx = ExecutionContext::background();
        match self.config.default_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    // -- forward path -------------------------------------------------------

    /// Build a new `O` with fresh metadata and the bus default dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ServiceNotRegistered`] if `O`'s contract has no
    /// registered implementation.
    pub fn create<O: Operation>(&self, params: O::Params) -> Result<O, BusError> {
        self.build(
            params,
            OperationMetadata::fresh(self.clock.as_ref()),
            self.default_dependencies.clone(),
            "Operation created",
        )
    }

    /// Build a new `O` carrying `dependencies` instead of the bus defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ServiceNotRegistered`] if `O`'s contract has no
    /// registered implementation.
    pub fn create_with_dependencies<O: Operation>(
        &self,
        params: O::Params,
        dependencies: Dependencies,
    ) -> Result<O, BusError> {
        self.build(
            params,
            OperationMetadata::fresh(self.clock.as_ref()),
            Some(dependencies),
            "Operation created",
        )
    }

    /// Build a new `O` from untyped JSON params.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Decode`] if `params` does not match `O::Params`, or
    /// [`BusError::ServiceNotRegistered`] as for [`create`](Self::create).
    pub fn create_from_value<O: Operation>(
        &self,
        params: serde_json::Value,
    ) -> Result<O, BusError> {
        let params = O::Params::deserialize(params).map_err(|source| BusError::Decode {
            type_tag: O::TYPE_TAG.to_string(),
            source: CodecError::Params {
                type_tag: O::TYPE_TAG.to_string(),
                source,
            },
        })?;
        self.create(params)
    }

    // -- reverse path -------------------------------------------------------

    /// Rebuild an `O` from its descriptor.
    ///
    /// Keeps the descriptor's id and `created`; execution stamps are dropped so
    /// the rebuilt operation runs as a new execution. The service is resolved
    /// from the registry as on the forward path, and the bus default
    /// dependencies are attached.
    ///
    /// # Errors
    ///
    /// - [`BusError::TypeMismatch`] if the descriptor's tag is not `O::TYPE_TAG`.
    /// - [`BusError::Decode`] if the params do not match `O::Params`.
    /// - [`BusError::ServiceNotRegistered`] if the contract is missing.
    pub fn restore<O: Operation>(&self, descriptor: &OperationDescriptor) -> Result<O, BusError> {
        if descriptor.type_tag != O::TYPE_TAG {
            return Err(BusError::TypeMismatch {
                expected: O::TYPE_TAG,
                found: descriptor.type_tag.clone(),
            });
        }
        let params = descriptor
            .decode_params::<O::Params>()
            .map_err(|source| BusError::Decode {
                type_tag: descriptor.type_tag.clone(),
                source,
            })?;
        self.build(
            params,
            descriptor.metadata.for_replay(),
            self.default_dependencies.clone(),
            "Operation restored",
        )
    }

    /// Rebuild whichever member of `S` the descriptor names.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownOperationType`] if no member of `S` carries the
    /// descriptor's tag, otherwise as for [`restore`](Self::restore).
    pub fn rehydrate<S: OperationSet>(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<S, BusError> {
        S::rehydrate(self, descriptor)
    }

    /// Encode `operation`'s descriptor with `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Codec`] if the descriptor cannot be built or encoded.
    pub fn encode<O: Operation>(
        &self,
        operation: &O,
        codec: &dyn DescriptorCodec,
    ) -> Result<Vec<u8>, BusError> {
        Ok(codec.encode(&operation.descriptor()?)?)
    }

    /// Decode bytes produced by [`encode`](Self::encode) into a live member of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Codec`] for malformed bytes, otherwise as for
    /// [`rehydrate`](Self::rehydrate).
    pub fn decode<S: OperationSet>(
        &self,
        bytes: &[u8],
        codec: &dyn DescriptorCodec,
    ) -> Result<S, BusError> {
        let descriptor = codec.decode(bytes)?;
        self.rehydrate(&descriptor)
    }

    /// Check that `S` has unique type tags and that every contract its members
    /// need is registered.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateTypeTag`] or [`BusError::MissingContracts`].
    pub fn validate<S: OperationSet>(&self) -> Result<(), BusError> {
        let catalog = S::catalog()?;
        match catalog.validate(&self.registry) {
            Ok(()) => {
                let operations = catalog.len();
                self.logger.info(
                    "Operation set validated",
                    &[("operations", &operations)],
                );
                Ok(())
            }
            Err(err) => {
                self.logger.error("Operation set validation failed", &[("error", &err)]);
                Err(err)
            }
        }
    }

    fn build<O: Operation>(
        &self,
        params: O::Params,
        metadata: OperationMetadata,
        dependencies: Option<Dependencies>,
        event: &str,
    ) -> Result<O, BusError> {
        let operation_type = O::TYPE_TAG;
        let contract = <O::Service as Contract>::NAME;

        let service = match self.registry.get::<O::Service>() {
            Ok(service) => service,
            Err(err) => {
                self.logger.error(
                    "Operation creation failed",
                    &[
                        ("operation_type", &operation_type),
                        ("service_type", &contract),
                        ("error", &err),
                    ],
                );
                return Err(BusError::ServiceNotRegistered {
                    contract,
                    operation_type,
                });
            }
        };

        let operation_id = metadata.id();
        match dependencies.as_ref().map(Dependencies::type_name) {
            Some(dependencies_type) => self.logger.info(
                event,
                &[
                    ("operation_type", &operation_type),
                    ("operation_id", operation_id),
                    ("service_type", &contract),
                    ("dependencies_type", &dependencies_type),
                ],
            ),
            None => self.logger.info(
                event,
                &[
                    ("operation_type", &operation_type),
                    ("operation_id", operation_id),
                    ("service_type", &contract),
                ],
            ),
        }
        metrics::counter!(
            "commandment_operations_created_total",
            "operation_type" => operation_type,
        )
        .increment(1);

        Ok(O::from_parts(OperationParts {
            params,
            service,
            metadata,
            logger: Arc::clone(&self.logger),
            clock: Arc::clone(&self.clock),
            dependencies,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use commandment_core::{JsonCodec, ManualClock, NullLogger, RecordingLogger};
    use serde::Serialize;
    use serde_json::json;

    use super::*;
    use crate::service::operation::OperationKind;

    // -- a minimal operation -------------------------------------------------

    trait EchoService: Send + Sync {
        fn echo(&self, ctx: &ExecutionContext, text: &str) -> anyhow::Result<String>;
    }

    impl Contract for dyn EchoService {
        const NAME: &'static str = "EchoService";
    }

    struct Upper;

    impl EchoService for Upper {
        fn echo(&self, ctx: &ExecutionContext, text: &str) -> anyhow::Result<String> {
            let suffix = ctx
                .dependencies()
                .and_then(|deps| deps.downcast_ref::<String>())
                .cloned()
                .unwrap_or_default();
            anyhow::ensure!(!text.is_empty(), "nothing to echo");
            Ok(format!("{}{suffix}", text.to_uppercase()))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct EchoParams {
        text: String,
    }

    #[derive(Debug)]
    struct Echo {
        parts: OperationParts<EchoParams, dyn EchoService>,
    }

    impl Operation for Echo {
        const TYPE_TAG: &'static str = "Echo";
        const KIND: OperationKind = OperationKind::Query;
        type Params = EchoParams;
        type Service = dyn EchoService;
        type Output = String;

        fn from_parts(parts: OperationParts<EchoParams, dyn EchoService>) -> Self {
            Self { parts }
        }

        fn parts(&self) -> &OperationParts<EchoParams, dyn EchoService> {
            &self.parts
        }

        fn parts_mut(&mut self) -> &mut OperationParts<EchoParams, dyn EchoService> {
            &mut self.parts
        }

        fn invoke(
            service: &dyn EchoService,
            params: &EchoParams,
            ctx: &ExecutionContext,
        ) -> anyhow::Result<String> {
            service.echo(ctx, &params.text)
        }
    }

    crate::operation_set! {
        #[derive(Debug)]
        enum EchoSet {
            Echo(Echo),
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn echo_params(text: &str) -> EchoParams {
        EchoParams {
            text: text.to_string(),
        }
    }

    fn bus_with(logger: Arc<RecordingLogger>) -> OperationBus {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register::<dyn EchoService>(Arc::new(Upper));
        OperationBus::new(registry, logger)
            .with_clock(Arc::new(ManualClock::with_step(at(0), Duration::milliseconds(1))))
    }

    // -- forward path --------------------------------------------------------

    #[test]
    fn create_binds_registered_service_and_logs() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = bus_with(Arc::clone(&logger));

        let op: Echo = bus.create(echo_params("hi")).unwrap();
        assert_eq!(op.params(), &echo_params("hi"));
        assert_eq!(op.metadata().created(), at(0));
        assert!(op.metadata().executed().is_none());
        assert!(op.dependencies().is_none());
        assert!(Arc::ptr_eq(
            op.service(),
            &bus.registry().get::<dyn EchoService>().unwrap()
        ));

        let created = logger.with_message("Operation created");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].field("operation_type"), Some("Echo"));
        assert_eq!(created[0].field("service_type"), Some("EchoService"));
        assert_eq!(
            created[0].field("operation_id"),
            Some(op.metadata().id().as_str())
        );
        assert_eq!(created[0].field("dependencies_type"), None);
    }

    #[test]
    fn create_without_registered_contract_fails() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = OperationBus::new(Arc::new(ServiceRegistry::new()), Arc::clone(&logger) as _);

        let err = bus.create::<Echo>(echo_params("hi")).unwrap_err();
        assert!(matches!(
            err,
            BusError::ServiceNotRegistered {
                contract: "EchoService",
                operation_type: "Echo",
            }
        ));
        assert_eq!(logger.with_message("Operation creation failed").len(), 1);
        assert!(logger.with_message("Operation created").is_empty());
    }

    #[test]
    fn execute_runs_service_and_stamps_metadata() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = bus_with(Arc::clone(&logger));

        let mut op: Echo = bus.create(echo_params("hi")).unwrap();
        let out = op.execute(&ExecutionContext::background()).unwrap();
        assert_eq!(out, "HI");

        let meta = op.metadata();
        assert!(meta.created() <= meta.executed().unwrap());
        assert!(meta.executed().unwrap() <= meta.returned().unwrap());
        assert_eq!(logger.with_message("Operation execution completed").len(), 1);
    }

    #[test]
    fn service_errors_pass_through_execute() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let mut op: Echo = bus.create(echo_params("")).unwrap();
        let err = op.execute(&ExecutionContext::background()).unwrap_err();
        assert_eq!(err.to_string(), "nothing to echo");
        assert!(op.metadata().returned().is_some());
    }

    #[test]
    fn default_dependencies_reach_the_service() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = bus_with(Arc::clone(&logger))
            .with_default_dependencies(Dependencies::new(String::from("!")));

        let mut op: Echo = bus.create(echo_params("hi")).unwrap();
        assert!(op
            .dependencies()
            .unwrap()
            .ptr_eq(bus.default_dependencies().unwrap()));
        assert_eq!(op.execute(&ExecutionContext::background()).unwrap(), "HI!");
        assert_eq!(
            logger.with_message("Operation created")[0].field("dependencies_type"),
            Some("alloc::string::String")
        );
    }

    #[test]
    fn explicit_dependencies_override_defaults() {
        let bus = bus_with(Arc::new(RecordingLogger::new()))
            .with_default_dependencies(Dependencies::new(String::from("!")));

        let mut op: Echo = bus
            .create_with_dependencies(echo_params("hi"), Dependencies::new(String::from("?")))
            .unwrap();
        assert_eq!(op.execute(&ExecutionContext::background()).unwrap(), "HI?");
    }

    #[test]
    fn operation_dependencies_replace_context_dependencies() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let ctx = ExecutionContext::background().with_dependencies(Dependencies::new(String::from("ctx")));

        let mut bare: Echo = bus.create(echo_params("a")).unwrap();
        assert_eq!(bare.execute(&ctx).unwrap(), "Actx");

        let mut carried: Echo = bus
            .create_with_dependencies(echo_params("a"), Dependencies::new(String::from("op")))
            .unwrap();
        assert_eq!(carried.execute(&ctx).unwrap(), "Aop");
    }

    #[test]
    fn create_from_value_decodes_params() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let op: Echo = bus.create_from_value(json!({ "text": "x" })).unwrap();
        assert_eq!(op.params(), &echo_params("x"));

        let err = bus.create_from_value::<Echo>(json!({ "txt": 1 })).unwrap_err();
        assert!(matches!(err, BusError::Decode { ref type_tag, .. } if type_tag == "Echo"));
    }

    // -- reverse path --------------------------------------------------------

    #[test]
    fn restore_keeps_identity_and_drops_execution_stamps() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = bus_with(Arc::clone(&logger));

        let mut op: Echo = bus.create(echo_params("hi")).unwrap();
        op.execute(&ExecutionContext::background()).unwrap();
        let descriptor = op.descriptor().unwrap();
        assert!(descriptor.metadata.executed().is_some());

        let restored: Echo = bus.restore(&descriptor).unwrap();
        assert_eq!(restored.params(), op.params());
        assert_eq!(restored.metadata().id(), op.metadata().id());
        assert_eq!(restored.metadata().created(), op.metadata().created());
        assert!(restored.metadata().executed().is_none());
        assert_eq!(logger.with_message("Operation restored").len(), 1);
    }

    #[test]
    fn restore_rejects_foreign_tag() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let mut descriptor = bus.create::<Echo>(echo_params("hi")).unwrap().descriptor().unwrap();
        descriptor.type_tag = "Other".into();

        let err = bus.restore::<Echo>(&descriptor).unwrap_err();
        assert!(matches!(err, BusError::TypeMismatch { expected: "Echo", ref found } if found == "Other"));
    }

    #[test]
    fn restore_rejects_malformed_params() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let mut descriptor = bus.create::<Echo>(echo_params("hi")).unwrap().descriptor().unwrap();
        descriptor.params = json!({ "text": 5 });

        assert!(matches!(
            bus.restore::<Echo>(&descriptor),
            Err(BusError::Decode { .. })
        ));
    }

    #[test]
    fn rehydrate_unknown_tag_fails() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let mut descriptor = bus.create::<Echo>(echo_params("hi")).unwrap().descriptor().unwrap();
        descriptor.type_tag = "Nope".into();

        let err = bus.rehydrate::<EchoSet>(&descriptor).unwrap_err();
        assert!(matches!(err, BusError::UnknownOperationType { ref type_tag } if type_tag == "Nope"));
    }

    #[test]
    fn encode_decode_through_codec() {
        let bus = bus_with(Arc::new(RecordingLogger::new()));
        let codec = JsonCodec::compact();
        let op: Echo = bus.create(echo_params("wire")).unwrap();

        let bytes = bus.encode(&op, &codec).unwrap();
        let EchoSet::Echo(mut decoded) = bus.decode::<EchoSet>(&bytes, &codec).unwrap();
        assert_eq!(decoded.params(), op.params());
        assert_eq!(decoded.metadata().id(), op.metadata().id());
        assert_eq!(decoded.execute(&ExecutionContext::background()).unwrap(), "WIRE");

        assert!(matches!(
            bus.decode::<EchoSet>(b"not json", &codec),
            Err(BusError::Codec(_))
        ));
    }

    #[test]
    fn restore_attaches_bus_default_not_original_override() {
        let logger = Arc::new(RecordingLogger::new());
        let bus = bus_with(Arc::clone(&logger))
            .with_default_dependencies(Dependencies::new(String::from("!")));

        let original: Echo = bus
            .create_with_dependencies(echo_params("hi"), Dependencies::new(7_u32))
            .unwrap();
        assert_eq!(
            original.dependencies().and_then(Dependencies::downcast_ref::<u32>),
            Some(&7)
        );

        let restored: Echo = bus.restore(&original.descriptor().unwrap()).unwrap();
        let attached = restored.dependencies().unwrap();
        assert!(attached.ptr_eq(bus.default_dependencies().unwrap()));
        assert!(attached.downcast_ref::<u32>().is_none());

        let events = logger.with_message("Operation restored");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].field("dependencies_type"),
            Some("alloc::string::String")
        );
    }

    // -- logger wiring -------------------------------------------------------

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn from_config_labels_events_with_component() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register::<dyn EchoService>(Arc::new(Upper));
        let bus = OperationBus::from_config(
            registry,
            BusConfig {
                component: "billing".to_string(),
                ..BusConfig::default()
            },
        );
        assert_eq!(bus.config().component, "billing");

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _op: Echo = bus.create(echo_params("hi")).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        let created: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .filter(|line| line["fields"]["message"] == "Operation created")
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["fields"]["component"], "billing");
        assert_eq!(created[0]["fields"]["operation_type"], "Echo");
        assert_eq!(created[0]["fields"]["service_type"], "EchoService");
    }

    // -- context & validation ------------------------------------------------

    #[test]
    fn execution_context_uses_configured_timeout() {
        let registry = Arc::new(ServiceRegistry::new());
        let bus = OperationBus::new(Arc::clone(&registry), Arc::new(NullLogger));
        let remaining = bus.execution_context().remaining().unwrap();
        assert!(remaining > StdDuration::from_secs(25));

        let unbounded = OperationBus::with_config(
            registry,
            Arc::new(NullLogger),
            BusConfig {
                default_operation_timeout_ms: 0,
                ..BusConfig::default()
            },
        );
        assert!(unbounded.execution_context().deadline().is_none());
    }

    #[test]
    fn validate_reports_missing_contracts() {
        let logger = Arc::new(RecordingLogger::new());
        let empty = OperationBus::new(Arc::new(ServiceRegistry::new()), Arc::clone(&logger) as _);
        let err = empty.validate::<EchoSet>().unwrap_err();
        assert!(matches!(err, BusError::MissingContracts { ref contracts } if contracts == &vec!["EchoService"]));
        assert_eq!(logger.with_message("Operation set validation failed").len(), 1);

        let bus = bus_with(Arc::new(RecordingLogger::new()));
        assert!(bus.validate::<EchoSet>().is_ok());
    }
}
