//! Commandment core: operation identifiers, lifecycle metadata, descriptors,
//! descriptor codecs and the structured logger contract.

pub mod clock;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod id;
pub mod logger;
pub mod metadata;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use codec::{DescriptorCodec, JsonCodec, MsgPackCodec};
pub use descriptor::OperationDescriptor;
pub use error::CodecError;
pub use id::OperationId;
pub use logger::{Field, LogRecord, Logger, NullLogger, RecordingLogger, TracingLogger};
pub use metadata::OperationMetadata;
