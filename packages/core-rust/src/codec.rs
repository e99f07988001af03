//! Byte-level encodings for [`OperationDescriptor`].
//!
//! Two encodings ship with the crate:
//! - [`JsonCodec`]: the canonical JSON wire form.
//! - [`MsgPackCodec`]: named-field `MsgPack` (`rmp_serde::to_vec_named()`), same
//!   field names, smaller frames.
//!
//! Neither encoding carries the injected service or logger; those are not part
//! of the descriptor to begin with.

use crate::descriptor::OperationDescriptor;
use crate::error::CodecError;

/// Encodes and decodes descriptors to and from bytes.
pub trait DescriptorCodec: Send + Sync {
    /// Short name for logs and CLI selection (e.g. `"json"`).
    fn name(&self) -> &'static str;

    /// Serialize a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the underlying serializer fails.
    fn encode(&self, descriptor: &OperationDescriptor) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if `bytes` is not a well-formed descriptor.
    fn decode(&self, bytes: &[u8]) -> Result<OperationDescriptor, CodecError>;
}

/// JSON encoding of descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact single-line output.
    #[must_use]
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Indented, human-readable output.
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DescriptorCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, descriptor: &OperationDescriptor) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(descriptor)?
        } else {
            serde_json::to_vec(descriptor)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<OperationDescriptor, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// `MsgPack` encoding of descriptors with named fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl DescriptorCodec for MsgPackCodec {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn encode(&self, descriptor: &OperationDescriptor) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(descriptor)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<OperationDescriptor, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
