//! Error types for descriptor encoding and decoding.

/// Errors raised while encoding or decoding an [`OperationDescriptor`](crate::OperationDescriptor)
/// or the parameter payload it carries.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    #[error("params for operation type {type_tag} do not match its declared shape: {source}")]
    Params {
        type_tag: String,
        #[source]
        source: serde_json::Error,
    },
}
