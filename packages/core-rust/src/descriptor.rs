//! Serializable snapshot of an operation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::metadata::OperationMetadata;

/// Transport-neutral record of an operation: type tag, parameters and metadata.
///
/// A snapshot, not a live reference: the injected service, logger and
/// dependencies are runtime-only and are re-resolved on reconstruction.
///
/// ```json
/// {
///   "type": "CreateListCommand",
///   "params": { "title": "Groceries", "description": "", "parentId": null },
///   "metadata": { "id": "9f0c...", "created": "2024-05-01T10:00:00Z" }
/// }
/// ```
///
/// `params` is held as an untyped JSON value; the type tag alone selects the
/// concrete parameter shape on the way back in. Object keys are kept in sorted
/// order, so encoding the same snapshot twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Operation type tag, e.g. `"ShowNodeQuery"`.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Operation-specific parameters.
    pub params: serde_json::Value,
    /// Identifier and lifecycle stamps at the time of the snapshot.
    pub metadata: OperationMetadata,
}

impl OperationDescriptor {
    /// Builds a descriptor from typed parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Params`] if `params` cannot be represented as JSON
    /// (e.g. a map with non-string keys).
    pub fn from_params<P: Serialize>(
        type_tag: impl Into<String>,
        params: &P,
        metadata: OperationMetadata,
    ) -> Result<Self, CodecError> {
        let type_tag = type_tag.into();
        let params = serde_json::to_value(params).map_err(|source| CodecError::Params {
            type_tag: type_tag.clone(),
            source,
        })?;
        Ok(Self {
            type_tag,
            params,
            metadata,
        })
    }

    /// Decodes the untyped parameter payload into `P`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Params`] if the payload does not match `P`.
    pub fn decode_params<P: DeserializeOwned>(&self) -> Result<P, CodecError> {
        P::deserialize(&self.params).map_err(|source| CodecError::Params {
            type_tag: self.type_tag.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        title: String,
        parent_id: Option<i64>,
    }

    fn meta() -> OperationMetadata {
        OperationMetadata::new("op-1".into(), Utc.timestamp_millis_opt(0).unwrap())
    }

    #[test]
    fn wire_shape_uses_contract_field_names() {
        let desc = OperationDescriptor::from_params(
            "CreateListCommand",
            &Params { title: "t".into(), parent_id: None },
            meta(),
        )
        .unwrap();
        let value = serde_json::to_value(&desc).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "CreateListCommand",
                "params": { "title": "t", "parentId": null },
                "metadata": { "id": "op-1", "created": "1970-01-01T00:00:00Z" }
            })
        );
    }

    #[test]
    fn params_decode_back_to_typed_shape() {
        let original = Params { title: "Test List".into(), parent_id: Some(7) };
        let desc = OperationDescriptor::from_params("X", &original, meta()).unwrap();
        let decoded: Params = desc.decode_params().unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn mismatched_payload_is_a_params_error() {
        let desc = OperationDescriptor {
            type_tag: "CreateListCommand".into(),
            params: json!({ "title": 12 }),
            metadata: meta(),
        };
        let err = desc.decode_params::<Params>().unwrap_err();
        assert!(matches!(err, CodecError::Params { ref type_tag, .. } if type_tag == "CreateListCommand"));
    }
}
