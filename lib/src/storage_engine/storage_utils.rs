// lib/src/storage_engine/storage_utils.rs

use models::errors::{CareError, CareResult};
use models::identifiers::new_document_id;
use serde_json::Value;

/// Ensures `data` is an object and writes `id` into its `id` field.
pub fn stamp_id(mut data: Value, id: &str) -> CareResult<Value> {
    match data.as_object_mut() {
        Some(map) => {
            map.insert("id".to_string(), Value::String(id.to_string()));
            Ok(data)
        }
        None => Err(CareError::Storage(format!(
            "document {} must be a JSON object, got {}",
            id, data
        ))),
    }
}

/// Returns a new document id together with the stamped body.
pub fn prepare_new_document(data: Value) -> CareResult<(String, Value)> {
    let id = new_document_id();
    let data = stamp_id(data, &id)?;
    Ok((id, data))
}

/// Helper to serialize a document body to bytes.
pub fn serialize_document(data: &Value) -> CareResult<Vec<u8>> {
    serde_json::to_vec(data).map_err(CareError::from)
}

/// Helper to deserialize bytes to a document body.
pub fn deserialize_document(bytes: &[u8]) -> CareResult<Value> {
    serde_json::from_slice(bytes).map_err(CareError::from)
}
