use crate::errors::DbError;

/// Convert a `serde_json::Value` that must be an object into a `bson::Document`.
///
/// # Errors
/// Returns `MalformedFilter` for non-object input and a BSON error if conversion fails.
pub fn json_value_to_document(val: &serde_json::Value) -> Result<bson::Document, DbError> {
    if !val.is_object() {
        return Err(DbError::MalformedFilter(format!("expected JSON object, got {val}")));
    }
    Ok(bson::serialize_to_document(val)?)
}

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
///
/// # Errors
/// Returns an error on invalid JSON or a non-object top level.
pub fn parse_json_to_document(json: &str) -> Result<bson::Document, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    json_value_to_document(&val)
}

/// Render a document as plain (relaxed) JSON.
#[must_use]
pub fn document_to_json(doc: &bson::Document) -> serde_json::Value {
    bson::Bson::Document(doc.clone()).into_relaxed_extjson()
}
