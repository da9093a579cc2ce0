use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;

pub const INVALID_BODY_MESSAGE: &str = "Body must be { rows: [...] }";

/// The managed document. Only `rows` is recognized; its elements are opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub rows: Vec<Value>,
}

impl Document {
    /// Parses a write body. Anything that is not an object with an array `rows`
    /// is rejected with the same message, whatever the reason. Arrays are not
    /// read positionally, and a repeated `rows` key keeps its last value.
    pub fn from_request_body(body: &[u8]) -> Result<Self, AppError> {
        let reject = || AppError::BadRequest(INVALID_BODY_MESSAGE.to_string());

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected unparsable write body");
            reject()
        })?;

        match value {
            Value::Object(mut fields) => match fields.remove("rows") {
                Some(Value::Array(rows)) => Ok(Document { rows }),
                _ => {
                    tracing::debug!("Rejected write body without a rows array");
                    Err(reject())
                }
            },
            _ => {
                tracing::debug!("Rejected non-object write body");
                Err(reject())
            }
        }
    }

    /// Pretty-printed with two-space indentation, as stored in the repository.
    pub fn to_pretty_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))
    }

    pub fn to_base64(&self) -> Result<String, AppError> {
        Ok(STANDARD.encode(self.to_pretty_json()?))
    }
}

/// Decodes repository file content into text. The contents API wraps base64
/// at 60 columns, so whitespace is dropped first; invalid UTF-8 is replaced
/// rather than rejected.
pub fn decode_content(encoded: &str) -> Result<String, AppError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::Upstream(format!("File content is not valid base64: {}", e)))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_rows_array() {
        let doc = Document::from_request_body(br#"{"rows":[1,"two",{"three":3}]}"#).unwrap();

        assert_eq!(doc.rows, vec![json!(1), json!("two"), json!({"three": 3})]);
    }

    #[test]
    fn ignores_other_fields() {
        let doc = Document::from_request_body(br#"{"rows":[],"title":"x"}"#).unwrap();

        assert!(doc.rows.is_empty());
    }

    #[test]
    fn rejects_bodies_without_rows_array() {
        let bodies: [&[u8]; 10] = [
            b"",
            b"not json",
            b"{}",
            b"null",
            b"[1,2,3]",
            b"[[1,2,3]]",
            b"\"rows\"",
            br#"{"rows":null}"#,
            br#"{"rows":"not-an-array"}"#,
            br#"{"rows":{"0":1}}"#,
        ];

        for body in bodies {
            match Document::from_request_body(body) {
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, INVALID_BODY_MESSAGE),
                other => panic!("expected bad request for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn repeated_rows_key_keeps_last_value() {
        let doc = Document::from_request_body(br#"{"rows":[1],"rows":[2]}"#).unwrap();

        assert_eq!(doc.rows, vec![json!(2)]);
    }

    #[test]
    fn whole_number_floats_keep_decimal_point() {
        let doc = Document::from_request_body(br#"{"rows":[1.0,2]}"#).unwrap();

        assert_eq!(doc.to_pretty_json().unwrap(), "{\n  \"rows\": [\n    1.0,\n    2\n  ]\n}");
    }

    #[test]
    fn pretty_json_uses_two_space_indent() {
        let doc = Document {
            rows: vec![json!(1), json!({"b": 2, "a": 1})],
        };

        let text = doc.to_pretty_json().unwrap();

        assert_eq!(
            text,
            "{\n  \"rows\": [\n    1,\n    {\n      \"b\": 2,\n      \"a\": 1\n    }\n  ]\n}"
        );
    }

    #[test]
    fn empty_rows_serialize_inline() {
        let doc = Document { rows: vec![] };

        assert_eq!(doc.to_pretty_json().unwrap(), "{\n  \"rows\": []\n}");
    }

    #[test]
    fn decode_handles_wrapped_base64() {
        let encoded = STANDARD.encode(r#"{"rows":[1,2,3]}"#);
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("{}\n{}\n", head, tail);

        assert_eq!(decode_content(&wrapped).unwrap(), r#"{"rows":[1,2,3]}"#);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_content("***"),
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn base64_round_trips_through_decode() {
        let doc = Document {
            rows: vec![json!("ü"), json!(null)],
        };

        let text = decode_content(&doc.to_base64().unwrap()).unwrap();

        assert_eq!(text, doc.to_pretty_json().unwrap());
    }
}
