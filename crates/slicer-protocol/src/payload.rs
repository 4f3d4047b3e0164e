//! Reply payload decoding
//!
//! Each success reply verb carries its payload in one of a few shapes. The
//! [`Shape`] table in [`ReplyVerb::shape`](crate::ReplyVerb::shape) picks the
//! decoder; [`Shape::decode`] turns the decoded payload text into a
//! [`Payload`].

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};

/// Generic key-value record carried by `NODE` and `EDGE` replies
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One row of a `CANDIDATES` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Number of nodes carrying the label, as slicebot reports it
    pub count: i64,
    /// The matching label
    pub label: String,
}

/// Decoding strategy for a success payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Payload ignored, success only
    Ack,
    /// `<count>, <label>` rows
    Candidates,
    /// Opaque text returned as is
    Text,
    /// JSON object
    Record,
}

/// A decoded success payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Command succeeded
    Ack,
    /// Candidate rows in reply order
    Candidates(Vec<Candidate>),
    /// Unparsed text
    Text(String),
    /// Structured record
    Record(Record),
}

impl Shape {
    /// Decode payload text according to this shape
    pub fn decode(self, payload: String) -> Result<Payload> {
        match self {
            Self::Ack => Ok(Payload::Ack),
            Self::Candidates => parse_candidates(&payload).map(Payload::Candidates),
            Self::Text => Ok(Payload::Text(payload)),
            Self::Record => parse_record(&payload).map(Payload::Record),
        }
    }
}

/// Parse candidate rows
///
/// The payload is trimmed and split on newlines. Rows without the `", "`
/// delimiter are skipped; a row whose count is not an integer fails the
/// whole payload rather than being dropped.
pub fn parse_candidates(payload: &str) -> Result<Vec<Candidate>> {
    payload
        .trim()
        .split('\n')
        .filter_map(|row| row.split_once(", ").map(|parts| (row, parts)))
        .map(|(row, (count, label))| {
            let count = count
                .trim()
                .parse::<i64>()
                .map_err(|_| ProtocolError::InvalidCandidate(row.to_string()))?;
            Ok(Candidate {
                count,
                label: label.to_string(),
            })
        })
        .collect()
}

fn parse_record(payload: &str) -> Result<Record> {
    match serde_json::from_str::<serde_json::Value>(payload)? {
        serde_json::Value::Object(record) => Ok(record),
        other => Err(ProtocolError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_candidates_in_order() {
        let rows = parse_candidates("2, foo\n1, bar\n").unwrap();
        assert_eq!(
            rows,
            vec![
                Candidate {
                    count: 2,
                    label: "foo".to_string()
                },
                Candidate {
                    count: 1,
                    label: "bar".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_candidates_skips_rows_without_delimiter() {
        let rows = parse_candidates("header\n3, a, b\n\nnoise,x\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].label, "a, b");
    }

    #[test]
    fn test_parse_candidates_empty_payload() {
        assert!(parse_candidates("").unwrap().is_empty());
        assert!(parse_candidates("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_candidates_accepts_signed_counts() {
        let rows = parse_candidates("-1, unknown\n+4, foo\n").unwrap();
        assert_eq!(rows[0].count, -1);
        assert_eq!(rows[0].label, "unknown");
        assert_eq!(rows[1].count, 4);
    }

    #[test]
    fn test_parse_candidates_bad_count_fails() {
        let err = parse_candidates("2, foo\nmany, bar\n").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidCandidate("many, bar".to_string()));
    }

    #[test]
    fn test_record_shape() {
        let payload = Shape::Record
            .decode(r#"{"id":5,"attrs":{}}"#.to_string())
            .unwrap();
        let Payload::Record(record) = payload else {
            panic!("expected record");
        };
        assert_eq!(record.get("id"), Some(&json!(5)));
        assert_eq!(record.get("attrs"), Some(&json!({})));
    }

    #[test]
    fn test_record_shape_rejects_non_objects() {
        assert!(matches!(
            Shape::Record.decode("[1,2]".to_string()),
            Err(ProtocolError::InvalidRecord(_))
        ));
        assert!(matches!(
            Shape::Record.decode("{not json".to_string()),
            Err(ProtocolError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_text_and_ack_shapes() {
        assert_eq!(
            Shape::Text.decode("digraph {}".to_string()).unwrap(),
            Payload::Text("digraph {}".to_string())
        );
        assert_eq!(
            Shape::Ack.decode("anything".to_string()).unwrap(),
            Payload::Ack
        );
    }
}
