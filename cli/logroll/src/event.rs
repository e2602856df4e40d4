//! Event payloads accepted by `logroll event`.

use anyhow::{Context, Result};
use lr_traits::RawMessage;
use lr_types::S3Uri;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One invocation event.
///
/// Queue deliveries arrive in the Lambda SQS shape; anything else must be a
/// produce request naming the role and the roots.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Event {
    /// Queue records to archive
    Records {
        #[serde(rename = "Records")]
        records: Vec<QueueRecord>,
    },

    /// Produce tasks for `prefixes` as `s3_role`
    Produce {
        s3_role: String,
        prefixes: Vec<S3Uri>,
    },
}

/// One delivered queue message.
#[derive(Debug, Deserialize)]
pub struct QueueRecord {
    pub body: String,

    #[serde(rename = "receiptHandle")]
    pub receipt_handle: String,
}

impl From<QueueRecord> for RawMessage {
    fn from(record: QueueRecord) -> Self {
        RawMessage {
            body: record.body,
            receipt_handle: record.receipt_handle,
        }
    }
}

impl Event {
    /// Parse an event from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .context("Event is neither a queue record batch nor a produce request")
    }

    /// Read an event from `path`, or from stdin when no path is given.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let text = match path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read event file {}", path.display()))?,
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read event from stdin")?;
                text
            }
        };
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_event() {
        let event = Event::parse(
            r#"{"Records": [
                {"messageId": "1", "receiptHandle": "rh-1", "body": "{}", "eventSource": "aws:sqs"},
                {"messageId": "2", "receiptHandle": "rh-2", "body": "[]"}
            ]}"#,
        )
        .unwrap();

        match event {
            Event::Records { records } => {
                assert_eq!(records.len(), 2);
                let message: RawMessage = records.into_iter().next().unwrap().into();
                assert_eq!(message.receipt_handle, "rh-1");
                assert_eq!(message.body, "{}");
            }
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_produce_event() {
        let event = Event::parse(
            r#"{"s3_role": "arn:aws:iam::123456789012:role/logs",
                "prefixes": ["s3://bucket1/", "s3://bucket2/log/"]}"#,
        )
        .unwrap();

        match event {
            Event::Produce { s3_role, prefixes } => {
                assert_eq!(s3_role, "arn:aws:iam::123456789012:role/logs");
                assert_eq!(prefixes[0].bucket(), "bucket1");
                assert_eq!(prefixes[1].key(), "log/");
            }
            other => panic!("expected produce, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_event() {
        assert!(Event::parse(r#"{"detail-type": "Scheduled Event"}"#).is_err());
        assert!(Event::parse(r#"{"s3_role": "r", "prefixes": ["bucket1/"]}"#).is_err());
    }

    #[test]
    fn test_read_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, r#"{"s3_role": "r", "prefixes": []}"#).unwrap();

        assert!(matches!(Event::read(Some(&path)).unwrap(), Event::Produce { .. }));
    }
}
