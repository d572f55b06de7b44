// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{streams, Encoder, Payload};
use crate::batch::{Batch, LogEntry};
use crate::error::EncodeError;
use crate::labels::LabelSet;
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};

pub const CONTENT_TYPE: &str = "application/json";

/// Plain JSON push body: `{"streams":[{"labels":..,"entries":[{"ts":..,"line":..}]}]}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

#[derive(Serialize)]
struct PushMessage<'a> {
    streams: Vec<JsonStream<'a>>,
}

#[derive(Serialize)]
struct JsonStream<'a> {
    labels: &'a str,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    #[serde(rename = "ts", serialize_with = "serialize_rfc3339_nanos")]
    entry: &'a LogEntry,
    line: &'a str,
}

fn serialize_rfc3339_nanos<S>(entry: &&LogEntry, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&entry.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

impl Encoder for JsonEncoder {
    fn encode(&self, base: &LabelSet, batch: Batch) -> Result<Payload, EncodeError> {
        let streams = streams(base, batch);
        let message = PushMessage {
            streams: streams
                .iter()
                .map(|(labels, entries)| JsonStream {
                    labels,
                    entries: entries
                        .iter()
                        .map(|entry| JsonEntry {
                            entry,
                            line: &entry.line,
                        })
                        .collect(),
                })
                .collect(),
        };

        Ok(Payload {
            content_type: CONTENT_TYPE,
            body: serde_json::to_vec(&message)?,
        })
    }
}
