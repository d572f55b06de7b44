// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{streams, Encoder, Payload};
use crate::batch::Batch;
use crate::error::EncodeError;
use crate::labels::LabelSet;
use crate::logproto::{Entry, PushRequest, Stream};
use prost::Message;
use prost_types::Timestamp;

pub const CONTENT_TYPE: &str = "application/x-protobuf";

/// Snappy-compressed `logproto.PushRequest`, the native Loki push format.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtoEncoder;

impl Encoder for ProtoEncoder {
    fn encode(&self, base: &LabelSet, batch: Batch) -> Result<Payload, EncodeError> {
        let request = PushRequest {
            streams: streams(base, batch)
                .into_iter()
                .map(|(labels, entries)| Stream {
                    labels,
                    entries: entries
                        .into_iter()
                        .map(|entry| Entry {
                            timestamp: Some(Timestamp {
                                seconds: entry.seconds(),
                                nanos: entry.nanos(),
                            }),
                            line: entry.line,
                        })
                        .collect(),
                })
                .collect(),
        };

        let body = snap::raw::Encoder::new().compress_vec(&request.encode_to_vec())?;
        Ok(Payload {
            content_type: CONTENT_TYPE,
            body,
        })
    }
}
