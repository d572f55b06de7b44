// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire encodings of a drained batch.
//!
//! Both strategies emit one stream per batch group. A stream's label string
//! is the client's base labels merged with the group's extra labels, and its
//! entries keep arrival order. Streams are sorted by label string so the same
//! batch always yields the same body.

pub mod json;
pub mod proto;

use crate::batch::{Batch, LogEntry};
use crate::config::Format;
use crate::error::EncodeError;
use crate::labels::LabelSet;

pub use json::JsonEncoder;
pub use proto::ProtoEncoder;

/// A request body ready for the push endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub trait Encoder: Send + Sync {
    /// Serializes every group of `batch` under `base` labels.
    fn encode(&self, base: &LabelSet, batch: Batch) -> Result<Payload, EncodeError>;
}

/// Builds the encoder for a configured wire format.
#[must_use]
pub fn for_format(format: Format) -> Box<dyn Encoder> {
    match format {
        Format::Json => Box::new(JsonEncoder),
        Format::Protobuf => Box::new(ProtoEncoder),
    }
}

/// Resolves each group to its rendered label string, sorted by that string.
pub(crate) fn streams(base: &LabelSet, batch: Batch) -> Vec<(String, Vec<LogEntry>)> {
    let mut streams: Vec<(String, Vec<LogEntry>)> = batch
        .into_values()
        .map(|group| (base.merge(&group.labels).render(), group.entries))
        .collect();
    streams.sort_by(|a, b| a.0.cmp(&b.0));
    streams
}
