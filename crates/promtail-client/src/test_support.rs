// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-process transport and encoder shared by the worker and client tests.

#![cfg(test)]

use crate::batch::Batch;
use crate::encoder::{Encoder, JsonEncoder, Payload};
use crate::error::{EncodeError, TransportError};
use crate::labels::LabelSet;
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One request captured by [`RecordingTransport`].
#[derive(Clone, Debug)]
pub(crate) struct Post {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Post {
    /// Total number of entries in a JSON push body.
    pub fn json_entry_count(&self) -> usize {
        let document: Value = serde_json::from_slice(&self.body).expect("invalid JSON body");
        document["streams"]
            .as_array()
            .expect("streams is an array")
            .iter()
            .map(|stream| stream["entries"].as_array().map_or(0, Vec::len))
            .sum()
    }
}

/// Records every POST and answers with a fixed status, or fails every call.
#[derive(Clone, Debug)]
pub(crate) struct RecordingTransport {
    posts: Arc<Mutex<Vec<Post>>>,
    status: u16,
    fail: bool,
}

impl RecordingTransport {
    pub fn with_status(status: u16) -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
            status,
            fail: false,
        }
    }

    pub fn accepting() -> Self {
        Self::with_status(204)
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::accepting()
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        self.posts.lock().expect("lock poisoned").push(Post {
            url: url.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        if self.fail {
            return Err(TransportError::Other("connection refused".to_string()));
        }
        Ok(TransportResponse {
            status: self.status,
            body: if self.status == 204 {
                String::new()
            } else {
                "Internal Server Error".to_string()
            },
        })
    }
}

/// Fails the first `failures` encodes, then behaves like [`JsonEncoder`].
#[derive(Debug)]
pub(crate) struct FailingEncoder {
    remaining: AtomicUsize,
}

impl FailingEncoder {
    pub fn new(failures: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(failures),
        }
    }
}

impl Encoder for FailingEncoder {
    fn encode(&self, base: &LabelSet, batch: Batch) -> Result<Payload, EncodeError> {
        let failing = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            let error = serde_json::from_str::<Value>("{").expect_err("truncated JSON must fail");
            return Err(EncodeError::Json(error));
        }
        JsonEncoder.encode(base, batch)
    }
}
