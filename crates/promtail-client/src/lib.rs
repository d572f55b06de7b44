// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batching log shipper for Loki-style push endpoints.
//!
//! Application code hands lines to a [`Client`]; a single background task
//! groups them by label set and pushes them when a batch fills up or its wait
//! time runs out, encoded as JSON or as snappy-compressed protobuf.
//!
//! ```rust,ignore
//! use promtail_client::{Client, ClientConfig, LabelSet, Level};
//! use std::time::Duration;
//!
//! let config = ClientConfig::new(
//!     "http://localhost:3100/loki/api/v1/push",
//!     LabelSet::new().with("job", "somejob"),
//!     Duration::from_secs(5),
//!     10_000,
//! );
//! let client = Client::with_reqwest(config, Duration::from_secs(1))?;
//! client.log("hello", Level::Info, &LabelSet::new()).await?;
//! client.shutdown().await;
//! ```
//!
//! Delivery is best effort: a batch that fails to encode or send is logged
//! and dropped.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batch;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod labels;
pub mod level;
pub mod logproto;
pub mod transport;
pub mod worker;

mod test_support;

pub use batch::{BatchGroup, BatchStore, LogEntry};
pub use client::Client;
pub use config::{ClientConfig, Format};
pub use error::{ClientError, EncodeError, FlushError, TransportError};
pub use labels::LabelSet;
pub use level::Level;
pub use transport::{ReqwestTransport, Transport, TransportResponse};
