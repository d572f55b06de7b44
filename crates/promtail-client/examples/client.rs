// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ships a handful of lines to a local Loki.
//!
//! ```text
//! cargo run --example client -- proto|json <source-name> <job-name>
//! ```

use chrono::Utc;
use promtail_client::{Client, ClientConfig, Format, LabelSet, Level};
use std::{env, process};
use tokio::time::{sleep, Duration};
use tracing::error;
use tracing_subscriber::EnvFilter;

const PUSH_URL: &str = "http://localhost:3100/loki/api/v1/push";

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} proto|json source-name job-name");
    process::exit(1);
}

fn name_is_valid(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("client", String::as_str);
    if args.len() < 4 {
        usage(program);
    }

    let format = match args[1].as_str() {
        "proto" => Format::Protobuf,
        "json" => Format::Json,
        _ => usage(program),
    };
    for (what, name) in [("source-name", &args[2]), ("job-name", &args[3])] {
        if !name_is_valid(name) {
            eprintln!("Invalid {what}: allowed characters are a-zA-Z0-9_-");
            process::exit(1);
        }
    }
    let source_name = &args[2];

    let labels = LabelSet::new()
        .with("source", source_name.as_str())
        .with("job", args[3].as_str());
    let config = ClientConfig::new(PUSH_URL, labels, Duration::from_secs(5), 10_000)
        .with_format(format)
        .with_print_level(Level::Warning);

    let client = match Client::with_reqwest(config, Duration::from_secs(1)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create client: {e}");
            process::exit(1);
        }
    };

    let mut extra = LabelSet::new();
    for i in 1..5 {
        extra.set("seq", i.to_string());
        let line = format!("source = {source_name} time = {}, i = {i}", Utc::now().to_rfc3339());
        for level in [Level::Debug, Level::Info, Level::Warning, Level::Error] {
            if let Err(e) = client.log(line.clone(), level, &extra).await {
                error!("Failed to log: {e}");
            }
        }
        sleep(Duration::from_secs(1)).await;
    }

    client.shutdown().await;
    println!("sent {} entries", client.sent());
}

