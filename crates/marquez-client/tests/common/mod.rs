// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared fixtures for marquez-client integration tests.

#![allow(dead_code)]

use std::io::Write;

use marquez_client::ClientConfig;
use wiremock::MockServer;

/// Client configuration pointing at a mock service (hostname without scheme).
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_hostname(server.address().ip().to_string())
        .with_port(server.address().port())
}

/// Run a blocking client call off the async test runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking client call panicked")
}

/// Write a config file and return its handle (deleted on drop).
pub fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes())
        .expect("write temp config");
    file
}
